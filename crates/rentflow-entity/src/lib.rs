//! # rentflow-entity
//!
//! Domain entity models for RentFlow. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.
//!
//! Monetary amounts are [`rust_decimal::Decimal`] in whole currency units
//! (mapped to `NUMERIC`). Durations are whole minutes.

pub mod asset;
pub mod category;
pub mod pricing;
pub mod promotion;
pub mod rental;
pub mod tenant;

pub(crate) mod nullable {
    //! Serde adapter distinguishing an absent field from an explicit `null`.

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}
