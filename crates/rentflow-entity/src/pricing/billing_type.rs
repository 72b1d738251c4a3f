//! Billing type enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a session's cost is derived from its price snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "billing_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillingType {
    /// Price per elapsed minute.
    PerMinute,
    /// Price per elapsed hour, prorated by the minute.
    PerHour,
    /// Flat price regardless of duration.
    Fixed,
    /// Price per game played.
    PerGame,
}

impl BillingType {
    /// Whether the cost depends on elapsed time.
    pub fn is_time_based(&self) -> bool {
        matches!(self, Self::PerMinute | Self::PerHour)
    }

    /// Return the billing type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerMinute => "per_minute",
            Self::PerHour => "per_hour",
            Self::Fixed => "fixed",
            Self::PerGame => "per_game",
        }
    }
}

impl fmt::Display for BillingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_minute" => Ok(Self::PerMinute),
            "per_hour" => Ok(Self::PerHour),
            "fixed" => Ok(Self::Fixed),
            "per_game" => Ok(Self::PerGame),
            other => Err(format!("unknown billing type '{other}'")),
        }
    }
}
