//! Asset entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rentflow_core::types::{AssetId, CategoryId, CustomFields, TenantId};

/// A rentable unit (pool table, console, equipment bay).
///
/// At most one rental session may be active on an asset at any instant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Asset {
    /// Unique asset identifier.
    pub id: AssetId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Category used for category-scoped pricing.
    pub category_id: Option<CategoryId>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Display order (ascending).
    pub sort_order: i32,
    /// Inactive assets cannot be rented.
    pub is_active: bool,
    /// Tenant-defined attributes.
    #[sqlx(json)]
    pub custom_fields: CustomFields,
    /// When the asset was created.
    pub created_at: DateTime<Utc>,
    /// When the asset was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Build a new row from a create request.
    pub fn from_create(tenant_id: TenantId, data: CreateAsset, now: DateTime<Utc>) -> Self {
        Self {
            id: AssetId::new(),
            tenant_id,
            category_id: data.category_id,
            name: data.name,
            description: data.description,
            sort_order: data.sort_order.unwrap_or(0),
            is_active: data.is_active.unwrap_or(true),
            custom_fields: data.custom_fields.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Custom fields are merged, `null` deletes a key.
    pub fn apply(&mut self, update: UpdateAsset, now: DateTime<Utc>) {
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        if let Some(fields) = update.custom_fields {
            self.custom_fields.merge(fields);
        }
        self.updated_at = now;
    }
}

/// Data required to create an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAsset {
    /// Category reference.
    pub category_id: Option<CategoryId>,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Display order.
    pub sort_order: Option<i32>,
    /// Active flag (default `true`).
    pub is_active: Option<bool>,
    /// Initial custom fields.
    pub custom_fields: Option<CustomFields>,
}

/// Partial asset update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAsset {
    /// New category; `null` detaches the asset from its category.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<CategoryId>>,
    /// New name.
    pub name: Option<String>,
    /// New description; `null` clears it.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// New display order.
    pub sort_order: Option<i32>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// Custom fields to merge.
    pub custom_fields: Option<CustomFields>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_merges_custom_fields_and_detaches_category() {
        let now = Utc::now();
        let mut asset = Asset::from_create(
            TenantId::new(),
            CreateAsset {
                category_id: Some(CategoryId::new()),
                name: "Table 1".into(),
                description: None,
                sort_order: None,
                is_active: None,
                custom_fields: Some(
                    serde_json::from_value(json!({"size": "9ft", "zone": "A"})).expect("fields"),
                ),
            },
            now,
        );
        assert!(asset.is_active);

        let update: UpdateAsset = serde_json::from_value(json!({
            "category_id": null,
            "custom_fields": {"zone": null, "lamp": true}
        }))
        .expect("parse");
        asset.apply(update, now);

        assert!(asset.category_id.is_none());
        assert_eq!(asset.custom_fields.get("size"), Some(&json!("9ft")));
        assert_eq!(asset.custom_fields.get("lamp"), Some(&json!(true)));
        assert!(asset.custom_fields.get("zone").is_none());
    }
}
