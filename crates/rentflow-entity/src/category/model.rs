//! Category entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rentflow_core::types::{CategoryId, CustomFields, TenantId};

/// A grouping of assets that share pricing (e.g. "Pool tables").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    /// Unique category identifier.
    pub id: CategoryId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Icon name or URL.
    pub icon: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Display order (ascending).
    pub sort_order: i32,
    /// Inactive categories are hidden from operators.
    pub is_active: bool,
    /// Schema describing the custom fields of member assets.
    #[sqlx(json)]
    pub custom_fields_schema: CustomFields,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Build a new row from a create request.
    pub fn from_create(tenant_id: TenantId, data: CreateCategory, now: DateTime<Utc>) -> Self {
        Self {
            id: CategoryId::new(),
            tenant_id,
            name: data.name,
            icon: data.icon,
            description: data.description,
            sort_order: data.sort_order.unwrap_or(0),
            is_active: data.is_active.unwrap_or(true),
            custom_fields_schema: data.custom_fields_schema.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: UpdateCategory, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(icon) = update.icon {
            self.icon = icon;
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
        if let Some(schema) = update.custom_fields_schema {
            self.custom_fields_schema = schema;
        }
        self.updated_at = now;
    }
}

/// Data required to create a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    /// Display name.
    pub name: String,
    /// Icon name or URL.
    pub icon: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Display order.
    pub sort_order: Option<i32>,
    /// Active flag (default `true`).
    pub is_active: Option<bool>,
    /// Custom-fields schema.
    pub custom_fields_schema: Option<CustomFields>,
}

/// Partial category update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    /// New name.
    pub name: Option<String>,
    /// New icon; `null` clears it.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub icon: Option<Option<String>>,
    /// New description; `null` clears it.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// New display order.
    pub sort_order: Option<i32>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// Replacement schema.
    pub custom_fields_schema: Option<CustomFields>,
}
