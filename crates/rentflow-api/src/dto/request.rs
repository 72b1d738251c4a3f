//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use rentflow_core::types::{AssetId, CategoryId, CustomFields, RentalSessionId};
use rentflow_entity::asset::CreateAsset;
use rentflow_entity::category::CreateCategory;
use rentflow_entity::rental::{PaymentType, SessionFilter, SessionStatus};
use rentflow_service::{StartSessionRequest, StopSessionRequest};

use crate::extractors::PaginationParams;
use crate::extractors::pagination::{default_page, default_per_page};

/// `POST /sessions/start` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartSessionBody {
    /// Asset to occupy.
    pub asset_id: AssetId,
    /// Planned length in minutes.
    #[validate(range(min = 1, message = "planned_duration must be positive"))]
    pub planned_duration: Option<i32>,
    /// Manual price; bills the session as fixed.
    pub fixed_price: Option<Decimal>,
    /// Opaque client metadata.
    #[serde(default)]
    pub metadata: CustomFields,
}

impl From<StartSessionBody> for StartSessionRequest {
    fn from(body: StartSessionBody) -> Self {
        Self {
            asset_id: body.asset_id,
            planned_duration: body.planned_duration,
            fixed_price: body.fixed_price,
            metadata: body.metadata,
        }
    }
}

/// `POST /sessions/{id}/stop` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StopSessionBody {
    /// How the customer paid.
    pub payment_type: PaymentType,
    /// Promotion code to redeem.
    #[validate(length(min = 1, max = 64))]
    pub promotion_code: Option<String>,
    /// Games played, for per-game sessions.
    #[validate(range(min = 0, message = "units must not be negative"))]
    pub units: Option<i32>,
}

impl From<StopSessionBody> for StopSessionRequest {
    fn from(body: StopSessionBody) -> Self {
        Self {
            payment_type: body.payment_type,
            promotion_code: body.promotion_code,
            units: body.units,
        }
    }
}

/// `POST /promotions/validate` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValidatePromotionBody {
    /// Code to check.
    #[validate(length(min = 1, max = 64, message = "code is required"))]
    pub code: String,
    /// Session whose figures the check uses.
    pub session_id: Option<RentalSessionId>,
}

/// Create category body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryBody {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Icon name or URL.
    pub icon: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Display order.
    pub sort_order: Option<i32>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// Custom-fields schema.
    pub custom_fields_schema: Option<CustomFields>,
}

impl From<CreateCategoryBody> for CreateCategory {
    fn from(body: CreateCategoryBody) -> Self {
        Self {
            name: body.name,
            icon: body.icon,
            description: body.description,
            sort_order: body.sort_order,
            is_active: body.is_active,
            custom_fields_schema: body.custom_fields_schema,
        }
    }
}

/// Create asset body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAssetBody {
    /// Category reference.
    pub category_id: Option<CategoryId>,
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Display order.
    pub sort_order: Option<i32>,
    /// Active flag.
    pub is_active: Option<bool>,
    /// Initial custom fields.
    pub custom_fields: Option<CustomFields>,
}

impl From<CreateAssetBody> for CreateAsset {
    fn from(body: CreateAssetBody) -> Self {
        Self {
            category_id: body.category_id,
            name: body.name,
            description: body.description,
            sort_order: body.sort_order,
            is_active: body.is_active,
            custom_fields: body.custom_fields,
        }
    }
}

/// `GET /sessions` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListQuery {
    /// Only sessions on this asset.
    pub asset: Option<AssetId>,
    /// Only sessions in this state.
    pub status: Option<SessionStatus>,
    /// Started at or after.
    pub from: Option<DateTime<Utc>>,
    /// Started before.
    pub to: Option<DateTime<Utc>>,
    /// Page number.
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size.
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl SessionListQuery {
    /// Split into the store filter and the page.
    pub fn into_parts(self) -> (SessionFilter, PaginationParams) {
        (
            SessionFilter {
                asset_id: self.asset,
                status: self.status,
                from: self.from,
                to: self.to,
            },
            PaginationParams {
                page: self.page,
                per_page: self.per_page,
            },
        )
    }
}

/// `GET /assets` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetListQuery {
    /// Only assets in this category.
    pub category_id: Option<CategoryId>,
    /// Page number.
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size.
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

/// `GET /sessions/{id}/cost` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostQuery {
    /// Games played so far, for per-game sessions.
    pub units: Option<i32>,
}

/// `GET /pricing/quote` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteQuery {
    /// Asset to price.
    pub asset_id: AssetId,
    /// Instant to price at; defaults to now.
    pub at: Option<DateTime<Utc>>,
}
