//! `Tenant` extractor: reads the `X-Tenant-ID` header into a [`TenantContext`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use rentflow_core::error::AppError;
use rentflow_core::types::TenantId;
use rentflow_service::TenantContext;

use crate::error::ApiError;

/// Header carrying the tenant identifier.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Tenant context for the current request.
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub TenantContext);

impl std::ops::Deref for Tenant {
    type Target = TenantContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::validation("Missing X-Tenant-ID header"))?;

        let tenant_id = raw
            .trim()
            .parse::<TenantId>()
            .map_err(|_| AppError::validation(format!("Invalid X-Tenant-ID: {raw}")))?;

        Ok(Tenant(TenantContext::new(tenant_id)))
    }
}
