//! Explicit tenant context passed into every service call.

use serde::{Deserialize, Serialize};

use rentflow_core::types::TenantId;

/// Who the current call acts for.
///
/// Built by the API layer from the `X-Tenant-ID` header, or by the CLI from
/// its `--tenant` flag. Every store query is scoped by `tenant_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// The tenant whose data is read and written.
    pub tenant_id: TenantId,
}

impl TenantContext {
    /// Creates a context for a tenant.
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }
}
