//! Tenant and request context types.
//!
//! Every provider call receives a [`RequestContext`] carrying the caller's
//! [`TenantContext`]. Nothing about the tenant is held in ambient state.

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Domain of the root tenant. Only this tenant carries the default portal
/// application.
pub const SUPER_TENANT_DOMAIN: &str = "carbon.super";

/// Operations a tenant credential may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationOperation {
    List,
    Read,
    Create,
    Delete,
    Import,
    Export,
}

impl ApplicationOperation {
    /// Whether the operation changes registry state.
    pub fn is_mutation(self) -> bool {
        matches!(self, Self::Create | Self::Delete | Self::Import)
    }
}

impl fmt::Display for ApplicationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Read => "read",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Import => "import",
            Self::Export => "export",
        };
        f.write_str(name)
    }
}

/// Tenant-specific permissions for application operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantPermissions {
    pub read_only: bool,
    /// Upper bound on non-system applications in the tenant
    pub max_applications: Option<usize>,
}

impl Default for TenantPermissions {
    fn default() -> Self {
        Self {
            read_only: false,
            max_applications: None,
        }
    }
}

impl TenantPermissions {
    /// Permissions that allow listing, reading, and exporting only.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn allows(&self, operation: ApplicationOperation) -> bool {
        !(self.read_only && operation.is_mutation())
    }

    /// Check whether one more application fits under the limit.
    pub fn check_application_limit(&self, current_count: usize) -> bool {
        match self.max_applications {
            Some(limit) => current_count < limit,
            None => true,
        }
    }
}

/// Tenant context for a single caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Tenant domain, e.g. `carbon.super`
    pub tenant_id: String,
    /// Principal the credential was issued to
    pub client_id: String,
    pub permissions: TenantPermissions,
}

impl TenantContext {
    /// Create a new tenant context with default permissions
    pub fn new(tenant_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            permissions: TenantPermissions::default(),
        }
    }

    /// Context for the root tenant.
    pub fn super_tenant(client_id: impl Into<String>) -> Self {
        Self::new(SUPER_TENANT_DOMAIN, client_id)
    }

    pub fn with_permissions(mut self, permissions: TenantPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn is_super_tenant(&self) -> bool {
        self.tenant_id == SUPER_TENANT_DOMAIN
    }
}

/// Request context for registry operations.
///
/// Provides request tracking for logging and the explicit tenant scope of
/// the call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request
    pub request_id: String,
    pub tenant_context: TenantContext,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, tenant_context: TenantContext) -> Self {
        Self {
            request_id: request_id.into(),
            tenant_context,
        }
    }

    /// Create a request context with a generated request ID.
    pub fn with_generated_id(tenant_context: TenantContext) -> Self {
        Self::new(Uuid::new_v4().to_string(), tenant_context)
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_context.tenant_id
    }

    /// Validate that this context can perform the requested operation.
    pub fn validate_operation(&self, operation: ApplicationOperation) -> RegistryResult<()> {
        if self.tenant_context.permissions.allows(operation) {
            Ok(())
        } else {
            Err(RegistryError::forbidden(format!(
                "Operation '{}' not permitted for client '{}' in tenant '{}'",
                operation,
                self.tenant_context.client_id,
                self.tenant_id()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_tenant_detection() {
        assert!(TenantContext::super_tenant("admin").is_super_tenant());
        assert!(!TenantContext::new("tenant.example.com", "admin").is_super_tenant());
    }

    #[test]
    fn read_only_blocks_mutations() {
        let ctx = RequestContext::with_generated_id(
            TenantContext::new("tenant.example.com", "auditor")
                .with_permissions(TenantPermissions::read_only()),
        );

        assert!(ctx.validate_operation(ApplicationOperation::List).is_ok());
        assert!(ctx.validate_operation(ApplicationOperation::Export).is_ok());

        let err = ctx
            .validate_operation(ApplicationOperation::Delete)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Forbidden { .. }));
        assert!(err.to_string().contains("auditor"));
    }

    #[test]
    fn application_limit() {
        let permissions = TenantPermissions {
            read_only: false,
            max_applications: Some(2),
        };
        assert!(permissions.check_application_limit(1));
        assert!(!permissions.check_application_limit(2));
        assert!(TenantPermissions::default().check_application_limit(usize::MAX - 1));
    }

    #[test]
    fn generated_request_ids_are_unique() {
        let tenant = TenantContext::super_tenant("admin");
        let a = RequestContext::with_generated_id(tenant.clone());
        let b = RequestContext::with_generated_id(tenant);
        assert_ne!(a.request_id, b.request_id);
    }
}
