//! Tenant resolution from request credentials.
//!
//! The HTTP layer hands the bearer token of each request to a
//! [`TenantResolver`], which maps it to the [`TenantContext`] that scopes
//! every subsequent registry call.

use crate::tenant::TenantContext;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Resolves tenant contexts from authentication credentials.
///
/// Implementations must never log the raw credential.
pub trait TenantResolver: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolve the tenant a bearer credential belongs to.
    fn resolve_tenant(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<TenantContext, Self::Error>> + Send;

    /// Whether any credential belongs to `tenant_id`.
    fn validate_tenant(
        &self,
        tenant_id: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum StaticResolverError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Fixed credential table, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTenantResolver {
    credentials: Arc<HashMap<String, TenantContext>>,
}

impl StaticTenantResolver {
    pub fn builder() -> StaticTenantResolverBuilder {
        StaticTenantResolverBuilder::new()
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }
}

impl TenantResolver for StaticTenantResolver {
    type Error = StaticResolverError;

    async fn resolve_tenant(&self, credential: &str) -> Result<TenantContext, Self::Error> {
        self.credentials
            .get(credential)
            .cloned()
            .ok_or(StaticResolverError::InvalidCredentials)
    }

    async fn validate_tenant(&self, tenant_id: &str) -> Result<bool, Self::Error> {
        Ok(self
            .credentials
            .values()
            .any(|context| context.tenant_id == tenant_id))
    }
}

/// Collects credential → tenant mappings. A later mapping for the same
/// credential replaces the earlier one.
#[derive(Debug, Default)]
pub struct StaticTenantResolverBuilder {
    credentials: HashMap<String, TenantContext>,
}

impl StaticTenantResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(
        mut self,
        credential: impl Into<String>,
        tenant_context: TenantContext,
    ) -> Self {
        self.credentials.insert(credential.into(), tenant_context);
        self
    }

    pub fn build(self) -> StaticTenantResolver {
        StaticTenantResolver {
            credentials: Arc::new(self.credentials),
        }
    }
}
