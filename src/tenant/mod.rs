//! Multi-tenant support: tenant contexts, per-request contexts, and
//! credential-to-tenant resolution.

pub mod context;
pub mod resolver;

pub use context::{
    ApplicationOperation, RequestContext, SUPER_TENANT_DOMAIN, TenantContext, TenantPermissions,
};
pub use resolver::{
    StaticResolverError, StaticTenantResolver, StaticTenantResolverBuilder, TenantResolver,
};
