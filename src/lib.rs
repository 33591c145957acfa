//! Tenant-scoped application registry.
//!
//! Manages the application (service provider) registrations of each tenant
//! over a REST API: list, create, get, delete, and round-tripping through an
//! XML descriptor with import and export. A small HTTP client drives the
//! success path of that API end to end.
//!
//! # Core Components
//!
//! - [`ApplicationProvider`] - Tenant-scoped application operations
//! - [`StandardApplicationProvider`] - Provider over any [`storage::StorageProvider`]
//! - [`server::build_router`] - axum router for the REST surface
//! - [`client::ScenarioRunner`] - Success-path verification
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use app_registry::config::LocationConfig;
//! use app_registry::provider::StandardApplicationProvider;
//! use app_registry::server::{self, AppState, RequestLimits};
//! use app_registry::storage::InMemoryStorage;
//! use app_registry::tenant::{StaticTenantResolverBuilder, TenantContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = StandardApplicationProvider::new(InMemoryStorage::new());
//! let resolver = StaticTenantResolverBuilder::new()
//!     .with_tenant("root-token", TenantContext::super_tenant("admin"))
//!     .build();
//! let state = AppState::new(provider, resolver, LocationConfig::new("http://127.0.0.1:9443"));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:9443").await?;
//! server::serve(listener, server::build_router(state, RequestLimits::default())).await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod provider;
pub mod server;
pub mod storage;
pub mod tenant;

pub use application::{Application, ApplicationId, ApplicationModel, ListQuery};
pub use error::{RegistryError, RegistryResult, ValidationError};
pub use provider::{ApplicationProvider, StandardApplicationProvider};
pub use tenant::{RequestContext, TenantContext, TenantResolver};
