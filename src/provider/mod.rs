//! Registry operations over a tenant-scoped application store.
//!
//! [`ApplicationProvider`] is the seam between the HTTP layer and the
//! registry semantics. [`StandardApplicationProvider`] implements it on top
//! of any [`StorageProvider`](crate::storage::StorageProvider).

pub mod standard;

pub use standard::StandardApplicationProvider;

use std::future::Future;

use crate::application::{Application, ApplicationModel, ApplicationVersion, ListQuery};
use crate::error::RegistryResult;
use crate::tenant::RequestContext;

/// One page of a tenant's applications, sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationPage {
    /// Matches before pagination
    pub total_results: usize,
    pub offset: usize,
    pub limit: usize,
    pub applications: Vec<Application>,
}

impl ApplicationPage {
    pub fn has_next(&self) -> bool {
        self.offset + self.applications.len() < self.total_results
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }
}

/// An application together with its content version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedApplication {
    pub application: Application,
    pub version: ApplicationVersion,
}

impl VersionedApplication {
    pub fn new(application: Application) -> RegistryResult<Self> {
        let content = serde_json::to_vec(&application)?;
        Ok(Self {
            version: ApplicationVersion::from_content(&content),
            application,
        })
    }
}

/// Serialized descriptor ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDescriptor {
    pub file_name: String,
    pub content: String,
}

impl ExportedDescriptor {
    pub fn new(application_name: &str, content: String) -> Self {
        let stem: String = application_name
            .chars()
            .map(|c| match c {
                '"' | '\\' | '/' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        Self {
            file_name: format!("{}.xml", stem),
            content,
        }
    }
}

/// Tenant-scoped application registry.
///
/// Every call carries the caller's [`RequestContext`]; implementations must
/// never read or write outside `context.tenant_id()`.
pub trait ApplicationProvider: Send + Sync {
    /// List the tenant's applications. System applications are always part
    /// of the result set.
    fn list_applications(
        &self,
        query: &ListQuery,
        context: &RequestContext,
    ) -> impl Future<Output = RegistryResult<ApplicationPage>> + Send;

    /// Create an application from a JSON creation model.
    fn create_application(
        &self,
        model: ApplicationModel,
        context: &RequestContext,
    ) -> impl Future<Output = RegistryResult<Application>> + Send;

    /// Create an application from an uploaded XML descriptor.
    fn import_application(
        &self,
        content: &[u8],
        context: &RequestContext,
    ) -> impl Future<Output = RegistryResult<Application>> + Send;

    fn get_application(
        &self,
        id: &str,
        context: &RequestContext,
    ) -> impl Future<Output = RegistryResult<VersionedApplication>> + Send;

    /// Delete a non-system application.
    fn delete_application(
        &self,
        id: &str,
        context: &RequestContext,
    ) -> impl Future<Output = RegistryResult<()>> + Send;

    /// Serialize an application to its XML descriptor.
    fn export_application(
        &self,
        id: &str,
        context: &RequestContext,
    ) -> impl Future<Output = RegistryResult<ExportedDescriptor>> + Send;
}
