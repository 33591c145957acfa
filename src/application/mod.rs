//! Application domain: records, wire models, system applications, list
//! queries, and content versions.

pub mod model;
pub mod query;
pub mod system;
pub mod version;

pub use model::{
    Access, AdvancedConfigurations, Application, ApplicationId, ApplicationListItem,
    ApplicationListResponse, ApplicationMeta, ApplicationModel, ApplicationResponse,
    InboundProtocol, Link, MAX_NAME_LENGTH,
};
pub use query::{DEFAULT_PAGE_SIZE, FilterOperator, ListParams, ListQuery, NameFilter};
pub use system::{RESIDENT_APPLICATION_NAME, USER_PORTAL_APPLICATION_NAME};
pub use version::ApplicationVersion;

/// Resource type under which applications are stored.
pub const APPLICATION_RESOURCE_TYPE: &str = "Application";
