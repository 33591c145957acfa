//! XML application descriptors: import parsing, export serialization, and
//! path-based text queries over exported documents.

pub mod query;
pub mod service_provider;

pub use query::DocumentQuery;
pub use service_provider::{
    DESCRIPTOR_ROOT, InboundAuthenticationConfig, InboundAuthenticationRequestConfig,
    InboundAuthenticationRequestConfigs, ServiceProviderDescriptor,
};
