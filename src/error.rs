//! Error types for application registry operations.
//!
//! [`RegistryError`] is the single error surfaced by providers and handlers.
//! Each variant maps to exactly one HTTP status in the server layer.

use crate::storage::StorageError;

/// Main error type for application registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The request payload or parameters failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No application with this identifier exists in the caller's tenant
    #[error("Application not found: {id} in tenant '{tenant}'")]
    NotFound { tenant: String, id: String },

    /// An application with the same name already exists in the tenant
    #[error("Application '{name}' already exists in tenant '{tenant}'")]
    Conflict { tenant: String, name: String },

    /// The operation is not permitted for this application or tenant
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// No usable credential accompanied the request
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Uploaded payload exceeds the configured limit
    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON serialization/deserialization errors on stored records
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

/// Validation failures for create, import, and list requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required attribute is missing or blank
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Application name exceeds the maximum length
    #[error("Application name exceeds {max} characters")]
    NameTooLong { max: usize },

    /// Application name collides with a system application
    #[error("Application name '{name}' is reserved")]
    ReservedName { name: String },

    /// Structured descriptor could not be parsed
    #[error("Malformed application payload: {message}")]
    MalformedPayload { message: String },

    /// XML descriptor could not be parsed
    #[error("Malformed application descriptor: {message}")]
    MalformedDescriptor { message: String },

    /// Multipart upload is missing the descriptor part
    #[error("Multipart upload is missing the '{part}' part")]
    MissingUploadPart { part: String },

    /// Unsupported or malformed list filter
    #[error("Invalid filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    /// Invalid pagination parameter
    #[error("Invalid pagination parameter '{parameter}': {message}")]
    InvalidPagination { parameter: String, message: String },
}

impl RegistryError {
    /// Create a not found error for an application identifier.
    pub fn not_found(tenant: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            tenant: tenant.into(),
            id: id.into(),
        }
    }

    /// Create a name conflict error.
    pub fn conflict(tenant: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Conflict {
            tenant: tenant.into(),
            name: name.into(),
        }
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable error code reported in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "APP-60001",
            Self::NotFound { .. } => "APP-60006",
            Self::Conflict { .. } => "APP-60007",
            Self::Forbidden { .. } => "APP-60010",
            Self::Unauthorized { .. } => "APP-60011",
            Self::PayloadTooLarge { .. } => "APP-60012",
            Self::Storage(_) | Self::Json(_) | Self::Internal { .. } => "APP-65001",
        }
    }
}

impl ValidationError {
    pub fn missing(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    pub fn malformed_descriptor(message: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            message: message.into(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_registry_error() {
        let err: RegistryError = ValidationError::missing("name").into();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert_eq!(err.code(), "APP-60001");
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn not_found_mentions_tenant_and_id() {
        let err = RegistryError::not_found("carbon.super", "abc");
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("carbon.super"));
        assert_eq!(err.code(), "APP-60006");
    }

    #[test]
    fn storage_errors_are_internal() {
        let err: RegistryError = StorageError::NotAnObject {
            key: "carbon.super/applications/abc".to_string(),
            kind: "array",
        }
        .into();
        assert_eq!(err.code(), "APP-65001");
        assert!(err.to_string().contains("not a JSON object"));
    }
}
