//! Mapping of registry errors to HTTP responses.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult, ValidationError};
use crate::tenant::RequestContext;

impl RegistryError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(_) | Self::Json(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short, stable summary used as the `message` of an error body.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid request",
            Self::NotFound { .. } => "Application not found",
            Self::Conflict { .. } => "Application already exists",
            Self::Forbidden { .. } => "Operation not permitted",
            Self::Unauthorized { .. } => "Authentication required",
            Self::PayloadTooLarge { .. } => "Payload too large",
            Self::Storage(_) | Self::Json(_) | Self::Internal { .. } => "Internal server error",
        }
    }

    /// Build from the status and text of an axum extractor rejection.
    pub fn from_rejection(status: StatusCode, body_text: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge { message: body_text }
        } else {
            ValidationError::MalformedPayload { message: body_text }.into()
        }
    }
}

/// API error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Stable error code, e.g. `APP-60006`
    pub code: String,
    pub message: String,
    pub description: String,
    /// Request identifier, also written to the server log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// A registry error bound to the request it failed.
#[derive(Debug)]
pub struct ApiError {
    pub error: RegistryError,
    pub trace_id: Option<String>,
}

impl ApiError {
    pub fn new(error: RegistryError, trace_id: impl Into<String>) -> Self {
        Self {
            error,
            trace_id: Some(trace_id.into()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        Self {
            error,
            trace_id: None,
        }
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Attach the request's trace id to a failed registry call.
pub trait Traced<T> {
    fn traced(self, context: &RequestContext) -> ApiResult<T>;
}

impl<T> Traced<T> for RegistryResult<T> {
    fn traced(self, context: &RequestContext) -> ApiResult<T> {
        self.map_err(|e| ApiError::new(e, &context.request_id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let trace = self.trace_id.as_deref().unwrap_or("-");

        // Server-side failures keep their detail in the log only
        let description = if status.is_server_error() {
            error!("Request {} failed: {}", trace, self.error);
            "The server encountered an error while processing the request".to_string()
        } else {
            debug!("Request {} rejected with {}: {}", trace, status, self.error);
            self.error.to_string()
        };

        let body = ErrorResponse {
            code: self.error.code().to_string(),
            message: self.error.title().to_string(),
            description,
            trace_id: self.trace_id,
        };

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
