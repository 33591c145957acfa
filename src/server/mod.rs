//! HTTP surface of the registry.
//!
//! The application routes are mounted twice: under [`API_BASE_PATH`] for the
//! credential's own tenant, and under `/t/{tenant}` + [`API_BASE_PATH`] for an
//! explicit tenant that must match the credential.
//!
//! # Routes
//!
//! - `GET    .../applications` - List applications
//! - `POST   .../applications` - Create an application (JSON)
//! - `POST   .../applications/import` - Import an XML descriptor (multipart)
//! - `GET    .../applications/{id}` - Get application by ID
//! - `DELETE .../applications/{id}` - Delete an application
//! - `GET    .../applications/{id}/export` - Export an XML descriptor
//! - `GET    /health` - Liveness, no authentication

pub mod auth;
pub mod handlers;
pub mod response;
pub mod state;

pub use response::{ApiError, ApiResult, ErrorResponse};
pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use log::info;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::config::{API_BASE_PATH, ServerConfig, TENANT_PATH_SEGMENT};
use crate::provider::ApplicationProvider;
use crate::tenant::TenantResolver;

/// Request limits applied to every route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

impl RequestLimits {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_body_bytes: config.max_upload_bytes,
        }
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// Application routes relative to the API root.
pub fn application_router<P, R>() -> Router<AppState<P, R>>
where
    P: ApplicationProvider + 'static,
    R: TenantResolver + 'static,
{
    Router::new()
        .route(
            "/applications",
            get(handlers::list_applications::<P, R>).post(handlers::create_application::<P, R>),
        )
        .route(
            "/applications/import",
            post(handlers::import_application::<P, R>),
        )
        .route(
            "/applications/{id}",
            get(handlers::get_application::<P, R>).delete(handlers::delete_application::<P, R>),
        )
        .route(
            "/applications/{id}/export",
            get(handlers::export_application::<P, R>),
        )
}

/// Full router with both mounts, authentication, limits, and health.
pub fn build_router<P, R>(state: AppState<P, R>, limits: RequestLimits) -> Router
where
    P: ApplicationProvider + 'static,
    R: TenantResolver + 'static,
{
    let tenant_mount = format!("/{}/{{tenant}}{}", TENANT_PATH_SEGMENT, API_BASE_PATH);

    Router::new()
        .nest(API_BASE_PATH, application_router::<P, R>())
        .nest(&tenant_mount, application_router::<P, R>())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate::<P, R>,
        ))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(limits.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            limits.timeout,
        ))
        .with_state(state)
}

/// Serve the router on an already bound listener until ctrl-c.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    info!(
        "Application registry listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            log::warn!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
