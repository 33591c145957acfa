//! Bearer token authentication and tenant scoping.
//!
//! Extracts the `Authorization: Bearer <token>` header, resolves it to a
//! tenant through the configured [`TenantResolver`], checks it against the
//! `/t/{tenant}` path prefix if present, and injects the resulting
//! [`RequestContext`] into the request extensions.

use axum::{
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::{debug, warn};
use uuid::Uuid;

use crate::config::TENANT_PATH_SEGMENT;
use crate::error::{RegistryError, RegistryResult};
use crate::provider::ApplicationProvider;
use crate::server::response::ApiError;
use crate::server::state::AppState;
use crate::tenant::{RequestContext, TenantResolver};

/// Authentication middleware for the application routes.
pub async fn authenticate<P, R>(
    State(state): State<AppState<P, R>>,
    mut request: Request,
    next: Next,
) -> Response
where
    P: ApplicationProvider + 'static,
    R: TenantResolver + 'static,
{
    let request_id = Uuid::new_v4().to_string();
    // Nested routers see a stripped URI
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    match resolve_context(&state, request.headers(), &path, &request_id).await {
        Ok(context) => {
            debug!(
                "Request {} {} authenticated for tenant '{}' (request: '{}')",
                request.method(),
                path,
                context.tenant_id(),
                request_id
            );
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => ApiError::new(e, request_id).into_response(),
    }
}

async fn resolve_context<P, R>(
    state: &AppState<P, R>,
    headers: &HeaderMap,
    path: &str,
    request_id: &str,
) -> RegistryResult<RequestContext>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    let token = bearer_token(headers)
        .ok_or_else(|| RegistryError::unauthorized("Missing or invalid Authorization header"))?;

    let tenant_context = state.resolver.resolve_tenant(token).await.map_err(|e| {
        warn!("Rejected credential (request: '{}'): {}", request_id, e);
        RegistryError::unauthorized(e.to_string())
    })?;

    if let Some(path_tenant) = path_tenant(path) {
        if path_tenant != tenant_context.tenant_id {
            let known = state
                .resolver
                .validate_tenant(&path_tenant)
                .await
                .unwrap_or(false);
            warn!(
                "Credential for tenant '{}' used against {} tenant '{}' (request: '{}')",
                tenant_context.tenant_id,
                if known { "foreign" } else { "unknown" },
                path_tenant,
                request_id
            );
            return Err(RegistryError::forbidden(format!(
                "Credential is not valid for tenant '{}'",
                path_tenant
            )));
        }
    }

    Ok(RequestContext::new(request_id, tenant_context))
}

/// Extract the bearer token from the request headers.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty()).then_some(token)
}

/// Tenant named by a `/t/{tenant}/...` path prefix.
pub fn path_tenant(path: &str) -> Option<String> {
    let rest = path
        .strip_prefix('/')?
        .strip_prefix(TENANT_PATH_SEGMENT)?
        .strip_prefix('/')?;
    let segment = rest.split('/').next().filter(|s| !s.is_empty())?;
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}
