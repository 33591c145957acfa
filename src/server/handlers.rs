//! HTTP handlers for the application routes.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{
        Multipart, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
        multipart::MultipartRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use log::debug;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::application::{
    Application, ApplicationListItem, ApplicationListResponse, ApplicationModel,
    ApplicationResponse, Link, ListParams, ListQuery,
};
use crate::config::LocationConfig;
use crate::error::{RegistryError, RegistryResult, ValidationError};
use crate::provider::{ApplicationPage, ApplicationProvider};
use crate::server::response::{ApiResult, Traced};
use crate::server::state::AppState;
use crate::tenant::{RequestContext, TenantResolver};

/// Name of the multipart part carrying the descriptor.
pub const UPLOAD_PART: &str = "file";

/// Path parameters of single-application routes. The tenant segment of the
/// `/t/{tenant}` mount is checked by the authentication middleware.
#[derive(Debug, Deserialize)]
pub struct ApplicationPath {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    #[serde(rename = "exportSecrets", default)]
    pub export_secrets: bool,
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

/// GET /applications - List the tenant's applications
pub async fn list_applications<P, R>(
    State(state): State<AppState<P, R>>,
    Extension(context): Extension<RequestContext>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ApplicationListResponse>>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    let Query(params) = params
        .map_err(|e| RegistryError::from_rejection(e.status(), e.body_text()))
        .traced(&context)?;
    let query = ListQuery::from_params(&params, state.default_page_size).traced(&context)?;

    let page = state
        .provider
        .list_applications(&query, &context)
        .await
        .traced(&context)?;

    let tenant_id = context.tenant_id();
    let links = page_links(&state.location, tenant_id, &page, params.filter.as_deref());
    let applications: Vec<ApplicationListItem> = page
        .applications
        .iter()
        .map(|app| {
            ApplicationListItem::new(
                app,
                state.location.application_location(tenant_id, app.id.as_str()),
            )
        })
        .collect();

    Ok(Json(ApplicationListResponse {
        total_results: page.total_results,
        start_index: page.offset + 1,
        count: applications.len(),
        applications,
        links,
    }))
}

/// POST /applications - Create an application from JSON
pub async fn create_application<P, R>(
    State(state): State<AppState<P, R>>,
    Extension(context): Extension<RequestContext>,
    body: Result<Json<ApplicationModel>, JsonRejection>,
) -> ApiResult<Response>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    let Json(model) = body
        .map_err(|e| RegistryError::from_rejection(e.status(), e.body_text()))
        .traced(&context)?;

    let app = state
        .provider
        .create_application(model, &context)
        .await
        .traced(&context)?;

    Ok(created(&state.location, &context, &app))
}

/// POST /applications/import - Create an application from an XML upload
pub async fn import_application<P, R>(
    State(state): State<AppState<P, R>>,
    Extension(context): Extension<RequestContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    let mut multipart = multipart
        .map_err(|e| RegistryError::from_rejection(e.status(), e.body_text()))
        .traced(&context)?;
    let content = read_upload_part(&mut multipart).await.traced(&context)?;

    let app = state
        .provider
        .import_application(&content, &context)
        .await
        .traced(&context)?;

    Ok(created(&state.location, &context, &app))
}

/// GET /applications/{id} - Get application by ID
pub async fn get_application<P, R>(
    State(state): State<AppState<P, R>>,
    Extension(context): Extension<RequestContext>,
    Path(path): Path<ApplicationPath>,
) -> ApiResult<Response>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    let versioned = state
        .provider
        .get_application(&path.id, &context)
        .await
        .traced(&context)?;

    Ok((
        [(header::ETAG, versioned.version.to_etag())],
        Json(ApplicationResponse::from(versioned.application)),
    )
        .into_response())
}

/// DELETE /applications/{id} - Delete an application
pub async fn delete_application<P, R>(
    State(state): State<AppState<P, R>>,
    Extension(context): Extension<RequestContext>,
    Path(path): Path<ApplicationPath>,
) -> ApiResult<StatusCode>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    state
        .provider
        .delete_application(&path.id, &context)
        .await
        .traced(&context)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /applications/{id}/export - Download the XML descriptor
pub async fn export_application<P, R>(
    State(state): State<AppState<P, R>>,
    Extension(context): Extension<RequestContext>,
    Path(path): Path<ApplicationPath>,
    params: Result<Query<ExportParams>, QueryRejection>,
) -> ApiResult<Response>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    let Query(params) = params
        .map_err(|e| RegistryError::from_rejection(e.status(), e.body_text()))
        .traced(&context)?;
    if params.export_secrets {
        debug!("exportSecrets requested; no secrets are stored");
    }

    let export = state
        .provider
        .export_application(&path.id, &context)
        .await
        .traced(&context)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        export.content,
    )
        .into_response())
}

/// 201 Created with the new application's `Location` and an empty body.
fn created(location: &LocationConfig, context: &RequestContext, app: &Application) -> Response {
    (
        StatusCode::CREATED,
        [(
            header::LOCATION,
            location.application_location(context.tenant_id(), app.id.as_str()),
        )],
    )
        .into_response()
}

async fn read_upload_part(multipart: &mut Multipart) -> RegistryResult<Bytes> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RegistryError::from_rejection(e.status(), e.body_text()))?
    {
        if field.name() == Some(UPLOAD_PART) {
            return field
                .bytes()
                .await
                .map_err(|e| RegistryError::from_rejection(e.status(), e.body_text()));
        }
    }
    Err(ValidationError::MissingUploadPart {
        part: UPLOAD_PART.to_string(),
    }
    .into())
}

fn page_links(
    location: &LocationConfig,
    tenant_id: &str,
    page: &ApplicationPage,
    filter: Option<&str>,
) -> Vec<Link> {
    let base = location.applications_url(tenant_id);
    let filter = filter.map(str::trim).filter(|f| !f.is_empty());
    let href = |offset: usize| {
        let mut href = format!("{}?offset={}&limit={}", base, offset, page.limit);
        if let Some(filter) = filter {
            href.push_str("&filter=");
            href.push_str(&urlencoding::encode(filter));
        }
        href
    };

    let mut links = Vec::new();
    if page.has_next() {
        links.push(Link {
            href: href(page.offset + page.limit),
            rel: "next".to_string(),
        });
    }
    if page.has_previous() {
        links.push(Link {
            href: href(page.offset.saturating_sub(page.limit)),
            rel: "previous".to_string(),
        });
    }
    links
}
