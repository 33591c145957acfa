//! Shared helpers for the HTTP-level tests: a router wired to in-memory
//! storage, request builders, and a server bound to an ephemeral port.

#![allow(dead_code)]

use app_registry::config::LocationConfig;
use app_registry::provider::StandardApplicationProvider;
use app_registry::server::{self, AppState, RequestLimits};
use app_registry::storage::InMemoryStorage;
use app_registry::tenant::{
    StaticTenantResolver, StaticTenantResolverBuilder, TenantContext, TenantPermissions,
};
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

pub const BASE_URL: &str = "https://localhost:9443";
pub const ROOT_TENANT: &str = "carbon.super";
pub const ROOT_TOKEN: &str = "root-admin-token";
pub const TENANT: &str = "tenant.example.com";
pub const TENANT_TOKEN: &str = "tenant-admin-token";
pub const READ_ONLY_TOKEN: &str = "read-only-token";

pub const ROOT_API: &str = "/api/server/v1";
pub const TENANT_API: &str = "/t/tenant.example.com/api/server/v1";

pub type TestState = AppState<StandardApplicationProvider<InMemoryStorage>, StaticTenantResolver>;

pub fn test_resolver() -> StaticTenantResolver {
    StaticTenantResolverBuilder::new()
        .with_tenant(ROOT_TOKEN, TenantContext::super_tenant("admin"))
        .with_tenant(TENANT_TOKEN, TenantContext::new(TENANT, "admin"))
        .with_tenant(
            READ_ONLY_TOKEN,
            TenantContext::new("readonly.example.com", "auditor")
                .with_permissions(TenantPermissions::read_only()),
        )
        .build()
}

pub async fn test_state(base_url: &str) -> TestState {
    let provider = StandardApplicationProvider::new(InMemoryStorage::new());
    AppState::new(provider, test_resolver(), LocationConfig::new(base_url))
}

pub async fn test_router() -> Router {
    test_router_with_limits(RequestLimits::default()).await
}

pub async fn test_router_with_limits(limits: RequestLimits) -> Router {
    server::build_router(test_state(BASE_URL).await, limits)
}

/// Response parts collected from a one-shot request.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("response body is UTF-8")
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Identifier at the end of the `Location` header.
    pub fn location_id(&self) -> String {
        let location = self.header(header::LOCATION).expect("Location header");
        app_registry::client::extract_application_id(location)
            .expect("identifier in Location")
            .to_string()
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        headers,
        body,
    }
}

fn authorized(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    authorized("GET", uri, token).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    authorized("DELETE", uri, token).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    authorized("POST", uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub const BOUNDARY: &str = "registry-test-boundary";

/// A multipart/form-data body with a single file part.
pub fn multipart_body(part: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            part, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/xml\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn post_multipart(uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    authorized("POST", uri, token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn import_request(api: &str, token: &str, descriptor: &str) -> Request<Body> {
    post_multipart(
        &format!("{}/applications/import", api),
        Some(token),
        multipart_body("file", "descriptor.xml", descriptor.as_bytes()),
    )
}

/// A registry listening on an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let router = server::build_router(
            test_state(&base_url).await,
            RequestLimits {
                timeout: Duration::from_secs(10),
                max_body_bytes: 1024 * 1024,
            },
        );
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
