//! HTTP client for the application registry and the success-path
//! verification scenario built on it.
//!
//! Every call takes explicit [`Credentials`]; the client itself holds no
//! tenant state and can drive several tenants concurrently.

pub mod error;
pub mod fixtures;
pub mod scenario;

pub use error::{ClientError, ClientResult};
pub use fixtures::Fixtures;
pub use scenario::{ScenarioReport, ScenarioRunner, Step, StepOutcome, StepReport};

use log::{debug, error};
use reqwest::{StatusCode, header, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::application::{ApplicationListResponse, ApplicationResponse};
use crate::config::{API_BASE_PATH, TENANT_PATH_SEGMENT};
use crate::server::handlers::UPLOAD_PART;
use crate::tenant::SUPER_TENANT_DOMAIN;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tenant and bearer token sent with a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub tenant: String,
    pub token: String,
}

impl Credentials {
    pub fn new(tenant: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            token: token.into(),
        }
    }

    pub fn is_super_tenant(&self) -> bool {
        self.tenant == SUPER_TENANT_DOMAIN
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant", &self.tenant)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// API client for the application registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// Creates a client for the server at `base_url`, e.g. `https://localhost:9443`.
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Collection URL as seen by the credential's tenant. The root tenant
    /// uses the plain API root.
    pub fn applications_url(&self, credentials: &Credentials) -> String {
        if credentials.is_super_tenant() {
            format!("{}{}/applications", self.base_url, API_BASE_PATH)
        } else {
            format!(
                "{}/{}/{}{}/applications",
                self.base_url,
                TENANT_PATH_SEGMENT,
                urlencoding::encode(&credentials.tenant),
                API_BASE_PATH
            )
        }
    }

    fn application_url(&self, credentials: &Credentials, id: &str) -> String {
        format!(
            "{}/{}",
            self.applications_url(credentials),
            urlencoding::encode(id)
        )
    }

    /// GET /applications
    pub async fn list_applications(
        &self,
        credentials: &Credentials,
    ) -> ClientResult<ApplicationListResponse> {
        const OPERATION: &str = "list applications";
        let response = self
            .client
            .get(self.applications_url(credentials))
            .bearer_auth(&credentials.token)
            .send()
            .await?;
        let response = expect_status(OPERATION, response, StatusCode::OK).await?;
        decode_json(OPERATION, response).await
    }

    /// POST /applications, returning the new identifier.
    pub async fn create_application(
        &self,
        credentials: &Credentials,
        body: &Value,
    ) -> ClientResult<String> {
        const OPERATION: &str = "create application";
        let response = self
            .client
            .post(self.applications_url(credentials))
            .bearer_auth(&credentials.token)
            .json(body)
            .send()
            .await?;
        let response = expect_status(OPERATION, response, StatusCode::CREATED).await?;
        location_id(OPERATION, &response)
    }

    /// POST /applications/import as multipart, returning the new identifier.
    pub async fn import_application(
        &self,
        credentials: &Credentials,
        file_name: &str,
        descriptor: Vec<u8>,
    ) -> ClientResult<String> {
        const OPERATION: &str = "import application";
        let part = multipart::Part::bytes(descriptor)
            .file_name(file_name.to_string())
            .mime_str("application/xml")?;
        let form = multipart::Form::new().part(UPLOAD_PART, part);

        let response = self
            .client
            .post(format!("{}/import", self.applications_url(credentials)))
            .bearer_auth(&credentials.token)
            .multipart(form)
            .send()
            .await?;
        let response = expect_status(OPERATION, response, StatusCode::CREATED).await?;
        location_id(OPERATION, &response)
    }

    /// GET /applications/{id}/export, returning the XML document.
    pub async fn export_application(
        &self,
        credentials: &Credentials,
        id: &str,
    ) -> ClientResult<String> {
        const OPERATION: &str = "export application";
        let response = self
            .client
            .get(format!("{}/export", self.application_url(credentials, id)))
            .bearer_auth(&credentials.token)
            .header(header::ACCEPT, "application/octet-stream")
            .send()
            .await?;
        let response = expect_status(OPERATION, response, StatusCode::OK).await?;
        Ok(response.text().await?)
    }

    /// GET /applications/{id}
    pub async fn get_application(
        &self,
        credentials: &Credentials,
        id: &str,
    ) -> ClientResult<ApplicationResponse> {
        const OPERATION: &str = "get application";
        let response = self.send_get(credentials, id).await?;
        let response = expect_status(OPERATION, response, StatusCode::OK).await?;
        decode_json(OPERATION, response).await
    }

    /// GET /applications/{id}, succeeding only on 404.
    pub async fn expect_not_found(&self, credentials: &Credentials, id: &str) -> ClientResult<()> {
        const OPERATION: &str = "get deleted application";
        let response = self.send_get(credentials, id).await?;
        expect_status(OPERATION, response, StatusCode::NOT_FOUND).await?;
        Ok(())
    }

    /// DELETE /applications/{id}
    pub async fn delete_application(
        &self,
        credentials: &Credentials,
        id: &str,
    ) -> ClientResult<()> {
        const OPERATION: &str = "delete application";
        let response = self
            .client
            .delete(self.application_url(credentials, id))
            .bearer_auth(&credentials.token)
            .send()
            .await?;
        expect_status(OPERATION, response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    async fn send_get(
        &self,
        credentials: &Credentials,
        id: &str,
    ) -> ClientResult<reqwest::Response> {
        Ok(self
            .client
            .get(self.application_url(credentials, id))
            .bearer_auth(&credentials.token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?)
    }
}

/// Identifier at the end of a `Location` URL, ignoring query and fragment.
pub fn extract_application_id(location: &str) -> Option<&str> {
    let path = location.split(['?', '#']).next()?;
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Passes the response through if it has the expected status; otherwise
/// logs the raw body and fails.
async fn expect_status(
    operation: &'static str,
    response: reqwest::Response,
    expected: StatusCode,
) -> ClientResult<reqwest::Response> {
    let actual = response.status();
    if actual == expected {
        debug!("{}: HTTP {}", operation, actual);
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    error!(
        "{}: expected HTTP {}, got {}. Response body: {}",
        operation, expected, actual, body
    );
    Err(ClientError::UnexpectedStatus {
        operation,
        expected: expected.as_u16(),
        actual: actual.as_u16(),
        body,
    })
}

async fn decode_json<T: DeserializeOwned>(
    operation: &'static str,
    response: reqwest::Response,
) -> ClientResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        error!("{}: undecodable response body: {}", operation, text);
        ClientError::Decode {
            operation,
            message: e.to_string(),
        }
    })
}

fn location_id(operation: &'static str, response: &reqwest::Response) -> ClientResult<String> {
    let location = response
        .headers()
        .get(header::LOCATION)
        .ok_or(ClientError::MissingLocation { operation })?
        .to_str()
        .map_err(|e| ClientError::Decode {
            operation,
            message: format!("Location header is not text: {}", e),
        })?;

    let id = extract_application_id(location).ok_or_else(|| ClientError::BlankIdentifier {
        operation,
        location: location.to_string(),
    })?;
    debug!("{}: created '{}'", operation, id);
    Ok(id.to_string())
}
