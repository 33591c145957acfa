//! Server configuration and URL generation.
//!
//! [`ServerConfig`] is layered with the `config` crate: built-in defaults,
//! then `config/default.toml`, then `config/local.toml`, then an optional
//! explicit file, then `APP_REGISTRY__*` environment variables.
//! [`LocationConfig`] turns tenant and application identifiers into the
//! absolute URLs returned in `Location` headers.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::application::DEFAULT_PAGE_SIZE;
use crate::tenant::{StaticTenantResolver, TenantContext, TenantPermissions};

/// Versioned API root shared by every tenant.
pub const API_BASE_PATH: &str = "/api/server/v1";

/// Path segment that introduces an explicit tenant, as in `/t/{tenant}/...`.
pub const TENANT_PATH_SEGMENT: &str = "t";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9443;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

const ENV_PREFIX: &str = "APP_REGISTRY";

/// How tenant information appears in generated URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStrategy {
    /// Tenant in the path: `https://host/t/tenant.example.com/api/server/v1/applications/123`
    #[default]
    PathBased,
    /// No tenant information: `https://host/api/server/v1/applications/123`
    SingleTenant,
}

/// Base URL and tenant strategy used to build absolute resource URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationConfig {
    /// Externally visible base URL, without trailing slash
    pub public_base_url: String,
    pub tenant_strategy: TenantStrategy,
}

impl LocationConfig {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into();
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            tenant_strategy: TenantStrategy::default(),
        }
    }

    pub fn with_tenant_strategy(mut self, tenant_strategy: TenantStrategy) -> Self {
        self.tenant_strategy = tenant_strategy;
        self
    }

    /// Absolute URL of the tenant's API root.
    pub fn api_root(&self, tenant_id: &str) -> String {
        match self.tenant_strategy {
            TenantStrategy::PathBased => format!(
                "{}/{}/{}{}",
                self.public_base_url, TENANT_PATH_SEGMENT, tenant_id, API_BASE_PATH
            ),
            TenantStrategy::SingleTenant => format!("{}{}", self.public_base_url, API_BASE_PATH),
        }
    }

    pub fn applications_url(&self, tenant_id: &str) -> String {
        format!("{}/applications", self.api_root(tenant_id))
    }

    /// `Location` of a single application. The identifier is always the
    /// trailing path segment.
    pub fn application_location(&self, tenant_id: &str, application_id: &str) -> String {
        format!("{}/{}", self.applications_url(tenant_id), application_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.public_base_url.starts_with("http://")
            && !self.public_base_url.starts_with("https://")
        {
            return Err(ConfigError::Message(format!(
                "public_base_url must start with http:// or https://, got '{}'",
                self.public_base_url
            )));
        }
        Ok(())
    }
}

/// A bearer token accepted by the server and the tenant it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub token: String,
    pub tenant: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub max_applications: Option<usize>,
}

fn default_client_id() -> String {
    "admin".to_string()
}

impl CredentialConfig {
    pub fn new(token: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            tenant: tenant.into(),
            client_id: default_client_id(),
            read_only: false,
            max_applications: None,
        }
    }

    pub fn tenant_context(&self) -> TenantContext {
        TenantContext::new(&self.tenant, &self.client_id).with_permissions(TenantPermissions {
            read_only: self.read_only,
            max_applications: self.max_applications,
        })
    }
}

/// Runtime configuration of the registry server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL used in `Location` headers. Derived from `host` and `port`
    /// when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub tenant_strategy: TenantStrategy,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub default_page_size: usize,
    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            public_base_url: None,
            tenant_strategy: TenantStrategy::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_page_size: DEFAULT_PAGE_SIZE,
            credentials: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load from the standard locations and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load as [`ServerConfig::load`], with `path` layered above the
    /// standard files. The explicit file must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Builder seeded with the built-in defaults.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as i64)?
            .set_default("default_page_size", DEFAULT_PAGE_SIZE as i64)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn location(&self) -> LocationConfig {
        let base = self
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.bind_address()));
        LocationConfig::new(base).with_tenant_strategy(self.tenant_strategy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Message(
                "default_page_size must be greater than zero".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Message(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let mut tokens = HashSet::new();
        for credential in &self.credentials {
            if credential.token.trim().is_empty() || credential.tenant.trim().is_empty() {
                return Err(ConfigError::Message(
                    "credentials need a non-empty token and tenant".to_string(),
                ));
            }
            if !tokens.insert(credential.token.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate credential token for tenant '{}'",
                    credential.tenant
                )));
            }
        }

        self.location().validate()
    }

    /// Resolver holding every configured credential.
    pub fn tenant_resolver(&self) -> StaticTenantResolver {
        self.credentials
            .iter()
            .fold(StaticTenantResolver::builder(), |builder, credential| {
                builder.with_tenant(credential.token.as_str(), credential.tenant_context())
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantResolver;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<ServerConfig, ConfigError> {
        let config: ServerConfig = ServerConfig::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn defaults_match_the_default_struct() {
        assert_eq!(from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = from_toml(
            r#"
            port = 8080
            public_base_url = "https://registry.example.com/"
            tenant_strategy = "single_tenant"

            [[credentials]]
            token = "root-token"
            tenant = "carbon.super"

            [[credentials]]
            token = "tenant-token"
            tenant = "tenant.example.com"
            read_only = true
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.credentials.len(), 2);
        assert_eq!(config.credentials[0].client_id, "admin");
        assert!(config.credentials[1].tenant_context().permissions.read_only);
        assert_eq!(
            config.location().application_location("carbon.super", "abc"),
            "https://registry.example.com/api/server/v1/applications/abc"
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(from_toml("default_page_size = 0").is_err());
        assert!(from_toml(r#"public_base_url = "ftp://example.com""#).is_err());
        assert!(
            from_toml(
                r#"
                [[credentials]]
                token = "same"
                tenant = "a"
                [[credentials]]
                token = "same"
                tenant = "b"
                "#
            )
            .is_err()
        );
    }

    #[test]
    fn path_based_locations_carry_the_tenant() {
        let location = LocationConfig::new("http://localhost:9443");
        assert_eq!(
            location.application_location("tenant.example.com", "123"),
            "http://localhost:9443/t/tenant.example.com/api/server/v1/applications/123"
        );
        assert_eq!(
            location.applications_url("carbon.super"),
            "http://localhost:9443/t/carbon.super/api/server/v1/applications"
        );
    }

    #[test]
    fn location_defaults_to_bind_address() {
        let config = ServerConfig::default();
        assert_eq!(config.location().public_base_url, "http://127.0.0.1:9443");
    }

    #[tokio::test]
    async fn resolver_contains_configured_credentials() {
        let mut config = ServerConfig::default();
        config.credentials = vec![
            CredentialConfig::new("root-token", "carbon.super"),
            CredentialConfig::new("tenant-token", "tenant.example.com"),
        ];

        let resolver = config.tenant_resolver();
        let context = resolver.resolve_tenant("tenant-token").await.unwrap();
        assert_eq!(context.tenant_id, "tenant.example.com");
        assert!(resolver.resolve_tenant("other").await.is_err());
    }
}
