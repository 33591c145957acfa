//! Application records and their JSON representations.
//!
//! [`Application`] is the stored record. The `*Model`, `*Response`, and
//! list types are the wire shapes exchanged over HTTP; the verification
//! client deserializes the same types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{RegistryResult, ValidationError};

/// Maximum length of an application name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Opaque, server-generated application identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Allocate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ApplicationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ApplicationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedConfigurations {
    #[serde(default)]
    pub saas: bool,
    #[serde(default)]
    pub discoverable_by_end_users: bool,
    #[serde(default)]
    pub skip_login_consent: bool,
    #[serde(default)]
    pub skip_logout_consent: bool,
}

/// An inbound authentication protocol bound to the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundProtocol {
    /// Protocol type, e.g. `oauth2` or `samlsso`
    #[serde(rename = "type")]
    pub protocol_type: String,
    /// Client id or issuer the protocol is keyed by
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationMeta {
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl ApplicationMeta {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            last_modified: now,
        }
    }
}

/// Whether the caller may modify the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Access {
    Read,
    Write,
}

/// Stored application record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub is_management_app: bool,
    #[serde(default)]
    pub advanced_configurations: AdvancedConfigurations,
    #[serde(default)]
    pub inbound_protocols: Vec<InboundProtocol>,
    /// Built-in application that always exists and cannot be deleted
    #[serde(default)]
    pub system: bool,
    pub meta: ApplicationMeta,
}

impl Application {
    /// Build a new record from a validated creation model.
    pub fn from_model(model: ApplicationModel) -> RegistryResult<Self> {
        let name = validate_name(&model.name)?;
        Ok(Self {
            id: ApplicationId::generate(),
            name,
            description: non_blank(model.description),
            image_url: non_blank(model.image_url),
            access_url: non_blank(model.access_url),
            template_id: non_blank(model.template_id),
            is_management_app: model.is_management_app,
            advanced_configurations: model.advanced_configurations.unwrap_or_default(),
            inbound_protocols: model.inbound_protocols,
            system: false,
            meta: ApplicationMeta::now(),
        })
    }

    pub fn access(&self) -> Access {
        if self.system { Access::Read } else { Access::Write }
    }
}

/// Creation payload (`POST /applications`). Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationModel {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub is_management_app: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_configurations: Option<AdvancedConfigurations>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inbound_protocols: Vec<InboundProtocol>,
}

impl ApplicationModel {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Detail view returned by `GET /applications/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub is_management_app: bool,
    #[serde(default)]
    pub advanced_configurations: AdvancedConfigurations,
    #[serde(default)]
    pub inbound_protocols: Vec<InboundProtocol>,
    pub access: Access,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApplicationMeta>,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        let access = app.access();
        Self {
            id: app.id.to_string(),
            name: app.name,
            description: app.description,
            image_url: app.image_url,
            access_url: app.access_url,
            template_id: app.template_id,
            is_management_app: app.is_management_app,
            advanced_configurations: app.advanced_configurations,
            inbound_protocols: app.inbound_protocols,
            access,
            meta: Some(app.meta),
        }
    }
}

/// Summary entry in a list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
    pub access: Access,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl ApplicationListItem {
    pub fn new(app: &Application, self_link: String) -> Self {
        Self {
            id: app.id.to_string(),
            name: app.name.clone(),
            description: app.description.clone(),
            image: app.image_url.clone(),
            access_url: app.access_url.clone(),
            access: app.access(),
            self_link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

/// Envelope returned by `GET /applications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListResponse {
    pub total_results: usize,
    pub start_index: usize,
    pub count: usize,
    #[serde(default)]
    pub applications: Vec<ApplicationListItem>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl ApplicationListResponse {
    pub fn contains_name(&self, name: &str) -> bool {
        self.applications.iter().any(|app| app.name == name)
    }
}

/// Trim and validate an application name.
pub fn validate_name(raw: &str) -> RegistryResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::missing("name").into());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong {
            max: MAX_NAME_LENGTH,
        }
        .into());
    }
    Ok(name.to_string())
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use serde_json::json;

    #[test]
    fn model_ignores_unknown_fields() {
        let model: ApplicationModel = serde_json::from_value(json!({
            "name": "My SAMPLE APP",
            "description": "This is the configuration for Pickup application.",
            "claimConfiguration": {"dialect": "LOCAL"},
            "advancedConfigurations": {"discoverableByEndUsers": true}
        }))
        .unwrap();

        assert_eq!(model.name, "My SAMPLE APP");
        assert!(model.advanced_configurations.unwrap().discoverable_by_end_users);
    }

    #[test]
    fn from_model_trims_and_allocates_id() {
        let mut model = ApplicationModel::named("  Pickup  ");
        model.image_url = Some("   ".to_string());

        let app = Application::from_model(model).unwrap();
        assert_eq!(app.name, "Pickup");
        assert!(app.image_url.is_none());
        assert!(!app.id.as_str().is_empty());
        assert_eq!(app.access(), Access::Write);
    }

    #[test]
    fn blank_and_oversized_names_are_rejected() {
        assert!(matches!(
            validate_name("   "),
            Err(RegistryError::Validation(
                ValidationError::MissingRequiredAttribute { .. }
            ))
        ));
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            validate_name(&long),
            Err(RegistryError::Validation(ValidationError::NameTooLong { .. }))
        ));
    }

    #[test]
    fn response_uses_camel_case_and_access() {
        let mut app = Application::from_model(ApplicationModel::named("Pickup")).unwrap();
        app.system = true;

        let value = serde_json::to_value(ApplicationResponse::from(app)).unwrap();
        assert_eq!(value["name"], "Pickup");
        assert_eq!(value["access"], "READ");
        assert_eq!(value["isManagementApp"], false);
        assert!(value["meta"]["lastModified"].is_string());
    }

    #[test]
    fn list_item_serializes_self_link() {
        let app = Application::from_model(ApplicationModel::named("Pickup")).unwrap();
        let item = ApplicationListItem::new(&app, format!("/applications/{}", app.id));

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["self"], format!("/applications/{}", app.id));
        assert_eq!(value["access"], "WRITE");
    }
}
