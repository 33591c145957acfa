//! `ServiceProvider` XML descriptor mapped with `quick_xml`'s serde support.

use serde::{Deserialize, Serialize};

use crate::application::model::non_blank;
use crate::application::{AdvancedConfigurations, Application, ApplicationModel, InboundProtocol};
use crate::descriptor::query::DocumentQuery;
use crate::error::{RegistryResult, ValidationError};

/// Document element of every descriptor.
pub const DESCRIPTOR_ROOT: &str = "ServiceProvider";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Portable application descriptor.
///
/// Elements not listed here are ignored on import. `ApplicationID` is
/// written on export for reference but never trusted on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ServiceProvider")]
pub struct ServiceProviderDescriptor {
    #[serde(rename = "ApplicationID", default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(rename = "ApplicationName", default)]
    pub application_name: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "ImageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "AccessUrl", default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
    #[serde(rename = "TemplateId", default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(rename = "IsManagementApp", default)]
    pub is_management_app: bool,
    #[serde(rename = "IsSaaSApp", default)]
    pub is_saas_app: bool,
    #[serde(rename = "IsDiscoverable", default)]
    pub is_discoverable: bool,
    #[serde(
        rename = "InboundAuthenticationConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inbound_authentication_config: Option<InboundAuthenticationConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundAuthenticationConfig {
    #[serde(rename = "InboundAuthenticationRequestConfigs", default)]
    pub request_configs: InboundAuthenticationRequestConfigs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundAuthenticationRequestConfigs {
    #[serde(rename = "InboundAuthenticationRequestConfig", default)]
    pub configs: Vec<InboundAuthenticationRequestConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundAuthenticationRequestConfig {
    #[serde(rename = "InboundAuthKey", default)]
    pub key: String,
    #[serde(rename = "InboundAuthType", default)]
    pub auth_type: String,
}

impl ServiceProviderDescriptor {
    /// Parse an uploaded descriptor. Any well-formedness or shape problem is
    /// reported as [`ValidationError::MalformedDescriptor`].
    pub fn parse(content: &[u8]) -> RegistryResult<Self> {
        let xml = std::str::from_utf8(content).map_err(|e| {
            ValidationError::malformed_descriptor(format!("descriptor is not UTF-8: {}", e))
        })?;
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);

        match DocumentQuery::new(xml)
            .root_name()
            .map_err(|e| ValidationError::malformed_descriptor(e.to_string()))?
        {
            Some(root) if root == DESCRIPTOR_ROOT => {}
            Some(root) => {
                return Err(ValidationError::malformed_descriptor(format!(
                    "expected <{}> document element, found <{}>",
                    DESCRIPTOR_ROOT, root
                ))
                .into());
            }
            None => {
                return Err(ValidationError::malformed_descriptor("document is empty").into());
            }
        }

        quick_xml::de::from_str(xml)
            .map_err(|e| ValidationError::malformed_descriptor(e.to_string()).into())
    }

    /// Serialize with an XML declaration.
    pub fn to_xml(&self) -> RegistryResult<String> {
        let body = quick_xml::se::to_string(self).map_err(|e| {
            crate::error::RegistryError::internal(format!("failed to serialize descriptor: {}", e))
        })?;
        Ok(format!("{}\n{}", XML_DECLARATION, body))
    }

    /// Creation model for the imported application. The identifier in the
    /// document is discarded.
    pub fn into_model(self) -> ApplicationModel {
        let inbound_protocols = self
            .inbound_authentication_config
            .map(|config| {
                config
                    .request_configs
                    .configs
                    .into_iter()
                    .filter(|c| !c.auth_type.trim().is_empty())
                    .map(|c| InboundProtocol {
                        protocol_type: c.auth_type.trim().to_string(),
                        key: c.key.trim().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        ApplicationModel {
            name: self.application_name,
            description: non_blank(self.description),
            image_url: non_blank(self.image_url),
            access_url: non_blank(self.access_url),
            template_id: non_blank(self.template_id),
            is_management_app: self.is_management_app,
            advanced_configurations: Some(AdvancedConfigurations {
                saas: self.is_saas_app,
                discoverable_by_end_users: self.is_discoverable,
                ..AdvancedConfigurations::default()
            }),
            inbound_protocols,
        }
    }
}

impl From<&Application> for ServiceProviderDescriptor {
    fn from(app: &Application) -> Self {
        let inbound_authentication_config = (!app.inbound_protocols.is_empty()).then(|| {
            InboundAuthenticationConfig {
                request_configs: InboundAuthenticationRequestConfigs {
                    configs: app
                        .inbound_protocols
                        .iter()
                        .map(|p| InboundAuthenticationRequestConfig {
                            key: p.key.clone(),
                            auth_type: p.protocol_type.clone(),
                        })
                        .collect(),
                },
            }
        });

        Self {
            application_id: Some(app.id.to_string()),
            application_name: app.name.clone(),
            description: app.description.clone(),
            image_url: app.image_url.clone(),
            access_url: app.access_url.clone(),
            template_id: app.template_id.clone(),
            is_management_app: app.is_management_app,
            is_saas_app: app.advanced_configurations.saas,
            is_discoverable: app.advanced_configurations.discoverable_by_end_users,
            inbound_authentication_config,
        }
    }
}
