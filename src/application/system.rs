//! Built-in applications every tenant carries.

use crate::application::model::{
    AdvancedConfigurations, Application, ApplicationId, ApplicationMeta,
};
use crate::tenant::TenantContext;

/// Name of the resident application present in every tenant.
pub const RESIDENT_APPLICATION_NAME: &str = "LOCAL_SP";

/// Name of the default portal application present in the root tenant.
pub const USER_PORTAL_APPLICATION_NAME: &str = "User Portal";

/// Names of the system applications that must exist in the tenant.
pub fn system_application_names(tenant: &TenantContext) -> &'static [&'static str] {
    if tenant.is_super_tenant() {
        &[RESIDENT_APPLICATION_NAME, USER_PORTAL_APPLICATION_NAME]
    } else {
        &[RESIDENT_APPLICATION_NAME]
    }
}

/// Whether `name` belongs to one of the tenant's system applications and so
/// may not be claimed by a client.
pub fn is_reserved_name(name: &str, tenant: &TenantContext) -> bool {
    system_application_names(tenant).contains(&name)
}

/// Build the stored record for a system application.
pub fn system_application(name: &str) -> Application {
    let (description, access_url, discoverable) = match name {
        USER_PORTAL_APPLICATION_NAME => (
            "Self-service portal for end users",
            Some("/user-portal"),
            true,
        ),
        _ => ("Resident service provider of the tenant", None, false),
    };

    Application {
        id: ApplicationId::generate(),
        name: name.to_string(),
        description: Some(description.to_string()),
        image_url: None,
        access_url: access_url.map(str::to_string),
        template_id: None,
        is_management_app: false,
        advanced_configurations: AdvancedConfigurations {
            discoverable_by_end_users: discoverable,
            ..AdvancedConfigurations::default()
        },
        inbound_protocols: Vec::new(),
        system: true,
        meta: ApplicationMeta::now(),
    }
}
