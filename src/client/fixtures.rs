//! Request bodies used by the verification scenario.

use serde_json::Value;

use crate::application::{RESIDENT_APPLICATION_NAME, USER_PORTAL_APPLICATION_NAME};
use crate::tenant::SUPER_TENANT_DOMAIN;

pub const SUPER_TENANT_IMPORT_FILE: &str = "sample-sp-import-super-tenant.xml";
pub const TENANT_IMPORT_FILE: &str = "sample-sp-import-tenant.xml";
pub const CREATE_APPLICATION_FILE: &str = "create-basic-application.json";

const SUPER_TENANT_IMPORT: &str = include_str!("../../resources/sample-sp-import-super-tenant.xml");
const TENANT_IMPORT: &str = include_str!("../../resources/sample-sp-import-tenant.xml");
const CREATE_APPLICATION: &str = include_str!("../../resources/create-basic-application.json");

/// Tenant-specific descriptors and the names they are expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixtures {
    pub import_file_name: &'static str,
    pub import_descriptor: &'static str,
    /// `ApplicationName` inside `import_descriptor`
    pub imported_name: &'static str,
    pub create_body: &'static str,
    /// `name` inside `create_body`
    pub created_name: &'static str,
    pub default_applications: &'static [&'static str],
}

impl Fixtures {
    pub fn for_tenant(tenant: &str) -> Self {
        if tenant == SUPER_TENANT_DOMAIN {
            Self {
                import_file_name: SUPER_TENANT_IMPORT_FILE,
                import_descriptor: SUPER_TENANT_IMPORT,
                imported_name: "SampleApp",
                create_body: CREATE_APPLICATION,
                created_name: "My SAMPLE APP",
                default_applications: &[RESIDENT_APPLICATION_NAME, USER_PORTAL_APPLICATION_NAME],
            }
        } else {
            Self {
                import_file_name: TENANT_IMPORT_FILE,
                import_descriptor: TENANT_IMPORT,
                imported_name: "SampleAppTenant",
                create_body: CREATE_APPLICATION,
                created_name: "My SAMPLE APP",
                default_applications: &[RESIDENT_APPLICATION_NAME],
            }
        }
    }

    pub fn create_payload(&self) -> serde_json::Result<Value> {
        serde_json::from_str(self.create_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DocumentQuery;

    #[test]
    fn descriptors_carry_the_expected_names() {
        for tenant in [SUPER_TENANT_DOMAIN, "tenant.example.com"] {
            let fixtures = Fixtures::for_tenant(tenant);
            assert_eq!(
                DocumentQuery::new(fixtures.import_descriptor)
                    .first_text("ApplicationName")
                    .unwrap()
                    .as_deref(),
                Some(fixtures.imported_name)
            );
            assert_eq!(
                fixtures.create_payload().unwrap()["name"],
                fixtures.created_name
            );
        }
    }

    #[test]
    fn only_the_root_tenant_expects_the_portal() {
        assert!(
            Fixtures::for_tenant(SUPER_TENANT_DOMAIN)
                .default_applications
                .contains(&USER_PORTAL_APPLICATION_NAME)
        );
        assert_eq!(
            Fixtures::for_tenant("tenant.example.com").default_applications,
            &[RESIDENT_APPLICATION_NAME]
        );
    }
}
