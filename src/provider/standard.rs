//! Standard application provider implementation with pluggable storage.
//!
//! This provider holds the registry rules (system applications, name
//! uniqueness, tenant limits, descriptor import and export) and delegates
//! persistence to a [`StorageProvider`].
//!
//! # Example Usage
//!
//! ```rust
//! use app_registry::application::{ApplicationModel, ListQuery};
//! use app_registry::provider::{ApplicationProvider, StandardApplicationProvider};
//! use app_registry::storage::InMemoryStorage;
//! use app_registry::tenant::{RequestContext, TenantContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = StandardApplicationProvider::new(InMemoryStorage::new());
//! let context = RequestContext::with_generated_id(TenantContext::super_tenant("admin"));
//!
//! let app = provider
//!     .create_application(ApplicationModel::named("My SAMPLE APP"), &context)
//!     .await?;
//! let page = provider.list_applications(&ListQuery::default(), &context).await?;
//! assert!(page.applications.iter().any(|a| a.id == app.id));
//! # Ok(())
//! # }
//! ```

use log::{debug, info, trace, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::application::system::{is_reserved_name, system_application, system_application_names};
use crate::application::{APPLICATION_RESOURCE_TYPE, Application, ApplicationModel, ListQuery};
use crate::descriptor::ServiceProviderDescriptor;
use crate::error::{RegistryError, RegistryResult, ValidationError};
use crate::provider::{
    ApplicationPage, ApplicationProvider, ExportedDescriptor, VersionedApplication,
};
use crate::storage::{Collection, StorageProvider};
use crate::tenant::{ApplicationOperation, RequestContext};

/// Standard application provider with pluggable storage backend.
///
/// Mutations are serialized behind a single write lock so that the name
/// uniqueness check and the insert cannot interleave. Reads go straight to
/// storage.
#[derive(Debug, Clone)]
pub struct StandardApplicationProvider<S: StorageProvider> {
    storage: S,
    write_lock: Arc<Mutex<()>>,
    // Tenants whose system applications are known to exist
    seeded_tenants: Arc<RwLock<HashSet<String>>>,
}

impl<S: StorageProvider> StandardApplicationProvider<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
            seeded_tenants: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S> StandardApplicationProvider<S>
where
    S: StorageProvider,
    RegistryError: From<S::Error>,
{
    fn collection(tenant_id: &str) -> Collection {
        Collection::new(tenant_id, APPLICATION_RESOURCE_TYPE)
    }

    async fn load(&self, tenant_id: &str, id: &str) -> RegistryResult<Option<Application>> {
        match self.storage.get(&Self::collection(tenant_id).key(id)).await? {
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
            None => Ok(None),
        }
    }

    async fn load_all(&self, tenant_id: &str) -> RegistryResult<Vec<Application>> {
        let records = self.storage.scan(&Self::collection(tenant_id)).await?;

        let mut applications = Vec::with_capacity(records.len());
        for (key, data) in records {
            match serde_json::from_value::<Application>(data) {
                Ok(app) => applications.push(app),
                Err(e) => warn!("Skipping undecodable application record {}: {}", key, e),
            }
        }
        Ok(applications)
    }

    async fn store(&self, tenant_id: &str, app: &Application) -> RegistryResult<()> {
        let data = serde_json::to_value(app)?;
        trace!("Storing application data: {}", data);
        self.storage
            .put(&Self::collection(tenant_id).key(app.id.as_str()), data)
            .await?;
        Ok(())
    }

    async fn name_taken(&self, tenant_id: &str, name: &str) -> RegistryResult<bool> {
        let matches = self
            .storage
            .find_by_field(&Self::collection(tenant_id), "name", name)
            .await?;
        Ok(!matches.is_empty())
    }

    /// Seed the tenant's system applications once. Takes the write lock.
    async fn ensure_system_applications(&self, context: &RequestContext) -> RegistryResult<()> {
        if self.seeded_tenants.read().await.contains(context.tenant_id()) {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        self.seed_locked(context).await
    }

    /// Seed the tenant's system applications. Caller holds the write lock.
    async fn seed_locked(&self, context: &RequestContext) -> RegistryResult<()> {
        let tenant_id = context.tenant_id();
        if self.seeded_tenants.read().await.contains(tenant_id) {
            return Ok(());
        }

        for name in system_application_names(&context.tenant_context) {
            if !self.name_taken(tenant_id, name).await? {
                let app = system_application(name);
                self.store(tenant_id, &app).await?;
                info!(
                    "Seeded system application '{}' ({}) for tenant '{}'",
                    name, app.id, tenant_id
                );
            }
        }

        self.seeded_tenants
            .write()
            .await
            .insert(tenant_id.to_string());
        Ok(())
    }

    /// Insert a new application. Caller holds the write lock.
    async fn insert_locked(
        &self,
        app: Application,
        context: &RequestContext,
    ) -> RegistryResult<Application> {
        let tenant_id = context.tenant_id();

        if is_reserved_name(&app.name, &context.tenant_context) {
            warn!(
                "Rejected reserved application name '{}' in tenant '{}' (request: '{}')",
                app.name, tenant_id, context.request_id
            );
            return Err(ValidationError::ReservedName { name: app.name }.into());
        }

        if self.name_taken(tenant_id, &app.name).await? {
            warn!(
                "Application name '{}' already exists in tenant '{}' (request: '{}')",
                app.name, tenant_id, context.request_id
            );
            return Err(RegistryError::conflict(tenant_id, app.name));
        }

        let permissions = &context.tenant_context.permissions;
        if let Some(max_applications) = permissions.max_applications {
            let current_count = self
                .load_all(tenant_id)
                .await?
                .iter()
                .filter(|a| !a.system)
                .count();
            if !permissions.check_application_limit(current_count) {
                return Err(RegistryError::forbidden(format!(
                    "Application limit exceeded: {}/{}",
                    current_count, max_applications
                )));
            }
        }

        self.store(tenant_id, &app).await?;
        debug!("Stored application '{}' with ID '{}'", app.name, app.id);
        Ok(app)
    }
}

impl<S> ApplicationProvider for StandardApplicationProvider<S>
where
    S: StorageProvider,
    RegistryError: From<S::Error>,
{
    async fn list_applications(
        &self,
        query: &ListQuery,
        context: &RequestContext,
    ) -> RegistryResult<ApplicationPage> {
        debug!(
            "Listing applications for tenant '{}' (request: '{}')",
            context.tenant_id(),
            context.request_id
        );
        context.validate_operation(ApplicationOperation::List)?;
        self.ensure_system_applications(context).await?;

        let mut applications = self.load_all(context.tenant_id()).await?;
        if let Some(filter) = &query.filter {
            applications.retain(|app| filter.matches(&app.name));
        }
        applications.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let total_results = applications.len();
        let applications: Vec<Application> = applications
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        trace!(
            "Returning {} of {} applications",
            applications.len(),
            total_results
        );

        Ok(ApplicationPage {
            total_results,
            offset: query.offset,
            limit: query.limit,
            applications,
        })
    }

    async fn create_application(
        &self,
        model: ApplicationModel,
        context: &RequestContext,
    ) -> RegistryResult<Application> {
        info!(
            "Creating application '{}' for tenant '{}' (request: '{}')",
            model.name.trim(),
            context.tenant_id(),
            context.request_id
        );
        context.validate_operation(ApplicationOperation::Create)?;

        let app = Application::from_model(model)?;

        let _guard = self.write_lock.lock().await;
        self.seed_locked(context).await?;
        self.insert_locked(app, context).await
    }

    async fn import_application(
        &self,
        content: &[u8],
        context: &RequestContext,
    ) -> RegistryResult<Application> {
        info!(
            "Importing application descriptor ({} bytes) for tenant '{}' (request: '{}')",
            content.len(),
            context.tenant_id(),
            context.request_id
        );
        context.validate_operation(ApplicationOperation::Import)?;

        let descriptor = ServiceProviderDescriptor::parse(content).inspect_err(|e| {
            warn!(
                "Rejected descriptor for tenant '{}' (request: '{}'): {}",
                context.tenant_id(),
                context.request_id,
                e
            )
        })?;
        if let Some(ignored) = &descriptor.application_id {
            debug!("Ignoring ApplicationID '{}' in imported descriptor", ignored);
        }
        let app = Application::from_model(descriptor.into_model())?;

        let _guard = self.write_lock.lock().await;
        self.seed_locked(context).await?;
        let app = self.insert_locked(app, context).await?;
        info!(
            "Imported application '{}' as '{}' in tenant '{}'",
            app.name,
            app.id,
            context.tenant_id()
        );
        Ok(app)
    }

    async fn get_application(
        &self,
        id: &str,
        context: &RequestContext,
    ) -> RegistryResult<VersionedApplication> {
        debug!(
            "Getting application with ID '{}' for tenant '{}' (request: '{}')",
            id,
            context.tenant_id(),
            context.request_id
        );
        context.validate_operation(ApplicationOperation::Read)?;
        self.ensure_system_applications(context).await?;

        match self.load(context.tenant_id(), id).await? {
            Some(app) => VersionedApplication::new(app),
            None => {
                debug!("Application not found");
                Err(RegistryError::not_found(context.tenant_id(), id))
            }
        }
    }

    async fn delete_application(&self, id: &str, context: &RequestContext) -> RegistryResult<()> {
        info!(
            "Deleting application with ID '{}' for tenant '{}' (request: '{}')",
            id,
            context.tenant_id(),
            context.request_id
        );
        context.validate_operation(ApplicationOperation::Delete)?;

        let tenant_id = context.tenant_id();
        let _guard = self.write_lock.lock().await;
        self.seed_locked(context).await?;

        let app = self
            .load(tenant_id, id)
            .await?
            .ok_or_else(|| RegistryError::not_found(tenant_id, id))?;
        if app.system {
            warn!(
                "Refusing to delete system application '{}' in tenant '{}'",
                app.name, tenant_id
            );
            return Err(RegistryError::forbidden(format!(
                "System application '{}' cannot be deleted",
                app.name
            )));
        }

        if !self.storage.delete(&Self::collection(tenant_id).key(id)).await? {
            return Err(RegistryError::not_found(tenant_id, id));
        }
        debug!("Deleted application '{}'", app.name);
        Ok(())
    }

    async fn export_application(
        &self,
        id: &str,
        context: &RequestContext,
    ) -> RegistryResult<ExportedDescriptor> {
        debug!(
            "Exporting application with ID '{}' for tenant '{}' (request: '{}')",
            id,
            context.tenant_id(),
            context.request_id
        );
        context.validate_operation(ApplicationOperation::Export)?;
        self.ensure_system_applications(context).await?;

        let app = self
            .load(context.tenant_id(), id)
            .await?
            .ok_or_else(|| RegistryError::not_found(context.tenant_id(), id))?;
        let content = ServiceProviderDescriptor::from(&app).to_xml()?;
        trace!("Exported descriptor: {}", content);
        Ok(ExportedDescriptor::new(&app.name, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        NameFilter, RESIDENT_APPLICATION_NAME, USER_PORTAL_APPLICATION_NAME,
    };
    use crate::descriptor::DocumentQuery;
    use crate::storage::InMemoryStorage;
    use crate::tenant::{TenantContext, TenantPermissions};

    const TENANT: &str = "tenant.example.com";

    fn provider() -> StandardApplicationProvider<InMemoryStorage> {
        StandardApplicationProvider::new(InMemoryStorage::new())
    }

    fn root() -> RequestContext {
        RequestContext::with_generated_id(TenantContext::super_tenant("admin"))
    }

    fn tenant() -> RequestContext {
        RequestContext::with_generated_id(TenantContext::new(TENANT, "admin"))
    }

    fn descriptor(name: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceProvider>
    <ApplicationID>999</ApplicationID>
    <ApplicationName>{}</ApplicationName>
    <Description>imported</Description>
</ServiceProvider>"#,
            name
        )
    }

    fn names(page: &ApplicationPage) -> Vec<&str> {
        page.applications.iter().map(|a| a.name.as_str()).collect()
    }

    #[tokio::test]
    async fn system_applications_are_listed_per_tenant() {
        let provider = provider();

        let page = provider
            .list_applications(&ListQuery::default(), &root())
            .await
            .unwrap();
        assert_eq!(
            names(&page),
            vec![RESIDENT_APPLICATION_NAME, USER_PORTAL_APPLICATION_NAME]
        );

        let page = provider
            .list_applications(&ListQuery::default(), &tenant())
            .await
            .unwrap();
        assert_eq!(names(&page), vec![RESIDENT_APPLICATION_NAME]);
    }

    #[tokio::test]
    async fn seeding_happens_once() {
        let provider = provider();
        for _ in 0..3 {
            provider
                .list_applications(&ListQuery::default(), &root())
                .await
                .unwrap();
        }
        let stats = provider.storage().stats().await;
        assert_eq!(stats.records, 2);
    }

    #[tokio::test]
    async fn create_get_delete_lifecycle() {
        let provider = provider();
        let ctx = root();

        let created = provider
            .create_application(ApplicationModel::named("My SAMPLE APP"), &ctx)
            .await
            .unwrap();

        let fetched = provider
            .get_application(created.id.as_str(), &ctx)
            .await
            .unwrap();
        assert_eq!(fetched.application.name, "My SAMPLE APP");
        assert!(fetched.version.to_etag().starts_with("W/"));

        provider
            .delete_application(created.id.as_str(), &ctx)
            .await
            .unwrap();

        let err = provider
            .get_application(created.id.as_str(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));

        let err = provider
            .delete_application(created.id.as_str(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_and_reserved_names_are_rejected() {
        let provider = provider();
        let ctx = root();

        provider
            .create_application(ApplicationModel::named("Pickup"), &ctx)
            .await
            .unwrap();
        let err = provider
            .create_application(ApplicationModel::named(" Pickup "), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));

        let err = provider
            .create_application(ApplicationModel::named(RESIDENT_APPLICATION_NAME), &tenant())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::ReservedName { .. })
        ));

        // The portal is only a system application in the root tenant
        let err = provider
            .create_application(ApplicationModel::named(USER_PORTAL_APPLICATION_NAME), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::ReservedName { .. })
        ));
        provider
            .create_application(ApplicationModel::named(USER_PORTAL_APPLICATION_NAME), &tenant())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn system_applications_cannot_be_deleted() {
        let provider = provider();
        let ctx = root();

        let page = provider
            .list_applications(&ListQuery::default(), &ctx)
            .await
            .unwrap();
        for app in &page.applications {
            let err = provider
                .delete_application(app.id.as_str(), &ctx)
                .await
                .unwrap_err();
            assert!(matches!(err, RegistryError::Forbidden { .. }));
        }

        let page = provider
            .list_applications(&ListQuery::default(), &ctx)
            .await
            .unwrap();
        assert_eq!(page.total_results, 2);
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let provider = provider();
        let created = provider
            .create_application(ApplicationModel::named("Shared Name"), &root())
            .await
            .unwrap();

        let err = provider
            .get_application(created.id.as_str(), &tenant())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));

        // Same name is free in another tenant
        provider
            .create_application(ApplicationModel::named("Shared Name"), &tenant())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_filters_sorts_and_paginates() {
        let provider = provider();
        let ctx = tenant();
        for name in ["Charlie", "alpha", "Bravo", "Beta"] {
            provider
                .create_application(ApplicationModel::named(name), &ctx)
                .await
                .unwrap();
        }

        let query = ListQuery::default().with_filter(NameFilter::parse("name sw B").unwrap());
        let page = provider.list_applications(&query, &ctx).await.unwrap();
        assert_eq!(names(&page), vec!["Beta", "Bravo"]);

        let query = ListQuery::default().with_page(1, 2);
        let page = provider.list_applications(&query, &ctx).await.unwrap();
        assert_eq!(page.total_results, 5);
        assert_eq!(names(&page), vec!["Bravo", "Charlie"]);
        assert!(page.has_next());
        assert!(page.has_previous());
    }

    #[tokio::test]
    async fn import_ignores_descriptor_id_and_exports_name() {
        let provider = provider();
        let ctx = root();

        let imported = provider
            .import_application(descriptor("SampleApp").as_bytes(), &ctx)
            .await
            .unwrap();
        assert_ne!(imported.id.as_str(), "999");
        assert_eq!(imported.description.as_deref(), Some("imported"));

        let export = provider
            .export_application(imported.id.as_str(), &ctx)
            .await
            .unwrap();
        assert_eq!(export.file_name, "SampleApp.xml");
        assert_eq!(
            DocumentQuery::new(&export.content)
                .first_text("ApplicationName")
                .unwrap()
                .as_deref(),
            Some("SampleApp")
        );

        let err = provider
            .import_application(descriptor("SampleApp").as_bytes(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn malformed_imports_are_validation_errors() {
        let provider = provider();
        let ctx = tenant();

        for content in [
            "not xml at all".to_string(),
            "<ServiceProvider><ApplicationName>x</Wrong></ServiceProvider>".to_string(),
            descriptor("   "),
        ] {
            let err = provider
                .import_application(content.as_bytes(), &ctx)
                .await
                .unwrap_err();
            assert!(
                matches!(err, RegistryError::Validation(_)),
                "unexpected error for {:?}: {}",
                content,
                err
            );
        }
    }

    #[tokio::test]
    async fn read_only_credentials_cannot_mutate() {
        let provider = provider();
        let ctx = RequestContext::with_generated_id(
            TenantContext::new(TENANT, "auditor").with_permissions(TenantPermissions::read_only()),
        );

        assert!(provider
            .list_applications(&ListQuery::default(), &ctx)
            .await
            .is_ok());
        let err = provider
            .create_application(ApplicationModel::named("Pickup"), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn application_limit_excludes_system_applications() {
        let provider = provider();
        let ctx = RequestContext::with_generated_id(
            TenantContext::super_tenant("admin").with_permissions(TenantPermissions {
                read_only: false,
                max_applications: Some(1),
            }),
        );

        provider
            .create_application(ApplicationModel::named("First"), &ctx)
            .await
            .unwrap();
        let err = provider
            .create_application(ApplicationModel::named("Second"), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Forbidden { .. }));
    }
}
