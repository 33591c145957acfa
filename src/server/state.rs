//! Shared state for the HTTP handlers.

use std::sync::Arc;

use crate::application::DEFAULT_PAGE_SIZE;
use crate::config::LocationConfig;
use crate::provider::ApplicationProvider;
use crate::tenant::TenantResolver;

/// Registry provider, credential resolver, and URL settings shared by every
/// request.
pub struct AppState<P, R>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    pub provider: Arc<P>,
    pub resolver: Arc<R>,
    pub location: Arc<LocationConfig>,
    pub default_page_size: usize,
}

// Manual Clone so that P and R need not be Clone
impl<P, R> Clone for AppState<P, R>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            resolver: Arc::clone(&self.resolver),
            location: Arc::clone(&self.location),
            default_page_size: self.default_page_size,
        }
    }
}

impl<P, R> AppState<P, R>
where
    P: ApplicationProvider,
    R: TenantResolver,
{
    pub fn new(provider: P, resolver: R, location: LocationConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            resolver: Arc::new(resolver),
            location: Arc::new(location),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_default_page_size(mut self, default_page_size: usize) -> Self {
        self.default_page_size = default_page_size;
        self
    }
}
