//! Application state shared across handlers.

use std::sync::Arc;

use crate::blog::{BlogError, BlogStore};
use crate::config::StorefrontConfig;
use crate::sanity::SanityClient;
use crate::shipengine::ShipEngineClient;
use crate::stripe::StripeClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the external clients and configuration. Optional integrations are `None`
/// when their credentials are not configured.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    sanity: SanityClient,
    stripe: Option<StripeClient>,
    shipengine: Option<ShipEngineClient>,
    blog: BlogStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the blog directory exists but cannot be read.
    pub fn new(config: StorefrontConfig) -> Result<Self, BlogError> {
        let sanity = SanityClient::new(&config.sanity);
        let stripe = config.stripe.as_ref().map(StripeClient::new);
        let shipengine = config.shipengine.as_ref().map(ShipEngineClient::new);
        let blog = BlogStore::load(&config.blog_dir)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                sanity,
                stripe,
                shipengine,
                blog,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the content store client.
    #[must_use]
    pub fn sanity(&self) -> &SanityClient {
        &self.inner.sanity
    }

    /// Payment gateway client, if configured.
    #[must_use]
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.inner.stripe.as_ref()
    }

    /// Carrier API client, if configured.
    #[must_use]
    pub fn shipengine(&self) -> Option<&ShipEngineClient> {
        self.inner.shipengine.as_ref()
    }

    #[must_use]
    pub fn blog(&self) -> &BlogStore {
        &self.inner.blog
    }
}
