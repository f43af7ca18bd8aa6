//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::sanity::SanityClient;
use crate::services::auth::{AuthError, LoginThrottle, PasswordStore, TokenKeys};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The password hash is the only mutable part
/// and sits behind its own lock inside [`PasswordStore`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    sanity: SanityClient,
    tokens: TokenKeys,
    password: PasswordStore,
    throttle: LoginThrottle,
}

impl AppState {
    /// Create a new application state, hashing the configured password.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial password cannot be hashed.
    pub fn new(config: AdminConfig) -> Result<Self, AuthError> {
        let sanity = SanityClient::new(&config.sanity);
        let tokens = TokenKeys::new(&config.auth.jwt_secret);
        let password = PasswordStore::new(&config.auth.admin_password)?;
        let throttle = LoginThrottle::new(config.auth.lockout);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                sanity,
                tokens,
                password,
                throttle,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the content store client.
    #[must_use]
    pub fn sanity(&self) -> &SanityClient {
        &self.inner.sanity
    }

    /// Token signing and verification keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    #[must_use]
    pub fn password(&self) -> &PasswordStore {
        &self.inner.password
    }

    /// Failed-login counters per client.
    #[must_use]
    pub fn throttle(&self) -> &LoginThrottle {
        &self.inner.throttle
    }
}
