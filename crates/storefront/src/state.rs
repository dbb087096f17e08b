//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::auth::TokenService;
use crate::services::stripe::{StripeClient, StripeError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    tokens: TokenService,
    stripe: Option<StripeClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Store configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StripeError> {
        let tokens = TokenService::new(&config.auth);
        let stripe = config.stripe.as_ref().map(StripeClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                stripe,
            }),
        })
    }

    /// Get a reference to the store configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the access token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get the Stripe client, if payments are configured.
    #[must_use]
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.inner.stripe.as_ref()
    }
}
