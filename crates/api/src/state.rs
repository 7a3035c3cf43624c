//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::gateway::{GatewayClient, GatewayError};
use crate::services::mailer::{MailClient, MailError};
use crate::services::tokens::TokenService;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("gateway client: {0}")]
    Gateway(#[from] GatewayError),
    #[error("mail client: {0}")]
    Mail(#[from] MailError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    gateway: GatewayClient,
    mailer: MailClient,
    tokens: TokenService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if a backing HTTP client fails to build.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let gateway = GatewayClient::new(&config.gateway)?;
        let mailer = MailClient::new(&config.mail, &config.client_origin)?;
        let tokens = TokenService::new(&config.session_secret);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                gateway,
                mailer,
                tokens,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn gateway(&self) -> &GatewayClient {
        &self.inner.gateway
    }

    /// Get a reference to the transactional mail client.
    #[must_use]
    pub fn mailer(&self) -> &MailClient {
        &self.inner.mailer
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
