//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::payments::{PaymentError, RazorpayClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the database pool, configuration and
/// the payment gateway client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    payments: RazorpayClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment gateway client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let payments = RazorpayClient::new(&config.razorpay)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
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

    /// Get a reference to the Razorpay client.
    #[must_use]
    pub fn payments(&self) -> &RazorpayClient {
        &self.inner.payments
    }
}
