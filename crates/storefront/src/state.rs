//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::CheckoutConfig;
use crate::services::coupons::CouponClientError;
use crate::services::{CouponClient, InFlightRegistry};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds only process-wide resources; per-visitor
/// checkout state lives in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    coupons: CouponClient,
    in_flight: InFlightRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the coupon client cannot be built from the API
    /// configuration.
    pub fn new(config: CheckoutConfig) -> Result<Self, CouponClientError> {
        let coupons = CouponClient::new(&config.api)?;
        // A claim outlives its request by at most the request timeout.
        let in_flight = InFlightRegistry::new(config.api.request_timeout);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                coupons,
                in_flight,
            }),
        })
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    /// Get a reference to the coupon validation client.
    #[must_use]
    pub fn coupons(&self) -> &CouponClient {
        &self.inner.coupons
    }

    /// Get a reference to the in-flight coupon submission registry.
    #[must_use]
    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.inner.in_flight
    }
}
