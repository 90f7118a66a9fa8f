//! Request-level errors for the checkout host.
//!
//! Handlers return [`Result<T>`]; [`AppError`] turns into a plain-text
//! response, reporting server-side failures to Sentry on the way out.
//!
//! Coupon validation failures are *not* `AppError`s: they are rendered inline
//! by the coupon form (see [`crate::services::coupons::CouponError`]).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::checkout::CheckoutError;

/// Error type returned by route handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// A checkout state operation referenced something that does not exist,
    /// or would push the cart total out of range.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or incomplete form input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Another request for the same resource is in progress, or the client
    /// posted for a form instance that is no longer current.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(CheckoutError::AmountOutOfRange) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Checkout(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Session(_) | Self::Template(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request failed");
            // Details stay in Sentry and the logs.
            return (status, "Internal server error").into_response();
        }

        tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        (status, self.to_string()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Record a checkout step as a Sentry breadcrumb.
///
/// Shows up in the trail of any later error report from the same hub.
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Coupon applied", Some(&[("code", "SAVE20")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let data = data
        .unwrap_or_default()
        .iter()
        .map(|&(key, value)| {
            (
                key.to_string(),
                serde_json::Value::String(value.to_string()),
            )
        })
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}
