//! Coupon validation client.
//!
//! Sends `POST {api_base}/coupons/validate` with the visitor's credentials
//! and classifies the outcome. Business rejections (the backend said no) and
//! transport failures (the backend could not be reached) are distinct error
//! kinds with their own user-facing text.

use std::fmt;
use std::future::Future;

use axum::http::{HeaderMap, header};
use checkout_core::{CouponErrorBody, ValidateCouponRequest, ValidateCouponResponse};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tower_sessions::cookie::Cookie;
use url::Url;

use crate::config::ApiConfig;

/// Path of the validation endpoint, relative to the API base URL.
const VALIDATE_PATH: &str = "coupons/validate";

/// Shown when the code field is empty.
pub const MISSING_CODE_MESSAGE: &str = "Please enter a coupon code";

/// Shown when the backend rejects a code without saying why.
pub const FALLBACK_MESSAGE: &str = "Failed to validate coupon";

/// Shown when the backend cannot be reached.
pub const TRANSPORT_MESSAGE: &str = "Could not reach the coupon service. Please try again.";

/// Errors that can occur while validating a coupon.
#[derive(Debug, Error)]
pub enum CouponError {
    /// No code was entered; nothing was sent.
    #[error("coupon code is missing")]
    MissingCode,

    /// The backend answered with a non-success status.
    #[error("coupon rejected ({status}): {}", .message.as_deref().unwrap_or(FALLBACK_MESSAGE))]
    Rejected {
        status: u16,
        /// The `error` field of the response body, if present and non-empty.
        message: Option<String>,
    },

    /// The backend answered 2xx with a body we cannot use.
    #[error("invalid coupon response: {0}")]
    InvalidResponse(String),

    /// The request never completed (connect failure, timeout, reset).
    #[error("coupon service unreachable: {0}")]
    Transport(#[source] reqwest::Error),
}

impl CouponError {
    /// Text displayed in the coupon form for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCode => MISSING_CODE_MESSAGE.to_string(),
            Self::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Rejected { message: None, .. } | Self::InvalidResponse(_) => {
                FALLBACK_MESSAGE.to_string()
            }
            Self::Transport(_) => TRANSPORT_MESSAGE.to_string(),
        }
    }
}

/// Errors building a [`CouponClient`].
#[derive(Debug, Error)]
pub enum CouponClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Visitor credentials forwarded to the backend.
///
/// Holds the incoming `Cookie` (minus the checkout host's own session cookie)
/// and `Authorization` headers. Implements `Debug` manually to redact them.
#[derive(Clone, Default)]
pub struct ForwardedCredentials {
    cookie: Option<SecretString>,
    authorization: Option<SecretString>,
}

impl ForwardedCredentials {
    /// Collect credentials from request headers, dropping `own_cookie`.
    ///
    /// Unparseable cookie pairs are skipped.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, own_cookie: &str) -> Self {
        let cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(std::result::Result::ok)
            .filter(|cookie| cookie.name() != own_cookie)
            .map(|cookie| cookie.stripped().to_string())
            .collect::<Vec<_>>()
            .join("; ");

        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| SecretString::from(value.to_owned()));

        Self {
            cookie: (!cookie.is_empty()).then(|| SecretString::from(cookie)),
            authorization,
        }
    }

    /// Whether there is anything to forward.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cookie.is_none() && self.authorization.is_none()
    }
}

impl fmt::Debug for ForwardedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<SecretString>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ForwardedCredentials")
            .field("cookie", &redact(&self.cookie))
            .field("authorization", &redact(&self.authorization))
            .finish()
    }
}

/// Something that can validate a coupon against an order amount.
///
/// Implemented by [`CouponClient`]; tests substitute their own.
pub trait CouponValidator: Send + Sync {
    /// Validate one coupon. Exactly one backend request per call.
    fn validate(
        &self,
        request: &ValidateCouponRequest,
        credentials: &ForwardedCredentials,
    ) -> impl Future<Output = Result<ValidateCouponResponse, CouponError>> + Send;
}

/// HTTP client for the backend coupon endpoint.
#[derive(Clone)]
pub struct CouponClient {
    client: reqwest::Client,
    validate_url: Url,
}

impl CouponClient {
    /// Create a new coupon client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the endpoint URL
    /// cannot be derived from the base URL.
    pub fn new(config: &ApiConfig) -> Result<Self, CouponClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let validate_url = config.base_url.join(VALIDATE_PATH)?;

        Ok(Self {
            client,
            validate_url,
        })
    }

    /// The full endpoint URL requests are sent to.
    #[must_use]
    pub const fn validate_url(&self) -> &Url {
        &self.validate_url
    }
}

impl CouponValidator for CouponClient {
    #[tracing::instrument(skip(self, credentials), fields(code = %request.code))]
    async fn validate(
        &self,
        request: &ValidateCouponRequest,
        credentials: &ForwardedCredentials,
    ) -> Result<ValidateCouponResponse, CouponError> {
        let mut builder = self.client.post(self.validate_url.clone()).json(request);
        if let Some(cookie) = &credentials.cookie {
            builder = builder.header(header::COOKIE.as_str(), cookie.expose_secret());
        }
        if let Some(authorization) = &credentials.authorization {
            builder = builder.header(header::AUTHORIZATION.as_str(), authorization.expose_secret());
        }

        let response = builder.send().await.map_err(CouponError::Transport)?;
        let status = response.status();

        if !status.is_success() {
            // An unreadable error body still counts as a rejection.
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<CouponErrorBody>(&body)
                .ok()
                .and_then(|body| body.error)
                .filter(|message| !message.trim().is_empty());
            tracing::info!(status = status.as_u16(), ?message, "Coupon rejected");
            return Err(CouponError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(CouponError::Transport)?;
        let validated: ValidateCouponResponse = serde_json::from_slice(&body)
            .map_err(|e| CouponError::InvalidResponse(e.to_string()))?;

        if !validated.is_within(request.order_amount) {
            tracing::warn!(
                discount = %validated.discount_amount,
                order_amount = %request.order_amount,
                "Coupon discount out of range"
            );
            return Err(CouponError::InvalidResponse(format!(
                "discount {} outside 0..={}",
                validated.discount_amount, request.order_amount
            )));
        }

        Ok(validated)
    }
}
