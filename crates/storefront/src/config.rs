//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKOUT_API_BASE_URL` - Base URL of the backend API (coupon validation)
//! - `CHECKOUT_BASE_URL` - Public URL for the checkout pages
//!
//! ## Optional
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_REQUEST_TIMEOUT_SECS` - Outbound request timeout, at least 1 (default: 10)
//! - `CHECKOUT_DECREMENT_POLICY` - `ignore` or `remove` (default: ignore)
//! - `CHECKOUT_STORE_NAME` - Store name shown in the page title
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use checkout_core::DecrementPolicy;
use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORE_NAME: &str = "Checkout";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout application configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the checkout pages
    pub base_url: String,
    /// Store name used in page titles
    pub store_name: String,
    /// Backend API configuration
    pub api: ApiConfig,
    /// What decreasing a line at quantity 1 does
    pub decrement_policy: DecrementPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it
    pub base_url: Url,
    /// Timeout applied to every outbound request
    pub request_timeout: Duration,
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is fine; real deployments set the variables directly.
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: parse_env("CHECKOUT_HOST", "127.0.0.1")?,
            port: parse_env("CHECKOUT_PORT", "3000")?,
            base_url: required_env("CHECKOUT_BASE_URL")?,
            store_name: env_or("CHECKOUT_STORE_NAME", DEFAULT_STORE_NAME),
            api: ApiConfig::from_env()?,
            decrement_policy: parse_env("CHECKOUT_DECREMENT_POLICY", "ignore")?,
            sentry_dsn: optional_env("SENTRY_DSN"),
            sentry_environment: optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parse_env(
            "CHECKOUT_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            base_url: parse_api_base_url(&required_env("CHECKOUT_API_BASE_URL")?)?,
            request_timeout: request_timeout(timeout_secs)?,
        })
    }
}

/// Outbound request timeout; zero is rejected.
fn request_timeout(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "CHECKOUT_REQUEST_TIMEOUT_SECS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

// =============================================================================
// Environment Access
// =============================================================================

/// Parse and check the backend base URL.
///
/// Only http(s) URLs are accepted. A trailing slash is added so that joining
/// `coupons/validate` keeps any path prefix (e.g. `/api`).
fn parse_api_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("CHECKOUT_API_BASE_URL".to_string(), msg);

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Unset and empty are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Read `key` (or `default`) and parse it into `T`.
fn parse_env<T>(key: &str, default: impl ToString) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, &default.to_string())
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_url_gets_trailing_slash() {
        let url = parse_api_base_url("https://api.example.com/api").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/");
        assert_eq!(
            url.join("coupons/validate").unwrap().as_str(),
            "https://api.example.com/api/coupons/validate"
        );
    }

    #[test]
    fn test_api_base_url_root() {
        let url = parse_api_base_url("http://localhost:5000").unwrap();
        assert_eq!(
            url.join("coupons/validate").unwrap().as_str(),
            "http://localhost:5000/coupons/validate"
        );
    }

    #[test]
    fn test_api_base_url_rejects_other_schemes() {
        assert!(matches!(
            parse_api_base_url("ftp://example.com"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_api_base_url("not a url").is_err());
    }

    #[test]
    fn test_request_timeout_must_be_positive() {
        assert_eq!(request_timeout(1).unwrap(), Duration::from_secs(1));
        assert_eq!(request_timeout(30).unwrap(), Duration::from_secs(30));

        let err = request_timeout(0).unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::InvalidEnvVar(key, _) if key == "CHECKOUT_REQUEST_TIMEOUT_SECS"
        ));
        assert!(err.to_string().contains("must be at least 1"));
    }

    #[test]
    fn test_socket_addr() {
        let config = CheckoutConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://shop.example.com".to_string(),
            store_name: "Test".to_string(),
            api: ApiConfig {
                base_url: parse_api_base_url("http://localhost:5000").unwrap(),
                request_timeout: Duration::from_secs(10),
            },
            decrement_policy: DecrementPolicy::Ignore,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(config.is_secure());
    }
}
