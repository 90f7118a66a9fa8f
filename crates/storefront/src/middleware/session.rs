//! Session middleware configuration.
//!
//! Checkout state lives in an in-memory tower-sessions store; it is lost on
//! restart, which is acceptable for an unauthenticated cart.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::CheckoutConfig;

/// Session cookie name.
///
/// Never forwarded to the backend API.
pub const SESSION_COOKIE_NAME: &str = "checkout_session";

/// Session expiry time in seconds (1 day).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &CheckoutConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
