//! Domain models for the checkout host.
//!
//! - `checkout` - Parent-owned checkout state (addresses, cart lines, coupon)
//! - `session` - Session keys

pub mod checkout;
pub mod session;

pub use checkout::{CheckoutError, CheckoutState, NewAddress, QuantityChange};
pub use session::keys as session_keys;
