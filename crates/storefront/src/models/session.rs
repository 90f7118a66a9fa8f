//! Session-related types.
//!
//! Keys for data stored in the visitor's session.

/// Session keys for checkout data.
pub mod keys {
    /// Key for the visitor's [`CheckoutState`](super::super::checkout::CheckoutState).
    pub const CHECKOUT: &str = "checkout";
}
