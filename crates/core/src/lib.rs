//! Domain types for the checkout components.
//!
//! Addresses, products and cart lines, prices, coupon codes, and the coupon
//! validation wire format. Nothing here performs I/O; the storefront crate
//! owns sessions, HTTP, and rendering.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
