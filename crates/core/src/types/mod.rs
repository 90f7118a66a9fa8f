//! Core checkout types.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod coupon;
pub mod id;
pub mod price;
pub mod quantity;

pub use address::Address;
pub use cart::{CartLine, Product, subtotal};
pub use coupon::{
    AppliedCoupon, CouponCode, CouponCodeError, CouponErrorBody, CouponRecord,
    ValidateCouponRequest, ValidateCouponResponse, normalize_code_input,
};
pub use id::*;
pub use price::{CurrencyCode, Price, format_amount};
pub use quantity::{DecrementPolicy, QuantityDirection, UnknownPolicy};
