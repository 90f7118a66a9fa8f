//! Business logic services for the checkout host.
//!
//! # Services
//!
//! - `coupons` - Coupon validation client for the backend API
//! - `in_flight` - One-submission-at-a-time registry for coupon forms

pub mod coupons;
pub mod in_flight;

pub use coupons::{CouponClient, CouponError, CouponValidator, ForwardedCredentials};
pub use in_flight::{InFlightGuard, InFlightRegistry};
