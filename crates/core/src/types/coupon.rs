//! Coupon codes and the coupon validation wire format.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CouponCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponCodeError {
    /// The input is empty or only whitespace.
    #[error("coupon code cannot be empty")]
    Missing,
}

/// A coupon code ready for submission: trimmed and upper-cased.
///
/// ```
/// use checkout_core::CouponCode;
///
/// assert_eq!(CouponCode::parse("  save20 ").unwrap().as_str(), "SAVE20");
/// assert!(CouponCode::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    /// Parse a code from user input.
    ///
    /// # Errors
    ///
    /// Returns [`CouponCodeError::Missing`] if the input is empty after trimming.
    pub fn parse(s: &str) -> Result<Self, CouponCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CouponCodeError::Missing);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CouponCode {
    type Err = CouponCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Upper-case free text as the user types it into the code field.
///
/// Unlike [`CouponCode::parse`] this never rejects and keeps whitespace, so
/// the field echoes what was typed.
#[must_use]
pub fn normalize_code_input(input: &str) -> String {
    input.to_uppercase()
}

/// Body of `POST /coupons/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    pub code: CouponCode,
    #[serde(with = "rust_decimal::serde::float")]
    pub order_amount: Decimal,
}

/// Successful validation response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponResponse {
    pub coupon: CouponRecord,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

impl ValidateCouponResponse {
    /// Check the discount against the amount it was computed for.
    ///
    /// The discount must be non-negative and never exceed the order amount.
    #[must_use]
    pub fn is_within(&self, order_amount: Decimal) -> bool {
        self.discount_amount >= Decimal::ZERO && self.discount_amount <= order_amount
    }
}

/// Coupon record as returned by the backend.
///
/// Only the code is interpreted; everything else is kept opaque.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CouponRecord {
    pub code: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Failure response body. The `error` field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// A validated coupon as handed to the owner of the checkout state.
///
/// Only one coupon is applied at a time; applying another replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: CouponCode,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}
