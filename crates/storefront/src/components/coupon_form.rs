//! Coupon form component.
//!
//! The only checkout component with local state. [`CouponFormState`] holds
//! the code being typed, a loading flag, and the last error/success message;
//! [`CouponForm`] renders that state (or the read-only applied view when the
//! owner has an applied coupon).
//!
//! # Phases
//!
//! ```text
//!            edit                 submit             ok
//!   Idle ───────────► Idle ───────────────► Submitting ──────► Validated
//!    ▲                                          │
//!    │ edit                                     │ err
//!    └──────────────────── Failed ◄─────────────┘
//!
//!   any phase ── owner applies coupon ──► Applied ── remove ──► Idle
//! ```
//!
//! The form never changes cart totals. A successful validation is handed to
//! the owner through the `on_validate` callback; the owner decides whether
//! and how to apply it.

use askama::Template;
use checkout_core::{
    AppliedCoupon, CouponCode, ValidateCouponRequest, ValidateCouponResponse, format_amount,
    normalize_code_input,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ActionUrl;
use crate::services::coupons::{CouponError, CouponValidator, ForwardedCredentials};

/// Where the form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponPhase {
    /// Nothing applied, nothing in flight, no message.
    Idle,
    /// A validation request is in flight.
    Submitting,
    /// The last validation succeeded.
    Validated,
    /// The last validation failed; the code is kept for correction.
    Failed,
    /// The owner has an applied coupon; the form is read-only.
    Applied,
}

/// A submission that could not start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// This form instance already has a validation in flight.
    #[error("a coupon is already being validated")]
    AlreadySubmitting,
}

/// Local state of one coupon form instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponFormState {
    /// Identifies this form instance across requests.
    pub form_id: Uuid,
    /// Upper-cased code text as typed.
    pub code: String,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl Default for CouponFormState {
    fn default() -> Self {
        Self::new()
    }
}

impl CouponFormState {
    /// A fresh, idle form.
    #[must_use]
    pub fn new() -> Self {
        Self {
            form_id: Uuid::new_v4(),
            code: String::new(),
            loading: false,
            error: None,
            success: None,
        }
    }

    /// Current phase, given the owner's applied coupon.
    #[must_use]
    pub const fn phase(&self, applied: Option<&AppliedCoupon>) -> CouponPhase {
        if applied.is_some() {
            CouponPhase::Applied
        } else if self.loading {
            CouponPhase::Submitting
        } else if self.success.is_some() {
            CouponPhase::Validated
        } else if self.error.is_some() {
            CouponPhase::Failed
        } else {
            CouponPhase::Idle
        }
    }

    /// Record an edit to the code field.
    ///
    /// Upper-cases the text and clears both messages, which puts a
    /// Validated or Failed form back to Idle.
    pub fn edit(&mut self, text: &str) {
        self.code = normalize_code_input(text);
        self.error = None;
        self.success = None;
    }

    /// Start a submission.
    ///
    /// Returns the parsed code with `loading` set, or `Ok(None)` when the code
    /// is blank (the missing-code error is recorded and nothing should be sent).
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::AlreadySubmitting`] if a submission is in flight.
    pub fn begin(&mut self, input: &str) -> Result<Option<CouponCode>, SubmitError> {
        if self.loading {
            return Err(SubmitError::AlreadySubmitting);
        }

        self.code = normalize_code_input(input);
        let Ok(code) = CouponCode::parse(input) else {
            self.fail(&CouponError::MissingCode);
            return Ok(None);
        };

        self.loading = true;
        Ok(Some(code))
    }

    /// Finish a submission with the validator's outcome.
    ///
    /// On success the code field is cleared and the coupon to apply is
    /// returned; on failure the code is kept. `loading` is reset either way.
    pub fn finish(
        &mut self,
        code: CouponCode,
        outcome: Result<ValidateCouponResponse, CouponError>,
    ) -> Option<AppliedCoupon> {
        self.loading = false;
        match outcome {
            Ok(response) => {
                self.error = None;
                self.success = Some(success_message(response.discount_amount));
                self.code.clear();
                Some(AppliedCoupon {
                    code,
                    discount_amount: response.discount_amount,
                    final_amount: response.final_amount,
                })
            }
            Err(err) => {
                tracing::info!(error = %err, "Coupon validation failed");
                self.fail(&err);
                None
            }
        }
    }

    /// Validate `input` against `subtotal` and report a success to `on_validate`.
    ///
    /// Blank input fails locally without calling the validator. Otherwise
    /// exactly one validation is issued. `on_validate` is called at most once,
    /// and only on success.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::AlreadySubmitting`] if a submission is in flight.
    pub async fn submit<V, F>(
        &mut self,
        input: &str,
        subtotal: Decimal,
        validator: &V,
        credentials: &ForwardedCredentials,
        on_validate: F,
    ) -> Result<CouponPhase, SubmitError>
    where
        V: CouponValidator,
        F: FnOnce(AppliedCoupon) + Send,
    {
        let Some(code) = self.begin(input)? else {
            return Ok(CouponPhase::Failed);
        };

        let request = ValidateCouponRequest {
            code: code.clone(),
            order_amount: subtotal,
        };
        let outcome = validator.validate(&request, credentials).await;

        Ok(match self.finish(code, outcome) {
            Some(applied) => {
                on_validate(applied);
                CouponPhase::Validated
            }
            None => CouponPhase::Failed,
        })
    }

    /// Turn a success into a failure because the cart changed while the
    /// code was being validated.
    ///
    /// The code is put back so the visitor can apply it to the new subtotal.
    pub fn discard_stale(&mut self, code: &CouponCode) {
        self.code = code.to_string();
        self.success = None;
        self.error = Some(CART_CHANGED_MESSAGE.to_string());
    }

    /// Remove the applied coupon.
    ///
    /// Calls `on_remove` exactly once and clears both messages. No request
    /// is made.
    pub fn remove<F: FnOnce()>(&mut self, on_remove: F) {
        on_remove();
        self.error = None;
        self.success = None;
    }

    fn fail(&mut self, err: &CouponError) {
        self.success = None;
        self.error = Some(err.user_message());
    }
}

/// Shown when a validated discount was computed for an outdated subtotal.
pub const CART_CHANGED_MESSAGE: &str =
    "Your cart changed while the coupon was being checked. Please apply it again.";

/// Success text for a validated discount, e.g. "Coupon applied! You saved $10.00".
#[must_use]
pub fn success_message(discount: Decimal) -> String {
    format!("Coupon applied! You saved ${}", format_amount(discount))
}

/// Read-only view of the applied coupon.
#[derive(Debug, Clone)]
pub struct AppliedCouponView {
    pub code: String,
    pub discount: String,
    pub final_amount: String,
}

impl From<&AppliedCoupon> for AppliedCouponView {
    fn from(coupon: &AppliedCoupon) -> Self {
        Self {
            code: coupon.code.to_string(),
            discount: format!("${}", format_amount(coupon.discount_amount)),
            final_amount: format!("${}", format_amount(coupon.final_amount)),
        }
    }
}

/// Coupon form fragment.
#[derive(Template)]
#[template(path = "components/coupon_form.html")]
pub struct CouponForm {
    pub form_id: String,
    pub code: String,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub applied: Option<AppliedCouponView>,
    pub on_validate: ActionUrl,
    pub on_remove: ActionUrl,
    pub on_edit: ActionUrl,
}

impl CouponForm {
    /// Build the form from its state and the owner's applied coupon.
    #[must_use]
    pub fn new(
        state: &CouponFormState,
        applied: Option<&AppliedCoupon>,
        on_validate: ActionUrl,
        on_remove: ActionUrl,
        on_edit: ActionUrl,
    ) -> Self {
        Self {
            form_id: state.form_id.to_string(),
            code: state.code.clone(),
            loading: state.loading,
            error: state.error.clone(),
            success: state.success.clone(),
            applied: applied.map(AppliedCouponView::from),
            on_validate,
            on_remove,
            on_edit,
        }
    }
}

/// Message area of the coupon form, re-rendered on each edit.
#[derive(Template)]
#[template(path = "components/coupon_messages.html")]
pub struct CouponMessages {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl From<&CouponFormState> for CouponMessages {
    fn from(state: &CouponFormState) -> Self {
        Self {
            error: state.error.clone(),
            success: state.success.clone(),
        }
    }
}
