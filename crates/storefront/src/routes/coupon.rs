//! Coupon form route handlers.
//!
//! The form's local state ([`CouponFormState`](crate::components::CouponFormState))
//! is kept alongside the rest of the checkout in the session. Validation is
//! limited to one request at a time per form instance through the in-flight
//! registry; a second submit while the first is pending answers 409.
//!
//! While a validation is pending, requests that would change the subtotal or
//! the coupon form also answer 409 (see [`ensure_not_validating`]). The
//! validation itself re-reads the session once the backend has answered and
//! only applies the discount if the subtotal is still the one it sent.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use checkout_core::AppliedCoupon;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use super::{events, paths, with_triggers};
use crate::components::{ActionUrl, CouponForm, CouponMessages, CouponPhase, SubmitError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::SESSION_COOKIE_NAME;
use crate::models::CheckoutState;
use crate::services::ForwardedCredentials;
use crate::state::AppState;

/// Coupon form data, posted by both edits and submits.
#[derive(Debug, Deserialize)]
pub struct CouponInput {
    pub form_id: Uuid,
    #[serde(default)]
    pub code: String,
}

/// Build the coupon form for the visitor's checkout.
///
/// `in_flight` marks the form as submitting when another request holds its
/// claim.
pub(crate) fn form_view(checkout: &CheckoutState, in_flight: bool) -> CouponForm {
    let mut form = CouponForm::new(
        &checkout.coupon_form,
        checkout.applied_coupon.as_ref(),
        ActionUrl::new(paths::COUPON_VALIDATE),
        ActionUrl::new(paths::COUPON_REMOVE),
        ActionUrl::new(paths::COUPON_EDIT),
    );
    form.loading |= in_flight;
    form
}

/// Reject input from a form instance that is no longer the visitor's.
fn ensure_current_form(checkout: &CheckoutState, form_id: Uuid) -> Result<()> {
    if checkout.coupon_form.form_id == form_id {
        Ok(())
    } else {
        Err(AppError::Conflict(
            "coupon form is out of date, reload the page".to_string(),
        ))
    }
}

/// Reject a checkout change while the visitor's coupon is being validated.
///
/// The pending validation applies a discount computed for the current
/// subtotal and stores the form state when it finishes.
pub(crate) async fn ensure_not_validating(
    state: &AppState,
    checkout: &CheckoutState,
) -> Result<()> {
    let form_id = checkout.coupon_form.form_id.to_string();
    if state.in_flight().is_claimed(&form_id).await {
        tracing::info!(%form_id, "Rejected checkout change during coupon validation");
        return Err(AppError::Conflict(
            "a coupon is being validated, try again in a moment".to_string(),
        ));
    }
    Ok(())
}

/// Coupon form fragment (HTMX, refreshed on `coupon-cleared`).
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let checkout = CheckoutState::load(&session).await?;
    let in_flight = state
        .in_flight()
        .is_claimed(&checkout.coupon_form.form_id.to_string())
        .await;

    Ok(Html(form_view(&checkout, in_flight).render()?).into_response())
}

/// Record an edit to the code field (HTMX).
///
/// Clears any previous message; returns the message area only so the input
/// keeps focus.
#[instrument(skip(state, session))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<CouponInput>,
) -> Result<Response> {
    let mut checkout = CheckoutState::load(&session).await?;
    ensure_current_form(&checkout, input.form_id)?;
    ensure_not_validating(&state, &checkout).await?;

    checkout.coupon_form.edit(&input.code);
    checkout.save(&session).await?;

    Ok(Html(CouponMessages::from(&checkout.coupon_form).render()?).into_response())
}

/// Validate a coupon against the current subtotal and apply it (HTMX).
///
/// The visitor's cookies (minus our session cookie) and `Authorization`
/// header are forwarded to the backend.
#[instrument(skip(state, session, headers), fields(form_id = %input.form_id))]
pub async fn validate(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(input): Form<CouponInput>,
) -> Result<Response> {
    let checkout = CheckoutState::load(&session).await?;
    ensure_current_form(&checkout, input.form_id)?;

    let Some(guard) = state.in_flight().claim(&input.form_id.to_string()).await else {
        tracing::info!("Rejected concurrent coupon submission");
        return Err(AppError::Conflict(SubmitError::AlreadySubmitting.to_string()));
    };

    let credentials = ForwardedCredentials::from_headers(&headers, SESSION_COOKIE_NAME);
    let sent_subtotal = checkout.subtotal().amount;
    let mut form = checkout.coupon_form;

    let mut validated: Option<AppliedCoupon> = None;
    let outcome = form
        .submit(
            &input.code,
            sent_subtotal,
            state.coupons(),
            &credentials,
            |coupon| validated = Some(coupon),
        )
        .await;
    let mut phase = outcome.map_err(|e| AppError::Conflict(e.to_string()))?;

    // Other requests may have stored changes while the backend was answering.
    session.load().await?;
    let mut checkout = CheckoutState::load(&session).await?;

    if let Some(coupon) = validated {
        if checkout.subtotal().amount == sent_subtotal {
            add_breadcrumb(
                "checkout",
                "Coupon applied",
                Some(&[("code", coupon.code.as_str())]),
            );
            checkout.apply_coupon(coupon);
        } else {
            tracing::warn!(
                code = %coupon.code,
                "Subtotal changed during validation, discount dropped"
            );
            form.discard_stale(&coupon.code);
            phase = CouponPhase::Failed;
        }
    }
    checkout.coupon_form = form;
    checkout.save(&session).await?;
    // Persist before releasing so the next change reads this outcome.
    session.save().await?;
    guard.release().await;

    let fired: &[&str] = if phase == CouponPhase::Validated {
        &[events::CHECKOUT_UPDATED]
    } else {
        &[]
    };
    Ok(with_triggers(fired, Html(form_view(&checkout, false).render()?)))
}

/// Remove the applied coupon (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut checkout = CheckoutState::load(&session).await?;
    ensure_not_validating(&state, &checkout).await?;

    let CheckoutState {
        coupon_form,
        applied_coupon,
        ..
    } = &mut checkout;
    coupon_form.remove(|| {
        if let Some(coupon) = applied_coupon.take() {
            tracing::info!(code = %coupon.code, "Coupon removed");
        }
    });
    checkout.save(&session).await?;

    Ok(with_triggers(
        &[events::CHECKOUT_UPDATED],
        Html(form_view(&checkout, false).render()?),
    ))
}
