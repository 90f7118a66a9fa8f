//! HTTP route handlers for the checkout host.
//!
//! # Route Structure
//!
//! ```text
//! GET  /checkout                    - Checkout page (all three components)
//! GET  /checkout/summary            - Order summary fragment
//!
//! # Address selector
//! POST /checkout/address/select     - Select a saved address
//! GET  /checkout/address/new        - New address form fragment
//! POST /checkout/address            - Save and select a new address
//!
//! # Cart rows (return cart_items fragment)
//! POST /checkout/cart/add           - Add a product line
//! POST /checkout/cart/quantity      - Increase / decrease a line
//! POST /checkout/cart/remove        - Remove a line
//!
//! # Coupon form
//! GET  /checkout/coupon             - Coupon form fragment
//! POST /checkout/coupon/edit        - Record code edits (returns messages)
//! POST /checkout/coupon/validate    - Validate and apply (rate limited)
//! POST /checkout/coupon/remove      - Remove the applied coupon
//! ```
//!
//! Mutations that change totals send `HX-Trigger: checkout-updated`; the
//! order summary listens for it and refreshes itself.

pub mod checkout;
pub mod coupon;

use axum::{
    Router,
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
};

use crate::middleware::coupon_rate_limiter;
use crate::state::AppState;

/// Route paths, shared by the router and the action URLs handed to components.
pub mod paths {
    pub const CHECKOUT: &str = "/checkout";
    pub const SUMMARY: &str = "/checkout/summary";
    pub const ADDRESS_SELECT: &str = "/checkout/address/select";
    pub const ADDRESS_NEW: &str = "/checkout/address/new";
    pub const ADDRESS_CREATE: &str = "/checkout/address";
    pub const CART_ADD: &str = "/checkout/cart/add";
    pub const CART_QUANTITY: &str = "/checkout/cart/quantity";
    pub const CART_REMOVE: &str = "/checkout/cart/remove";
    pub const COUPON: &str = "/checkout/coupon";
    pub const COUPON_EDIT: &str = "/checkout/coupon/edit";
    pub const COUPON_VALIDATE: &str = "/checkout/coupon/validate";
    pub const COUPON_REMOVE: &str = "/checkout/coupon/remove";
}

/// Client-side events sent through `HX-Trigger`.
pub mod events {
    /// Totals changed; the order summary re-fetches.
    pub const CHECKOUT_UPDATED: &str = "checkout-updated";
    /// A cart change dropped the applied coupon; the coupon slot re-fetches.
    pub const COUPON_CLEARED: &str = "coupon-cleared";
}

/// HTMX response header that fires client-side events.
pub const HX_TRIGGER: &str = "HX-Trigger";

/// Attach `HX-Trigger` for `events` (if any) to a response.
pub(crate) fn with_triggers(events: &[&str], body: impl IntoResponse) -> Response {
    if events.is_empty() {
        return body.into_response();
    }
    (AppendHeaders([(HX_TRIGGER, events.join(", "))]), body).into_response()
}

/// Coupon validation, behind its own rate limiter.
pub fn coupon_validate_routes() -> Router<AppState> {
    Router::new()
        .route(paths::COUPON_VALIDATE, post(coupon::validate))
        .layer(coupon_rate_limiter())
}

/// Create all checkout routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(paths::CHECKOUT, get(checkout::show))
        .route(paths::SUMMARY, get(checkout::summary))
        // Address selector
        .route(paths::ADDRESS_SELECT, post(checkout::select_address))
        .route(paths::ADDRESS_NEW, get(checkout::new_address))
        .route(paths::ADDRESS_CREATE, post(checkout::create_address))
        // Cart rows
        .route(paths::CART_ADD, post(checkout::add_to_cart))
        .route(paths::CART_QUANTITY, post(checkout::update_quantity))
        .route(paths::CART_REMOVE, post(checkout::remove_from_cart))
        // Coupon form
        .route(paths::COUPON, get(coupon::show))
        .route(paths::COUPON_EDIT, post(coupon::edit))
        .route(paths::COUPON_REMOVE, post(coupon::remove))
        .merge(coupon_validate_routes())
}
