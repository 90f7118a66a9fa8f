//! Checkout page, address and cart route handlers.
//!
//! These handlers are the owner the components report to. Each one loads the
//! visitor's [`CheckoutState`] from the session, applies the interaction,
//! stores the state back, and returns the re-rendered fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use checkout_core::{AddressId, Product, ProductId, QuantityDirection};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{coupon, events, paths, with_triggers};
use crate::components::{ActionUrl, AddressSelector, AppliedCouponView, CartItemRow};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::{CheckoutState, NewAddress, QuantityChange};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
///
/// Component fragments are rendered first and embedded as-is.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutPageTemplate {
    pub store_name: String,
    pub address_selector: String,
    pub cart_items: String,
    pub coupon_form: String,
    pub order_summary: String,
    pub coupon_url: &'static str,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub rows: Vec<String>,
}

/// Order summary fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/order_summary.html")]
pub struct OrderSummaryTemplate {
    pub item_count: u32,
    pub subtotal: String,
    pub coupon: Option<AppliedCouponView>,
    pub total: String,
    pub refresh_url: &'static str,
}

/// New address form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/address_form.html")]
pub struct AddressFormTemplate {
    pub action: ActionUrl,
    /// Values to pre-fill, kept when the form is re-rendered with an error.
    pub values: NewAddress,
    pub error: Option<String>,
}

// =============================================================================
// Fragment Builders
// =============================================================================

fn address_selector(checkout: &CheckoutState) -> AddressSelector {
    AddressSelector::new(
        &checkout.addresses,
        checkout.recipient_name.clone(),
        checkout.selected_address_id.as_ref(),
        ActionUrl::new(paths::ADDRESS_SELECT),
        ActionUrl::new(paths::ADDRESS_NEW),
    )
}

fn cart_items(checkout: &CheckoutState) -> Result<CartItemsTemplate> {
    let rows = checkout
        .lines
        .iter()
        .map(|line| {
            CartItemRow::new(
                &line.product,
                line.quantity(),
                ActionUrl::new(paths::CART_QUANTITY),
                ActionUrl::new(paths::CART_REMOVE),
            )
            .render()
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(CartItemsTemplate { rows })
}

fn order_summary(checkout: &CheckoutState) -> OrderSummaryTemplate {
    OrderSummaryTemplate {
        item_count: checkout.item_count(),
        subtotal: checkout.subtotal().display(),
        coupon: checkout.applied_coupon.as_ref().map(AppliedCouponView::from),
        total: checkout.total().display(),
        refresh_url: paths::SUMMARY,
    }
}

/// Cart fragment with the events a cart mutation should fire.
fn cart_response(checkout: &CheckoutState, changed: bool, had_coupon: bool) -> Result<Response> {
    let mut fired = Vec::new();
    if changed {
        fired.push(events::CHECKOUT_UPDATED);
    }
    if had_coupon && checkout.applied_coupon.is_none() {
        fired.push(events::COUPON_CLEARED);
    }
    Ok(with_triggers(&fired, cart_items(checkout)?))
}

// =============================================================================
// Page
// =============================================================================

/// Display the checkout page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CheckoutPageTemplate> {
    let checkout = CheckoutState::load(&session).await?;
    // Stores a fresh state so the coupon form id survives the next request.
    checkout.save(&session).await?;

    let in_flight = state
        .in_flight()
        .is_claimed(&checkout.coupon_form.form_id.to_string())
        .await;

    Ok(CheckoutPageTemplate {
        store_name: state.config().store_name.clone(),
        address_selector: address_selector(&checkout).render()?,
        cart_items: cart_items(&checkout)?.render()?,
        coupon_form: coupon::form_view(&checkout, in_flight).render()?,
        order_summary: order_summary(&checkout).render()?,
        coupon_url: paths::COUPON,
    })
}

/// Order summary fragment (HTMX, refreshed on `checkout-updated`).
#[instrument(skip(session))]
pub async fn summary(session: Session) -> Result<OrderSummaryTemplate> {
    let checkout = CheckoutState::load(&session).await?;
    Ok(order_summary(&checkout))
}

// =============================================================================
// Address Selector
// =============================================================================

/// Select address form data.
#[derive(Debug, Deserialize)]
pub struct SelectAddressForm {
    pub address_id: AddressId,
}

/// Select a saved address (HTMX).
#[instrument(skip(session))]
pub async fn select_address(
    session: Session,
    Form(form): Form<SelectAddressForm>,
) -> Result<Response> {
    let mut checkout = CheckoutState::load(&session).await?;
    checkout.select_address(&form.address_id)?;
    checkout.save(&session).await?;

    tracing::debug!(address_id = %form.address_id, "Address selected");
    Ok(Html(address_selector(&checkout).render()?).into_response())
}

/// New address form fragment (HTMX).
#[instrument(skip(session))]
pub async fn new_address(session: Session) -> Result<AddressFormTemplate> {
    let checkout = CheckoutState::load(&session).await?;
    Ok(AddressFormTemplate {
        action: ActionUrl::new(paths::ADDRESS_CREATE),
        values: NewAddress {
            recipient_name: checkout.recipient_name,
            ..NewAddress::default()
        },
        error: None,
    })
}

/// Save a new address and select it (HTMX).
///
/// A blank required field re-renders the form with an error instead.
#[instrument(skip(session))]
pub async fn create_address(
    session: Session,
    Form(form): Form<NewAddress>,
) -> Result<Response> {
    if let Some(field) = form.missing_field() {
        let template = AddressFormTemplate {
            action: ActionUrl::new(paths::ADDRESS_CREATE),
            error: Some(format!("Please fill in {}", field.replace('_', " "))),
            values: form,
        };
        // Swap the form in place of itself rather than the whole selector.
        return Ok((
            [("HX-Retarget", "#address-form-slot"), ("HX-Reswap", "innerHTML")],
            template,
        )
            .into_response());
    }

    let mut checkout = CheckoutState::load(&session).await?;
    let id = checkout.add_address(form);
    checkout.save(&session).await?;

    tracing::info!(address_id = %id, "Address added");
    Ok(Html(address_selector(&checkout).render()?).into_response())
}

// =============================================================================
// Cart Rows
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: Option<u32>,
}

/// Quantity button form data.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub product_id: ProductId,
    pub direction: QuantityDirection,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Add a product line (HTMX).
///
/// Adding a product already in the cart merges the quantities. A price or
/// quantity that would overflow the subtotal answers 400.
#[instrument(skip(state, session))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    if form.name.trim().is_empty() {
        return Err(AppError::BadRequest("product name is required".to_string()));
    }
    if form.price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }

    let mut checkout = CheckoutState::load(&session).await?;
    coupon::ensure_not_validating(&state, &checkout).await?;
    let had_coupon = checkout.applied_coupon.is_some();
    let product = Product {
        id: form.product_id,
        name: form.name.trim().to_string(),
        price: form.price,
        image: form.image.filter(|url| !url.trim().is_empty()),
    };
    checkout.add_line(product, form.quantity.unwrap_or(1))?;
    checkout.save(&session).await?;

    cart_response(&checkout, true, had_coupon)
}

/// Increase or decrease a line (HTMX).
///
/// Decreasing a line at quantity 1 follows the configured decrement policy.
#[instrument(skip(state, session))]
pub async fn update_quantity(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateQuantityForm>,
) -> Result<Response> {
    let mut checkout = CheckoutState::load(&session).await?;
    coupon::ensure_not_validating(&state, &checkout).await?;
    let had_coupon = checkout.applied_coupon.is_some();
    let change = checkout.update_quantity(
        &form.product_id,
        form.direction,
        state.config().decrement_policy,
    )?;

    let changed = change != QuantityChange::Unchanged;
    if changed {
        checkout.save(&session).await?;
    }
    tracing::debug!(?change, "Quantity button handled");

    cart_response(&checkout, changed, had_coupon)
}

/// Remove a line (HTMX).
#[instrument(skip(state, session))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut checkout = CheckoutState::load(&session).await?;
    coupon::ensure_not_validating(&state, &checkout).await?;
    let had_coupon = checkout.applied_coupon.is_some();
    checkout.remove_line(&form.product_id)?;
    checkout.save(&session).await?;

    cart_response(&checkout, true, had_coupon)
}
