//! Parent-owned checkout state.
//!
//! `CheckoutState` is the single source of truth for a visitor's checkout:
//! saved addresses and the current selection, cart lines, the applied coupon,
//! and the coupon form's local state. Components only render it; route
//! handlers mutate it in response to component actions and store it back in
//! the session.

use checkout_core::{
    Address, AddressId, AppliedCoupon, CartLine, DecrementPolicy, Price, Product, ProductId,
    QuantityDirection, subtotal,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use uuid::Uuid;

use super::session::keys;
use crate::components::CouponFormState;

/// Errors from checkout state operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No saved address has this id.
    #[error("unknown address: {0}")]
    UnknownAddress(AddressId),

    /// No cart line holds this product.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// The change would push a line total or the subtotal past what a
    /// decimal amount can hold.
    #[error("cart total out of range")]
    AmountOutOfRange,
}

/// Fields for a new address; the id is assigned on insert.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAddress {
    /// Replaces the recipient name when non-blank.
    #[serde(default)]
    pub recipient_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

impl NewAddress {
    /// Name of the first required field left blank, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
            ("zip_code", &self.zip_code),
        ]
        .into_iter()
        .find_map(|(name, value)| value.trim().is_empty().then_some(name))
    }
}

/// Result of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now has this quantity.
    Updated(u32),
    /// The line was at 1 and the policy left it there.
    Unchanged,
    /// The line was at 1 and the policy removed it.
    Removed,
}

/// A visitor's checkout, stored in the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutState {
    /// Name shown as the recipient on each address.
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub selected_address_id: Option<AddressId>,
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub applied_coupon: Option<AppliedCoupon>,
    #[serde(default)]
    pub coupon_form: CouponFormState,
}

impl CheckoutState {
    // =========================================================================
    // Session persistence
    // =========================================================================

    /// Load the checkout from the session, or start an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<Self>(keys::CHECKOUT)
            .await?
            .unwrap_or_default())
    }

    /// Store the checkout in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::CHECKOUT, self).await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Make `id` the selected address.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownAddress`] if no saved address has `id`.
    pub fn select_address(&mut self, id: &AddressId) -> Result<(), CheckoutError> {
        if !self.addresses.iter().any(|address| &address.id == id) {
            return Err(CheckoutError::UnknownAddress(id.clone()));
        }
        self.selected_address_id = Some(id.clone());
        Ok(())
    }

    /// Save a new address and select it.
    pub fn add_address(&mut self, new: NewAddress) -> AddressId {
        let recipient = new.recipient_name.trim();
        if !recipient.is_empty() {
            self.recipient_name = recipient.to_string();
        }

        let id = AddressId::new(Uuid::new_v4().to_string());
        self.addresses.push(Address {
            id: id.clone(),
            street: new.street.trim().to_string(),
            city: new.city.trim().to_string(),
            state: new.state.trim().to_string(),
            country: new.country.trim().to_string(),
            zip_code: new.zip_code.trim().to_string(),
        });
        self.selected_address_id = Some(id.clone());
        id
    }

    /// The selected address, if any.
    #[must_use]
    pub fn selected_address(&self) -> Option<&Address> {
        let id = self.selected_address_id.as_ref()?;
        self.addresses.iter().find(|address| &address.id == id)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `quantity` of `product`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AmountOutOfRange`] if the resulting subtotal
    /// would overflow; the cart is left unchanged.
    pub fn add_line(&mut self, product: Product, quantity: u32) -> Result<(), CheckoutError> {
        let quantity = quantity.max(1);
        let mut lines = self.lines.clone();
        match lines.iter_mut().find(|line| line.product.id == product.id) {
            Some(line) => {
                let merged = line.quantity().saturating_add(quantity);
                *line = CartLine::new(product, merged);
            }
            None => lines.push(CartLine::new(product, quantity)),
        }
        if subtotal(&lines).is_none() {
            return Err(CheckoutError::AmountOutOfRange);
        }

        self.lines = lines;
        self.subtotal_changed();
        Ok(())
    }

    /// Apply a quantity button press.
    ///
    /// Decreasing a line at 1 is resolved by `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownProduct`] if no line holds `product_id`,
    /// or [`CheckoutError::AmountOutOfRange`] if increasing would overflow the
    /// subtotal (the quantity is left as it was).
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        direction: QuantityDirection,
        policy: DecrementPolicy,
    ) -> Result<QuantityChange, CheckoutError> {
        let line = self
            .line_mut(product_id)
            .ok_or_else(|| CheckoutError::UnknownProduct(product_id.clone()))?;

        let change = match direction {
            QuantityDirection::Increase => {
                line.increment();
                let quantity = line.quantity();
                if subtotal(&self.lines).is_none() {
                    if let Some(line) = self.line_mut(product_id) {
                        line.decrement();
                    }
                    return Err(CheckoutError::AmountOutOfRange);
                }
                QuantityChange::Updated(quantity)
            }
            QuantityDirection::Decrease if line.decrement() => {
                QuantityChange::Updated(line.quantity())
            }
            QuantityDirection::Decrease => match policy {
                DecrementPolicy::Ignore => QuantityChange::Unchanged,
                DecrementPolicy::Remove => {
                    self.lines.retain(|line| &line.product.id != product_id);
                    QuantityChange::Removed
                }
            },
        };

        if change != QuantityChange::Unchanged {
            self.subtotal_changed();
        }
        Ok(change)
    }

    /// Remove the line holding `product_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownProduct`] if no line holds `product_id`.
    pub fn remove_line(&mut self, product_id: &ProductId) -> Result<(), CheckoutError> {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product.id != product_id);
        if self.lines.len() == before {
            return Err(CheckoutError::UnknownProduct(product_id.clone()));
        }
        self.subtotal_changed();
        Ok(())
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.product.id == product_id)
    }

    /// Total item count across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity()))
    }

    // =========================================================================
    // Totals and coupon
    // =========================================================================

    /// Sum of line totals.
    ///
    /// `add_line` and `update_quantity` refuse changes that would overflow,
    /// so the saturated fallback is never shown for a cart built through them.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        subtotal(&self.lines).unwrap_or_else(|| Price::usd(Decimal::MAX))
    }

    /// Amount due: the coupon's final amount when one is applied.
    #[must_use]
    pub fn total(&self) -> Price {
        let subtotal = self.subtotal();
        match &self.applied_coupon {
            Some(coupon) => Price::new(coupon.final_amount, subtotal.currency_code),
            None => subtotal,
        }
    }

    /// Apply a validated coupon, replacing any previous one.
    pub fn apply_coupon(&mut self, coupon: AppliedCoupon) {
        if let Some(previous) = self.applied_coupon.replace(coupon) {
            tracing::debug!(code = %previous.code, "Replaced applied coupon");
        }
    }

    /// The coupon's amounts were computed for the old subtotal; it has to be
    /// validated again.
    fn subtotal_changed(&mut self) {
        if let Some(coupon) = self.applied_coupon.take() {
            tracing::info!(code = %coupon.code, "Cart changed, cleared applied coupon");
            self.coupon_form.success = None;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use checkout_core::CouponCode;
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::new(cents, 2),
            image: None,
        }
    }

    fn new_address(street: &str) -> NewAddress {
        NewAddress {
            recipient_name: String::new(),
            street: street.to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            country: "US".to_string(),
            zip_code: "73301".to_string(),
        }
    }

    fn coupon() -> AppliedCoupon {
        AppliedCoupon {
            code: CouponCode::parse("SAVE10").unwrap(),
            discount_amount: Decimal::new(10, 0),
            final_amount: Decimal::new(90, 0),
        }
    }

    #[test]
    fn test_add_address_selects_it() {
        let mut state = CheckoutState::default();
        let first = state.add_address(new_address("1 Oak St"));
        let second = state.add_address(new_address("2 Elm St"));

        assert_eq!(state.selected_address_id, Some(second));
        state.select_address(&first).unwrap();
        assert_eq!(state.selected_address().unwrap().street, "1 Oak St");
    }

    #[test]
    fn test_add_address_sets_recipient_when_given() {
        let mut state = CheckoutState::default();
        state.add_address(new_address("1 Oak St"));
        assert_eq!(state.recipient_name, "");

        let mut named = new_address("2 Elm St");
        named.recipient_name = "  Ada Lovelace ".to_string();
        state.add_address(named);
        assert_eq!(state.recipient_name, "Ada Lovelace");
    }

    #[test]
    fn test_missing_field_reports_first_blank() {
        let mut address = new_address("1 Oak St");
        assert_eq!(address.missing_field(), None);

        address.city = "  ".to_string();
        address.zip_code = String::new();
        assert_eq!(address.missing_field(), Some("city"));
    }

    #[test]
    fn test_select_unknown_address_fails() {
        let mut state = CheckoutState::default();
        let err = state.select_address(&AddressId::new("nope")).unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownAddress(_)));
        assert!(state.selected_address_id.is_none());
    }

    #[test]
    fn test_add_line_merges_same_product() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 500), 1).unwrap();
        state.add_line(product("p1", 500), 2).unwrap();
        state.add_line(product("p2", 250), 1).unwrap();

        assert_eq!(state.lines.len(), 2);
        assert_eq!(state.lines[0].quantity(), 3);
        assert_eq!(state.item_count(), 4);
        assert_eq!(state.subtotal().display(), "$17.50");
    }

    #[test]
    fn test_add_line_rejects_overflowing_subtotal() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 500), 1).unwrap();
        state.apply_coupon(coupon());

        let huge = Product {
            price: Decimal::MAX,
            ..product("p2", 0)
        };
        let err = state.add_line(huge.clone(), 2).unwrap_err();
        assert!(matches!(err, CheckoutError::AmountOutOfRange));
        // A single MAX line fits on its own but not beside the first line.
        assert!(matches!(
            state.add_line(huge, 1),
            Err(CheckoutError::AmountOutOfRange)
        ));

        assert_eq!(state.lines.len(), 1);
        assert_eq!(state.subtotal().display(), "$5.00");
        assert!(state.applied_coupon.is_some());
    }

    #[test]
    fn test_increase_past_range_keeps_quantity() {
        let mut state = CheckoutState::default();
        let huge = Product {
            price: Decimal::MAX,
            ..product("p1", 0)
        };
        state.add_line(huge, 1).unwrap();

        let err = state
            .update_quantity(
                &ProductId::new("p1"),
                QuantityDirection::Increase,
                DecrementPolicy::Ignore,
            )
            .unwrap_err();

        assert!(matches!(err, CheckoutError::AmountOutOfRange));
        assert_eq!(state.lines[0].quantity(), 1);
    }

    #[test]
    fn test_decrease_at_one_with_ignore_policy() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 500), 1).unwrap();

        let change = state
            .update_quantity(
                &ProductId::new("p1"),
                QuantityDirection::Decrease,
                DecrementPolicy::Ignore,
            )
            .unwrap();

        assert_eq!(change, QuantityChange::Unchanged);
        assert_eq!(state.lines[0].quantity(), 1);
    }

    #[test]
    fn test_decrease_at_one_with_remove_policy() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 500), 1).unwrap();

        let change = state
            .update_quantity(
                &ProductId::new("p1"),
                QuantityDirection::Decrease,
                DecrementPolicy::Remove,
            )
            .unwrap();

        assert_eq!(change, QuantityChange::Removed);
        assert!(state.lines.is_empty());
    }

    #[test]
    fn test_increase_and_decrease() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 500), 1).unwrap();
        let id = ProductId::new("p1");

        assert_eq!(
            state
                .update_quantity(&id, QuantityDirection::Increase, DecrementPolicy::Ignore)
                .unwrap(),
            QuantityChange::Updated(2)
        );
        assert_eq!(
            state
                .update_quantity(&id, QuantityDirection::Decrease, DecrementPolicy::Ignore)
                .unwrap(),
            QuantityChange::Updated(1)
        );
    }

    #[test]
    fn test_unknown_product_errors() {
        let mut state = CheckoutState::default();
        let id = ProductId::new("ghost");
        assert!(
            state
                .update_quantity(&id, QuantityDirection::Increase, DecrementPolicy::Ignore)
                .is_err()
        );
        assert!(state.remove_line(&id).is_err());
    }

    #[test]
    fn test_total_uses_applied_coupon() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 10_000), 1).unwrap();
        assert_eq!(state.total().display(), "$100.00");

        state.apply_coupon(coupon());
        assert_eq!(state.total().display(), "$90.00");

        state.applied_coupon = None;
        assert_eq!(state.total().display(), "$100.00");
    }

    #[test]
    fn test_cart_change_clears_applied_coupon() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 10_000), 1).unwrap();
        state.apply_coupon(coupon());
        state.coupon_form.success = Some("Coupon applied! You saved $10.00".to_string());

        state
            .update_quantity(
                &ProductId::new("p1"),
                QuantityDirection::Increase,
                DecrementPolicy::Ignore,
            )
            .unwrap();

        assert!(state.applied_coupon.is_none());
        assert!(state.coupon_form.success.is_none());
    }

    #[test]
    fn test_unchanged_quantity_keeps_coupon() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 10_000), 1).unwrap();
        state.apply_coupon(coupon());

        state
            .update_quantity(
                &ProductId::new("p1"),
                QuantityDirection::Decrease,
                DecrementPolicy::Ignore,
            )
            .unwrap();

        assert!(state.applied_coupon.is_some());
    }

    #[test]
    fn test_state_survives_json_roundtrip() {
        let mut state = CheckoutState::default();
        state.add_line(product("p1", 1_999), 2).unwrap();
        state.add_address(new_address("1 Oak St"));
        state.apply_coupon(coupon());

        let json = serde_json::to_value(&state).unwrap();
        let restored: CheckoutState = serde_json::from_value(json).unwrap();

        assert_eq!(restored.lines, state.lines);
        assert_eq!(restored.selected_address_id, state.selected_address_id);
        assert_eq!(restored.applied_coupon, state.applied_coupon);
        assert_eq!(restored.coupon_form, state.coupon_form);
    }
}
