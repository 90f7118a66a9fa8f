//! Checkout UI components.
//!
//! Each component is a props struct that renders to an HTML fragment with
//! Askama. Components never own checkout state: they render what the page
//! hands them, and user interactions go to [`ActionUrl`]s the page supplies.
//! HTMX posts the interaction to that URL and swaps in whatever fragment the
//! owning route returns.
//!
//! - [`AddressSelector`] - Radio list of saved addresses plus "add new"
//! - [`CartItemRow`] - One line item with quantity and remove controls
//! - [`CouponForm`] - Coupon entry, validation feedback, and applied view

pub mod address_selector;
pub mod cart_item_row;
pub mod coupon_form;

use std::fmt;

pub use address_selector::{AddressOption, AddressSelector};
pub use cart_item_row::CartItemRow;
pub use coupon_form::{
    AppliedCouponView, CouponForm, CouponFormState, CouponMessages, CouponPhase, SubmitError,
};

/// Endpoint a component posts an interaction to.
///
/// This is the server-rendered form of a callback prop: the owner decides
/// what URL handles the event, the component only wires it into its markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionUrl(String);

impl ActionUrl {
    /// Create an action URL from a path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionUrl {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
