//! Products and cart lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{CurrencyCode, Price};

/// A product as shown in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Image URL, if the product has one.
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    /// Unit price as a [`Price`] in the store currency.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::new(self.price, CurrencyCode::default())
    }
}

/// A product plus a quantity within a cart.
///
/// The quantity is always at least 1; a line that would drop to zero is
/// removed by the owner instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    quantity: u32,
}

impl CartLine {
    /// Create a line, clamping the quantity to at least 1.
    #[must_use]
    pub fn new(product: Product, quantity: u32) -> Self {
        Self {
            product,
            quantity: quantity.max(1),
        }
    }

    /// Current quantity (always `>= 1`).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Increase the quantity by one, saturating at `u32::MAX`.
    pub const fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    /// Decrease the quantity by one.
    ///
    /// Returns `false` without changing anything when the line is already
    /// at 1; the caller decides what that means.
    pub const fn decrement(&mut self) -> bool {
        if self.quantity <= 1 {
            return false;
        }
        self.quantity -= 1;
        true
    }

    /// `price × quantity`, or `None` if it overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.product.unit_price().checked_times(self.quantity)
    }
}

/// Sum of line totals, or `None` if any line or the sum overflows.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Option<Price> {
    let amount = lines.iter().try_fold(Decimal::ZERO, |sum, line| {
        sum.checked_add(line.line_total()?.amount)
    })?;
    Some(Price::new(amount, CurrencyCode::default()))
}
