//! Cart line item component.
//!
//! Shows one product with its unit price, quantity controls, line total, and
//! a remove button. The row forwards `increase`/`decrease` as-is; keeping the
//! quantity in bounds is the owner's job.

use askama::Template;
use checkout_core::Product;

use super::ActionUrl;

/// Shown in place of a line total too large to represent.
const OUT_OF_RANGE: &str = "out of range";

/// Cart line item fragment.
#[derive(Template)]
#[template(path = "components/cart_item_row.html")]
pub struct CartItemRow {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub on_update_quantity: ActionUrl,
    pub on_remove: ActionUrl,
}

impl CartItemRow {
    /// Build a row for `product` at `quantity`.
    #[must_use]
    pub fn new(
        product: &Product,
        quantity: u32,
        on_update_quantity: ActionUrl,
        on_remove: ActionUrl,
    ) -> Self {
        let unit_price = product.unit_price();
        Self {
            product_id: product.id.to_string(),
            name: product.name.clone(),
            image: product.image.clone(),
            quantity,
            unit_price: unit_price.display(),
            line_total: unit_price
                .checked_times(quantity)
                .map_or_else(|| OUT_OF_RANGE.to_string(), |total| total.display()),
            on_update_quantity,
            on_remove,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use checkout_core::ProductId;
    use rust_decimal::Decimal;

    use super::*;

    fn product(cents: i64) -> Product {
        Product {
            id: ProductId::new("p-7"),
            name: "Pineapple Rings".to_string(),
            price: Decimal::new(cents, 2),
            image: Some("https://cdn.example.com/rings.jpg".to_string()),
        }
    }

    fn row(cents: i64, quantity: u32) -> CartItemRow {
        CartItemRow::new(
            &product(cents),
            quantity,
            ActionUrl::new("/checkout/cart/quantity"),
            ActionUrl::new("/checkout/cart/remove"),
        )
    }

    #[test]
    fn test_line_total_is_price_times_quantity() {
        for quantity in 1..=40_u32 {
            let row = row(333, quantity);
            let expected = Decimal::new(333, 2) * Decimal::from(quantity);
            assert_eq!(row.line_total, format!("${expected:.2}"));
        }
    }

    #[test]
    fn test_prices_rendered_to_two_decimals() {
        let html = row(1_250, 3).render().unwrap();
        assert!(html.contains("$12.50"));
        assert!(html.contains("$37.50"));
    }

    #[test]
    fn test_quantity_buttons_post_direction_and_product() {
        let html = row(100, 2).render().unwrap();
        assert!(html.contains("hx-post=\"/checkout/cart/quantity\""));
        assert!(html.contains("name=\"product_id\" value=\"p-7\""));
        assert!(html.contains("name=\"direction\" value=\"decrease\""));
        assert!(html.contains("name=\"direction\" value=\"increase\""));
    }

    #[test]
    fn test_decrease_is_not_disabled_at_one() {
        let html = row(100, 1).render().unwrap();
        assert!(!html.contains("disabled"));
    }

    #[test]
    fn test_remove_posts_product_id() {
        let html = row(100, 1).render().unwrap();
        assert!(html.contains("hx-post=\"/checkout/cart/remove\""));
        assert_eq!(html.matches("value=\"p-7\"").count(), 2);
    }

    #[test]
    fn test_overflowing_line_total_does_not_panic() {
        let huge = Product {
            price: Decimal::MAX,
            ..product(0)
        };
        let row = CartItemRow::new(
            &huge,
            2,
            ActionUrl::new("/checkout/cart/quantity"),
            ActionUrl::new("/checkout/cart/remove"),
        );
        assert_eq!(row.line_total, OUT_OF_RANGE);
    }

    #[test]
    fn test_no_clamping_in_component() {
        assert_eq!(row(100, 0).quantity, 0);
        assert_eq!(row(100, 0).line_total, "$0.00");
    }
}
