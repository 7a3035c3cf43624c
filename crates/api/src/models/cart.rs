//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use clementine_core::{CartId, CartItemId, ProductId, UserId};

use super::product::Product;

/// A user's cart (domain type). At most one per user, created lazily.
#[derive(Debug, Clone)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Owning user.
    pub user_id: UserId,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

/// A line item in a cart. Quantity is always at least 1; decrementing to
/// zero deletes the row instead.
#[derive(Debug, Clone)]
pub struct CartItem {
    /// Unique line item ID.
    pub id: CartItemId,
    /// Cart this line belongs to.
    pub cart_id: CartId,
    /// Product referenced by this line.
    pub product_id: ProductId,
    /// Units of the product, `>= 1`.
    pub quantity: i32,
}

/// A cart line joined with its product, priced.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
    /// `product.price * quantity`, exact decimal arithmetic.
    pub line_total: Decimal,
}

/// A fully priced view of a cart, as returned to the SPA.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
}

impl CartView {
    /// Assemble a view from joined lines, computing line and cart totals.
    #[must_use]
    pub fn from_lines(lines: Vec<(Product, i32)>) -> Self {
        let items: Vec<CartLine> = lines
            .into_iter()
            .map(|(product, quantity)| {
                let line_total = product.price * Decimal::from(quantity);
                CartLine {
                    product,
                    quantity,
                    line_total,
                }
            })
            .collect();
        let subtotal = items.iter().map(|l| l.line_total).sum();
        Self { items, subtotal }
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i32, price_cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product-{id}"),
            description: None,
            price: Decimal::new(price_cents, 2),
            stock: 10,
            presale: false,
            release_date: None,
            gateway_product_id: None,
            gateway_price_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_totals_are_exact() {
        let view = CartView::from_lines(vec![(product(1, 1999), 3), (product(2, 500), 2)]);
        assert_eq!(view.items.len(), 2);
        // 19.99 * 3 = 59.97
        assert_eq!(view.items[0].line_total, Decimal::new(5997, 2));
        // 59.97 + 10.00 = 69.97
        assert_eq!(view.subtotal, Decimal::new(6997, 2));
    }

    #[test]
    fn test_empty_view() {
        let view = CartView::from_lines(vec![]);
        assert!(view.is_empty());
        assert_eq!(view.subtotal, Decimal::ZERO);
    }
}
