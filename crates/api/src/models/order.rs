//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use clementine_core::{Email, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

/// An order (domain type).
///
/// Created `pending` when a checkout session opens and moved to a terminal
/// status by the reconciliation handler.
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Payment status.
    pub status: OrderStatus,
    /// Total in major units.
    pub amount: Decimal,
    /// How the order was paid.
    pub payment_method: PaymentMethod,
    /// Gateway checkout session that opened this order, when known.
    pub checkout_session_id: Option<String>,
    /// Gateway payment reference recorded at settlement.
    pub payment_reference: Option<String>,
    /// Contact email snapshot taken at order time.
    pub contact_email: Email,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// A line to snapshot onto a new order.
#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A line item on an order. Quantity and unit price are captured at order
/// time so later catalog edits never change a settled order.
#[derive(Debug, Clone)]
pub struct OrderItem {
    /// Unique order item ID.
    pub id: OrderItemId,
    /// Order this line belongs to.
    pub order_id: OrderId,
    /// Product at the time of purchase.
    pub product_id: ProductId,
    /// Units purchased.
    pub quantity: i32,
    /// Unit price in major units at order time.
    pub unit_price: Decimal,
}
