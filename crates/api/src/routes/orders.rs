//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use clementine_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::order::{Order, OrderItem};
use crate::state::AppState;

/// An order as returned to its owner.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i32,
    pub status: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.as_i32(),
            status: order.status.to_string(),
            amount: order.amount,
            payment_method: order.payment_method.as_str().to_owned(),
            created_at: order.created_at,
        }
    }
}

/// A line item on an order detail.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id.as_i32(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// An order together with its line snapshot.
#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

/// List the caller's orders, newest first.
#[instrument(skip(state, auth))]
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(auth.user_id)
        .await?;

    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Fetch one of the caller's orders with its lines.
///
/// Orders owned by other users 404 the same way unknown ids do.
#[instrument(skip(state, auth))]
pub async fn get_order(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(order_id): Path<i32>,
) -> Result<Json<OrderDetailResponse>> {
    let found = OrderRepository::new(state.pool())
        .get_for_user(OrderId::new(order_id), auth.user_id)
        .await?;

    let Some((order, items)) = found else {
        return Err(AppError::NotFound("Order".to_owned()));
    };

    Ok(Json(OrderDetailResponse {
        order: order.into(),
        items: items.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clementine_core::{Email, OrderStatus, PaymentMethod, UserId};

    #[test]
    fn test_order_response_serializes_flat_detail() {
        let order = Order {
            id: OrderId::new(7),
            user_id: UserId::new(3),
            status: OrderStatus::Paid,
            amount: Decimal::new(5997, 2),
            payment_method: PaymentMethod::card(),
            checkout_session_id: Some("cs_test_a1".to_owned()),
            payment_reference: Some("pi_1".to_owned()),
            contact_email: Email::parse("shopper@example.com").unwrap(),
            created_at: Utc::now(),
        };

        let detail = OrderDetailResponse {
            order: order.into(),
            items: vec![OrderItemResponse {
                product_id: 12,
                quantity: 2,
                unit_price: Decimal::new(2999, 2),
            }],
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["status"], "paid");
        assert_eq!(value["items"][0]["product_id"], 12);
        // Gateway references never reach the client
        assert!(value.get("payment_reference").is_none());
        assert!(value.get("checkout_session_id").is_none());
    }
}
