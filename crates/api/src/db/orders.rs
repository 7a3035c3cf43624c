//! Order repository for database operations.
//!
//! Orders move `pending -> paid | failed` and never leave a terminal
//! status; every transition here is guarded by `status = 'pending'` in the
//! UPDATE itself so redelivered webhooks can't rewrite history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use clementine_core::{Email, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::order::{Order, OrderItem, OrderLineInput};

const ORDER_COLUMNS: &str = "id, user_id, status, amount, payment_method, \
     checkout_session_id, payment_reference, contact_email, created_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: String,
    amount: Decimal,
    payment_method: String,
    checkout_session_id: Option<String>,
    payment_reference: Option<String>,
    contact_email: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_domain(self) -> Result<Order, RepositoryError> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let contact_email = Email::parse(&self.contact_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            status,
            amount: self.amount,
            payment_method: PaymentMethod::from_gateway(Some(&self.payment_method)),
            checkout_session_id: self.checkout_session_id,
            payment_reference: self.payment_reference,
            contact_email,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending order with its line snapshot, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the checkout session id is
    /// already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_pending(
        &self,
        user_id: UserId,
        amount: Decimal,
        payment_method: &PaymentMethod,
        checkout_session_id: &str,
        contact_email: &Email,
        lines: &[OrderLineInput],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders
                 (user_id, status, amount, payment_method, checkout_session_id, contact_email)
             VALUES ($1, 'pending', $2, $3, $4, $5)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(amount)
        .bind(payment_method.as_str())
        .bind(checkout_session_id)
        .bind(contact_email.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "checkout session already has an order"))?;

        let order = row.into_domain()?;

        for line in lines {
            sqlx::query(
                "INSERT INTO order_item (order_id, product_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order.id.as_i32())
            .bind(line.product_id.as_i32())
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    /// Create an order directly in `paid` status.
    ///
    /// Used when a settled payment arrives for which no pending order
    /// exists locally.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the payment reference is
    /// already recorded.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_paid(
        &self,
        user_id: UserId,
        amount: Decimal,
        payment_method: &PaymentMethod,
        checkout_session_id: &str,
        payment_reference: Option<&str>,
        contact_email: &Email,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders
                 (user_id, status, amount, payment_method, checkout_session_id,
                  payment_reference, contact_email)
             VALUES ($1, 'paid', $2, $3, $4, $5, $6)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(amount)
        .bind(payment_method.as_str())
        .bind(checkout_session_id)
        .bind(payment_reference)
        .bind(contact_email.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "payment already recorded"))?;

        row.into_domain()
    }

    /// Look up an order by its gateway checkout session id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_session_id(
        &self,
        checkout_session_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_session_id = $1"
        ))
        .bind(checkout_session_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_domain).transpose()
    }

    /// Look up an order by its gateway payment reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1"
        ))
        .bind(payment_reference)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_domain).transpose()
    }

    /// Move a pending order to `paid`, recording the payment reference and,
    /// when the event carries one, the settled amount.
    ///
    /// Returns `None` when the order is already terminal (or gone), which
    /// callers treat as an idempotent no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn mark_paid(
        &self,
        order_id: OrderId,
        payment_reference: Option<&str>,
        payment_method: &PaymentMethod,
        settled_amount: Option<Decimal>,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders
             SET status = 'paid', payment_reference = $2, payment_method = $3,
                 amount = COALESCE($4, amount)
             WHERE id = $1 AND status = 'pending'
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id.as_i32())
        .bind(payment_reference)
        .bind(payment_method.as_str())
        .bind(settled_amount)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_domain).transpose()
    }

    /// Move a pending order to `failed`.
    ///
    /// Returns `None` when the order is already terminal (or gone).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn mark_failed(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders
             SET status = 'failed'
             WHERE id = $1 AND status = 'pending'
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_domain).transpose()
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_domain).collect()
    }

    /// Get one of the user's orders together with its lines.
    ///
    /// Returns `None` both for unknown ids and for orders owned by someone
    /// else, so the route can 404 without leaking existence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<(Order, Vec<OrderItem>)>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id.as_i32())
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = row.into_domain()?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, quantity, unit_price
             FROM order_item WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(order.id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(Some((order, items.into_iter().map(Into::into).collect())))
    }

    /// List all orders, newest first. Admin surface only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_domain).collect()
    }
}
