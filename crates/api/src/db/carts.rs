//! Cart repository for database operations.
//!
//! One cart per user, created lazily. Every quantity mutation is a single
//! SQL statement so concurrent requests from the same user never lose
//! updates to a read-modify-write race.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clementine_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::cart::{Cart, CartItem};
use crate::models::product::Product;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    quantity: i32,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it if it doesn't exist yet.
    ///
    /// Concurrent first requests race on the insert; `ON CONFLICT DO
    /// NOTHING` plus the re-select means both callers end up with the same
    /// row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let inserted = sqlx::query_as::<_, CartRow>(
            "INSERT INTO cart (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING id, user_id, created_at",
        )
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row.into());
        }

        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at FROM cart WHERE user_id = $1",
        )
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Add units of a product to the cart.
    ///
    /// Repeated adds accumulate: the upsert increments the existing row's
    /// quantity atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "INSERT INTO cart_item (cart_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = cart_item.quantity + EXCLUDED.quantity
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Add one unit to an existing line.
    ///
    /// Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product isn't in the cart.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn increment(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<i32, RepositoryError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "UPDATE cart_item SET quantity = quantity + 1
             WHERE cart_id = $1 AND product_id = $2
             RETURNING quantity",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        quantity.ok_or(RepositoryError::NotFound)
    }

    /// Remove one unit from an existing line.
    ///
    /// Returns the new quantity; 0 means the line was deleted. A line with
    /// quantity below 1 is never persisted, so the last unit deletes the
    /// row in the same statement that would have lowered it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product isn't in the cart.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn decrement(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<i32, RepositoryError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "WITH removed AS (
                 DELETE FROM cart_item
                 WHERE cart_id = $1 AND product_id = $2 AND quantity <= 1
                 RETURNING 0 AS quantity
             ), lowered AS (
                 UPDATE cart_item SET quantity = quantity - 1
                 WHERE cart_id = $1 AND product_id = $2 AND quantity > 1
                 RETURNING quantity
             )
             SELECT quantity FROM removed
             UNION ALL
             SELECT quantity FROM lowered",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        quantity.ok_or(RepositoryError::NotFound)
    }

    /// Remove a product's line entirely. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_item WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id.as_i32())
            .bind(product_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Fetch the cart's lines joined with their products, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<(Product, i32)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct LineRow {
            #[sqlx(flatten)]
            product: ProductRow,
            quantity: i32,
        }

        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT p.id, p.name, p.description, p.price, p.stock, p.presale,
                    p.release_date, p.gateway_product_id, p.gateway_price_id,
                    p.created_at, p.updated_at, ci.quantity
             FROM cart_item ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.cart_id = $1
             ORDER BY ci.id ASC",
        )
        .bind(cart_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.product.into(), r.quantity))
            .collect())
    }

    /// Delete every line in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_item WHERE cart_id = $1")
            .bind(cart_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Delete every line in the user's cart, if they have one.
    ///
    /// Used after successful payment, where only the user is known.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear_for_user(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "DELETE FROM cart_item USING cart
             WHERE cart_item.cart_id = cart.id AND cart.user_id = $1",
        )
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
