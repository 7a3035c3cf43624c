//! Repository for product requests and contact-form feedback.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clementine_core::{Email, FeedbackId, RequestId};

use super::{RepositoryError, map_unique_violation};
use crate::models::request::{Feedback, ProductRequest};

#[derive(Debug, sqlx::FromRow)]
struct ProductRequestRow {
    id: i32,
    email: String,
    product_name: String,
    created_at: DateTime<Utc>,
}

impl ProductRequestRow {
    fn into_domain(self) -> Result<ProductRequest, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(ProductRequest {
            id: RequestId::new(self.id),
            email,
            product_name: self.product_name,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FeedbackRow {
    id: i32,
    name: String,
    email: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl FeedbackRow {
    fn into_domain(self) -> Result<Feedback, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Feedback {
            id: FeedbackId::new(self.id),
            name: self.name,
            email,
            message: self.message,
            created_at: self.created_at,
        })
    }
}

/// Repository for the marketing-surface tables.
pub struct RequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RequestRepository<'a> {
    /// Create a new request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a product request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when this email already asked
    /// for this product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_product_request(
        &self,
        email: &Email,
        product_name: &str,
    ) -> Result<ProductRequest, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRequestRow>(
            "INSERT INTO product_requests (email, product_name)
             VALUES ($1, $2)
             RETURNING id, email, product_name, created_at",
        )
        .bind(email.as_str())
        .bind(product_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "product already requested"))?;

        row.into_domain()
    }

    /// Persist a contact-form submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_feedback(
        &self,
        name: &str,
        email: &Email,
        message: &str,
    ) -> Result<Feedback, RepositoryError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            "INSERT INTO feedback (name, email, message)
             VALUES ($1, $2, $3)
             RETURNING id, name, email, message, created_at",
        )
        .bind(name)
        .bind(email.as_str())
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        row.into_domain()
    }

    /// List product requests, newest first. Admin surface only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_product_requests(&self) -> Result<Vec<ProductRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRequestRow>(
            "SELECT id, email, product_name, created_at
             FROM product_requests ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ProductRequestRow::into_domain).collect()
    }
}
