//! Marketing-surface domain types.

use chrono::{DateTime, Utc};

use clementine_core::{Email, FeedbackId, RequestId};

/// A shopper's request to stock a product.
#[derive(Debug, Clone)]
pub struct ProductRequest {
    /// Unique request ID.
    pub id: RequestId,
    /// Address of the requester.
    pub email: Email,
    /// Product the shopper wants stocked.
    pub product_name: String,
    /// When the request arrived.
    pub created_at: DateTime<Utc>,
}

/// A contact-form submission, persisted before any mail is sent.
#[derive(Debug, Clone)]
pub struct Feedback {
    /// Unique feedback ID.
    pub id: FeedbackId,
    /// Name the visitor gave.
    pub name: String,
    /// Address the visitor gave.
    pub email: Email,
    /// The message body.
    pub message: String,
    /// When the submission arrived.
    pub created_at: DateTime<Utc>,
}
