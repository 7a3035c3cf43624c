//! Product domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use clementine_core::ProductId;

/// A catalog product (domain type).
///
/// Prices are stored in major units; conversion to the gateway's minor
/// units happens at checkout time.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Unit price in major units, always positive.
    pub price: Decimal,
    /// Units on hand, never negative.
    pub stock: i32,
    /// Whether the product is sold before its release date.
    pub presale: bool,
    /// Release date for presale products.
    pub release_date: Option<NaiveDate>,
    /// Gateway product identifier, when synced.
    pub gateway_product_id: Option<String>,
    /// Gateway price identifier, when synced.
    pub gateway_price_id: Option<String>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub presale: bool,
    pub release_date: Option<NaiveDate>,
    pub gateway_product_id: Option<String>,
    pub gateway_price_id: Option<String>,
}
