//! Seed the product catalog from a YAML fixture.
//!
//! # Usage
//!
//! ```bash
//! clementine-cli seed -f fixtures/products.yaml
//! ```
//!
//! # Fixture Format
//!
//! ```yaml
//! products:
//!   - name: Clementine Crate
//!     description: A wooden crate of fresh clementines.
//!     price: "29.99"
//!     stock: 40
//!   - name: Presale Marmalade
//!     price: "12.50"
//!     stock: 0
//!     presale: true
//!     release_date: 2026-11-01
//! ```
//!
//! Products already in the catalog (matched by name) are skipped, so the
//! command can be re-run safely.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{CommandError, connect};

#[derive(Debug, Deserialize)]
struct Fixture {
    products: Vec<ProductFixture>,
}

#[derive(Debug, Deserialize)]
struct ProductFixture {
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: Decimal,
    stock: i32,
    #[serde(default)]
    presale: bool,
    #[serde(default)]
    release_date: Option<NaiveDate>,
}

/// Seed products from a YAML fixture file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a database
/// operation fails.
pub async fn products(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(CommandError::Fixture(format!("file not found: {file_path}")));
    }

    tracing::info!(path = %file_path, "Loading product fixture");

    // Read and validate the YAML before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CommandError::Fixture(e.to_string()))?;
    let fixture: Fixture =
        serde_yaml::from_str(&content).map_err(|e| CommandError::Fixture(e.to_string()))?;

    for product in &fixture.products {
        if product.price <= Decimal::ZERO {
            return Err(CommandError::Fixture(format!(
                "product '{}' has a non-positive price",
                product.name
            )));
        }
        if product.stock < 0 {
            return Err(CommandError::Fixture(format!(
                "product '{}' has negative stock",
                product.name
            )));
        }
    }

    tracing::info!(products = fixture.products.len(), "Parsed fixture");

    let pool = connect().await?;

    let mut inserted = 0;
    let mut skipped = 0;
    for product in fixture.products {
        let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM products WHERE name = $1")
            .bind(&product.name)
            .fetch_optional(&pool)
            .await?;

        if existing.is_some() {
            tracing::info!(name = %product.name, "Product already exists, skipping");
            skipped += 1;
            continue;
        }

        sqlx::query(
            "INSERT INTO products (name, description, price, stock, presale, release_date)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.presale)
        .bind(product.release_date)
        .execute(&pool)
        .await?;

        tracing::info!(name = %product.name, "Product seeded");
        inserted += 1;
    }

    tracing::info!(inserted, skipped, "Seeding complete!");
    Ok(())
}
