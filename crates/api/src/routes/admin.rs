//! Admin route handlers.
//!
//! Every handler takes `RequireAdmin`; role checks happen in the extractor
//! so a missing `admin` role is rejected before any work is done.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clementine_core::ProductId;

use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::requests::RequestRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::Order;
use crate::models::product::{Product, ProductInput};
use crate::routes::auth::UserResponse;
use crate::state::AppState;

/// Product fields accepted from the admin UI.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub presale: bool,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub gateway_product_id: Option<String>,
    #[serde(default)]
    pub gateway_price_id: Option<String>,
}

/// A product as shown to admins, gateway identifiers included.
#[derive(Debug, Serialize)]
pub struct AdminProductResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub presale: bool,
    pub release_date: Option<NaiveDate>,
    pub gateway_product_id: Option<String>,
    pub gateway_price_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for AdminProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            presale: product.presale,
            release_date: product.release_date,
            gateway_product_id: product.gateway_product_id,
            gateway_price_id: product.gateway_price_id,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// An order as shown to admins, gateway references included.
#[derive(Debug, Serialize)]
pub struct AdminOrderResponse {
    pub id: i32,
    pub user_id: i32,
    pub status: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub checkout_session_id: Option<String>,
    pub payment_reference: Option<String>,
    pub contact_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for AdminOrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.as_i32(),
            user_id: order.user_id.as_i32(),
            status: order.status.to_string(),
            amount: order.amount,
            payment_method: order.payment_method.as_str().to_owned(),
            checkout_session_id: order.checkout_session_id,
            payment_reference: order.payment_reference,
            contact_email: order.contact_email.into_inner(),
            created_at: order.created_at,
        }
    }
}

/// A shopper's product request as shown to admins.
#[derive(Debug, Serialize)]
pub struct AdminProductRequestResponse {
    pub id: i32,
    pub email: String,
    pub product_name: String,
    pub created_at: DateTime<Utc>,
}

/// Create a catalog product.
#[instrument(skip(state, _admin, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<AdminProductResponse>)> {
    let input = validate_product(payload, Utc::now().date_naive())?;

    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "Product created");

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Replace a catalog product.
#[instrument(skip(state, _admin, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(product_id): Path<i32>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<AdminProductResponse>> {
    let input = validate_product(payload, Utc::now().date_naive())?;

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(product_id), &input)
        .await?;
    tracing::info!(product_id = %product.id, "Product updated");

    Ok(Json(product.into()))
}

/// Delete a catalog product.
#[instrument(skip(state, _admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(product_id): Path<i32>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(ProductId::new(product_id))
        .await?;
    tracing::info!(product_id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// List every order in the store, newest first.
#[instrument(skip(state, _admin))]
pub async fn list_all_orders(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<AdminOrderResponse>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// List every account.
#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<UserResponse>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// List shopper product requests, newest first.
#[instrument(skip(state, _admin))]
pub async fn list_product_requests(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<AdminProductRequestResponse>>> {
    let requests = RequestRepository::new(state.pool())
        .list_product_requests()
        .await?;

    Ok(Json(
        requests
            .into_iter()
            .map(|r| AdminProductRequestResponse {
                id: r.id.as_i32(),
                email: r.email.into_inner(),
                product_name: r.product_name,
                created_at: r.created_at,
            })
            .collect(),
    ))
}

/// Check admin-supplied product fields before they reach the database.
fn validate_product(payload: ProductPayload, today: NaiveDate) -> Result<ProductInput> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_owned()));
    }
    if payload.price <= Decimal::ZERO {
        return Err(AppError::Validation("price must be positive".to_owned()));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation(
            "stock must not be negative".to_owned(),
        ));
    }
    if payload.presale {
        match payload.release_date {
            Some(date) if date > today => {}
            _ => {
                return Err(AppError::Validation(
                    "presale products need a future release date".to_owned(),
                ));
            }
        }
    }

    Ok(ProductInput {
        name: name.to_owned(),
        description: payload.description,
        price: payload.price,
        stock: payload.stock,
        presale: payload.presale,
        release_date: payload.release_date,
        gateway_product_id: payload.gateway_product_id,
        gateway_price_id: payload.gateway_price_id,
    })
}
