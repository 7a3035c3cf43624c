//! Cart route handlers.
//!
//! Every endpoint operates on the authenticated user's own cart, which is
//! created lazily on first touch. Quantity changes are atomic in the
//! database, so two tabs hammering the same cart never lose an update.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clementine_core::ProductId;

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::CartView;
use crate::state::AppState;

use super::products::ProductResponse;

/// Add-to-cart request payload.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}

/// Increment/decrement request payload.
#[derive(Debug, Deserialize)]
pub struct QuantityStepRequest {
    pub product_id: i32,
}

/// One priced cart line.
#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub product: ProductResponse,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// The full priced cart.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
    pub subtotal: Decimal,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        Self {
            items: view
                .items
                .into_iter()
                .map(|line| CartLineResponse {
                    product: line.product.into(),
                    quantity: line.quantity,
                    line_total: line.line_total,
                })
                .collect(),
            subtotal: view.subtotal,
        }
    }
}

/// New quantity of a line after a step, 0 when the line was removed.
#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub product_id: i32,
    pub quantity: i32,
}

/// Get the caller's cart with priced lines and subtotal.
#[instrument(skip(state, auth))]
pub async fn view_cart(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<CartResponse>> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(auth.user_id).await?;
    let lines = carts.lines(cart.id).await?;

    Ok(Json(CartView::from_lines(lines).into()))
}

/// Add units of a product to the caller's cart.
///
/// Repeated adds of the same product accumulate.
#[instrument(skip(state, auth, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<CartResponse>> {
    if payload.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_owned(),
        ));
    }

    let product_id = ProductId::new(payload.product_id);
    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))?;

    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(auth.user_id).await?;
    let item = carts.add_item(cart.id, product_id, payload.quantity).await?;
    tracing::info!(
        user_id = %auth.user_id,
        product_id = %item.product_id,
        quantity = item.quantity,
        "Cart item added"
    );

    let lines = carts.lines(cart.id).await?;
    Ok(Json(CartView::from_lines(lines).into()))
}

/// Add one unit to a line already in the cart.
#[instrument(skip(state, auth, payload))]
pub async fn increment_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(payload): Json<QuantityStepRequest>,
) -> Result<Json<QuantityResponse>> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(auth.user_id).await?;
    let quantity = carts
        .increment(cart.id, ProductId::new(payload.product_id))
        .await?;

    Ok(Json(QuantityResponse {
        product_id: payload.product_id,
        quantity,
    }))
}

/// Remove one unit from a line; removing the last unit deletes the line.
#[instrument(skip(state, auth, payload))]
pub async fn decrement_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(payload): Json<QuantityStepRequest>,
) -> Result<Json<QuantityResponse>> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(auth.user_id).await?;
    let quantity = carts
        .decrement(cart.id, ProductId::new(payload.product_id))
        .await?;

    Ok(Json(QuantityResponse {
        product_id: payload.product_id,
        quantity,
    }))
}

/// Drop a product from the cart entirely. Idempotent.
#[instrument(skip(state, auth))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<StatusCode> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(auth.user_id).await?;
    carts.remove_item(cart.id, ProductId::new(product_id)).await?;

    Ok(StatusCode::OK)
}

/// Empty the caller's cart.
#[instrument(skip(state, auth))]
pub async fn clear_cart(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<StatusCode> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(auth.user_id).await?;
    carts.clear(cart.id).await?;
    tracing::info!(user_id = %auth.user_id, "Cart cleared");

    Ok(StatusCode::OK)
}
