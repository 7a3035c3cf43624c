//! Checkout route handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::auth::AuthService;
use crate::services::checkout::{CheckoutService, ReturnUrls};
use crate::state::AppState;

/// Checkout request payload.
///
/// With `price_id` set, the reference is passed through to the gateway;
/// otherwise the caller's cart is snapshotted into ad-hoc line items.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

/// The opened checkout session.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub id: String,
    pub url: String,
}

/// Open a hosted checkout session and hand the shopper its URL.
#[instrument(skip(state, auth, payload))]
pub async fn create_checkout(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let user = AuthService::new(state.pool()).get_user(auth.user_id).await?;
    let urls = ReturnUrls::resolve(
        &state.config().client_origin,
        payload.success_url,
        payload.cancel_url,
    );

    let service = CheckoutService::new(&state);
    let session = match payload.price_id {
        Some(price_id) => {
            service
                .checkout_price(&user, &price_id, payload.quantity.unwrap_or(1), urls)
                .await?
        }
        None => service.checkout_cart(&user, urls).await?,
    };

    add_breadcrumb(
        "checkout",
        "Checkout session created",
        Some(&[("session_id", session.id.as_str())]),
    );

    Ok(Json(CheckoutResponse {
        id: session.id,
        url: session.url,
    }))
}
