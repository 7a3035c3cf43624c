//! Contact form and product request handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clementine_core::Email;

use crate::db::RepositoryError;
use crate::db::requests::RequestRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Contact form payload.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Product request payload.
///
/// `email` may be omitted by signed-in shoppers; their account address is
/// used instead.
#[derive(Debug, Deserialize)]
pub struct ProductRequestPayload {
    #[serde(default)]
    pub email: Option<String>,
    pub product_name: String,
}

/// A recorded product request.
#[derive(Debug, Serialize)]
pub struct ProductRequestResponse {
    pub id: i32,
    pub product_name: String,
}

/// Accept a contact-form submission.
///
/// The message is persisted first; forwarding it to the shop inbox is
/// best-effort, so a relay outage never loses a submission.
#[instrument(skip(state, payload))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<StatusCode> {
    let name = payload.name.trim();
    let message = payload.message.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_owned()));
    }
    if message.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_owned()));
    }
    let email = Email::parse(&payload.email)
        .map_err(|_| AppError::Validation("Invalid email address".to_owned()))?;

    let feedback = RequestRepository::new(state.pool())
        .create_feedback(name, &email, message)
        .await?;

    if let Err(e) = state
        .mailer()
        .send_contact_notification(name, &email, message)
        .await
    {
        tracing::warn!(feedback_id = %feedback.id, error = %e, "Contact mail forward failed");
    }

    tracing::info!(feedback_id = %feedback.id, "Contact form submission recorded");
    Ok(StatusCode::ACCEPTED)
}

/// Record a request to stock a product.
#[instrument(skip(state, auth, payload))]
pub async fn submit_product_request(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Json(payload): Json<ProductRequestPayload>,
) -> Result<(StatusCode, Json<ProductRequestResponse>)> {
    let product_name = payload.product_name.trim();
    if product_name.is_empty() {
        return Err(AppError::Validation(
            "product_name must not be empty".to_owned(),
        ));
    }

    let email = match (payload.email, auth) {
        (Some(raw), _) => Email::parse(&raw)
            .map_err(|_| AppError::Validation("Invalid email address".to_owned()))?,
        (None, Some(claims)) => {
            let user = UserRepository::new(state.pool())
                .get_by_id(claims.user_id)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            user.email
        }
        (None, None) => {
            return Err(AppError::Validation("email is required".to_owned()));
        }
    };

    let request = RequestRepository::new(state.pool())
        .create_product_request(&email, product_name)
        .await?;

    tracing::info!(request_id = %request.id, "Product request recorded");
    Ok((
        StatusCode::CREATED,
        Json(ProductRequestResponse {
            id: request.id.as_i32(),
            product_name: request.product_name,
        }),
    ))
}
