//! Payment gateway webhook endpoint.
//!
//! The body must stay raw bytes until the signature is verified; parsing
//! first would both waste work on forgeries and risk accepting a payload
//! that differs from what was signed.

use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::reconciliation::{ReconcileOutcome, ReconciliationService, WebhookEvent};
use crate::state::AppState;

/// Receive and apply a gateway webhook event.
///
/// Returns 200 for everything the handler dealt with, including
/// redeliveries and event types it ignores. Only persistence failures
/// surface as 5xx, which tells the gateway to deliver the event again.
#[instrument(skip_all)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("missing stripe-signature header".to_owned()))?;

    state.gateway().verify_webhook(&body, signature)?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("malformed webhook payload: {e}")))?;

    let outcome = ReconciliationService::new(&state).handle_event(&event).await?;

    match outcome {
        ReconcileOutcome::UnknownCustomer => Err(AppError::NotFound("Customer".to_owned())),
        _ => Ok(StatusCode::OK),
    }
}
