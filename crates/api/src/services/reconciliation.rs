//! Webhook-driven order reconciliation.
//!
//! Orders follow `pending -> paid | failed` and never leave a terminal
//! status. The gateway delivers events at least once, so every path here
//! must be an idempotent no-op on redelivery; the database enforces this
//! with status-guarded transitions and unique payment references rather
//! than any in-memory bookkeeping.

use serde::Deserialize;

use clementine_core::{Email, OrderId, PaymentMethod, from_minor_units};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::orders::OrderRepository;
use crate::db::users::UserRepository;
use crate::models::order::Order;
use crate::state::AppState;

/// A webhook event envelope from the payment gateway.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

/// Event payload wrapper.
#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: SessionObject,
}

/// The checkout session embedded in a webhook event.
#[derive(Debug, Deserialize)]
pub struct SessionObject {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
}

/// Customer block inside a session object.
#[derive(Debug, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl SessionObject {
    /// The contact email for the session, wherever the gateway put it.
    #[must_use]
    pub fn contact_email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
    }

    fn payment_method(&self) -> PaymentMethod {
        PaymentMethod::from_gateway(self.payment_method_types.first().map(String::as_str))
    }
}

/// What kind of transition an event asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Settled,
    Failed,
    Other,
}

fn classify(event_type: &str) -> EventKind {
    match event_type {
        "checkout.session.completed" => EventKind::Settled,
        "checkout.session.expired" | "checkout.session.async_payment_failed" => EventKind::Failed,
        _ => EventKind::Other,
    }
}

/// What the handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A pending order was settled.
    Paid(OrderId),
    /// A pending order was marked failed.
    Failed(OrderId),
    /// The event was a redelivery; nothing changed.
    AlreadySettled,
    /// A failure event arrived for a session with no pending order.
    NoPendingOrder,
    /// A settled payment referenced an email no account matches.
    UnknownCustomer,
    /// Event type this handler doesn't act on.
    Ignored,
}

/// Applies webhook events to the order store.
pub struct ReconciliationService<'a> {
    state: &'a AppState,
}

impl<'a> ReconciliationService<'a> {
    /// Create a new reconciliation service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Apply one verified webhook event.
    ///
    /// Only returns an error when persistence fails; the route answers
    /// those with a 5xx so the gateway redelivers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a database operation fails.
    pub async fn handle_event(
        &self,
        event: &WebhookEvent,
    ) -> Result<ReconcileOutcome, RepositoryError> {
        match classify(&event.event_type) {
            EventKind::Settled => self.settle(&event.data.object).await,
            EventKind::Failed => self.fail(&event.data.object).await,
            EventKind::Other => {
                tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    async fn settle(&self, session: &SessionObject) -> Result<ReconcileOutcome, RepositoryError> {
        let orders = OrderRepository::new(self.state.pool());

        // Redelivery check by payment reference before touching anything.
        if let Some(reference) = session.payment_intent.as_deref() {
            if let Some(order) = orders.get_by_payment_reference(reference).await? {
                if order.status.is_terminal() {
                    tracing::info!(order_id = %order.id, "Payment already recorded, ignoring redelivery");
                    return Ok(ReconcileOutcome::AlreadySettled);
                }
            }
        }

        if let Some(order) = orders.get_by_session_id(&session.id).await? {
            return self.settle_pending(session, &order).await;
        }

        self.settle_without_order(session).await
    }

    /// The normal path: the checkout orchestrator wrote a pending order
    /// when it opened the session.
    async fn settle_pending(
        &self,
        session: &SessionObject,
        order: &Order,
    ) -> Result<ReconcileOutcome, RepositoryError> {
        if order.status.is_terminal() {
            tracing::info!(order_id = %order.id, status = %order.status, "Order already terminal, ignoring redelivery");
            return Ok(ReconcileOutcome::AlreadySettled);
        }

        let settled_amount = session.amount_total.map(from_minor_units);
        let updated = OrderRepository::new(self.state.pool())
            .mark_paid(
                order.id,
                session.payment_intent.as_deref(),
                &session.payment_method(),
                settled_amount,
            )
            .await?;

        let Some(order) = updated else {
            // Lost the race against a concurrent delivery of the same event.
            return Ok(ReconcileOutcome::AlreadySettled);
        };

        CartRepository::new(self.state.pool())
            .clear_for_user(order.user_id)
            .await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            amount = %order.amount,
            "Order paid"
        );
        self.send_confirmation(&order).await;

        Ok(ReconcileOutcome::Paid(order.id))
    }

    /// Settled payment with no local order for the session: resolve the
    /// user by the event's contact email and record the order as paid.
    async fn settle_without_order(
        &self,
        session: &SessionObject,
    ) -> Result<ReconcileOutcome, RepositoryError> {
        let Some(raw_email) = session.contact_email() else {
            tracing::warn!(session_id = %session.id, "Settled session carries no contact email");
            return Ok(ReconcileOutcome::UnknownCustomer);
        };
        let Ok(email) = Email::parse(raw_email) else {
            tracing::warn!(session_id = %session.id, "Settled session carries an unparseable email");
            return Ok(ReconcileOutcome::UnknownCustomer);
        };

        let Some(user) = UserRepository::new(self.state.pool())
            .get_by_email(&email)
            .await?
        else {
            tracing::warn!(session_id = %session.id, "No account matches the settled session's email");
            return Ok(ReconcileOutcome::UnknownCustomer);
        };

        let amount = from_minor_units(session.amount_total.unwrap_or(0));
        let created = OrderRepository::new(self.state.pool())
            .create_paid(
                user.id,
                amount,
                &session.payment_method(),
                &session.id,
                session.payment_intent.as_deref(),
                &email,
            )
            .await;

        let order = match created {
            Ok(order) => order,
            Err(RepositoryError::Conflict(_)) => {
                tracing::info!(session_id = %session.id, "Order already recorded, ignoring redelivery");
                return Ok(ReconcileOutcome::AlreadySettled);
            }
            Err(e) => return Err(e),
        };

        CartRepository::new(self.state.pool())
            .clear_for_user(user.id)
            .await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user.id,
            amount = %order.amount,
            "Order recorded from settled session"
        );
        self.send_confirmation(&order).await;

        Ok(ReconcileOutcome::Paid(order.id))
    }

    async fn fail(&self, session: &SessionObject) -> Result<ReconcileOutcome, RepositoryError> {
        let orders = OrderRepository::new(self.state.pool());

        let Some(order) = orders.get_by_session_id(&session.id).await? else {
            tracing::debug!(session_id = %session.id, "Failure event for unknown session");
            return Ok(ReconcileOutcome::NoPendingOrder);
        };
        if order.status.is_terminal() {
            return Ok(ReconcileOutcome::AlreadySettled);
        }

        let Some(order) = orders.mark_failed(order.id).await? else {
            return Ok(ReconcileOutcome::AlreadySettled);
        };

        tracing::info!(order_id = %order.id, user_id = %order.user_id, "Order failed");
        Ok(ReconcileOutcome::Failed(order.id))
    }

    /// Confirmation mail is best-effort; a relay outage must never bounce
    /// an acknowledged payment back to the gateway.
    async fn send_confirmation(&self, order: &Order) {
        if let Err(e) = self
            .state
            .mailer()
            .send_order_confirmation(&order.contact_email, order)
            .await
        {
            tracing::warn!(order_id = %order.id, error = %e, "Order confirmation mail failed");
        }
    }
}
