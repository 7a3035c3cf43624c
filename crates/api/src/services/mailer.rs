//! Transactional mail relay client.
//!
//! Thin JSON client for the hosted mail API. Bodies are plain text; the
//! relay owns template rendering. Callers decide whether a send failure is
//! fatal (password reset is best-effort, order confirmation must never
//! bounce an acknowledged payment).

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clementine_core::Email;

use crate::config::MailConfig;
use crate::models::order::Order;

/// Mail relay API base URL.
const BASE_URL: &str = "https://api.resend.com";

/// Per-request timeout for relay calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Initial backoff before the retry; doubles on each attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// How many times a transient transport failure is retried.
const MAX_RETRIES: u32 = 1;

/// Errors that can occur when talking to the mail relay.
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Transactional mail relay client.
#[derive(Clone)]
pub struct MailClient {
    client: reqwest::Client,
    from_address: String,
    contact_recipient: String,
    reset_link_base: String,
}

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

impl MailClient {
    /// Create a new mail relay client.
    ///
    /// `client_origin` is the SPA origin that password-reset links point at.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MailConfig, client_origin: &str) -> Result<Self, MailError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| MailError::Parse(format!("Invalid API key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            from_address: config.from_address.clone(),
            contact_recipient: config.contact_recipient.clone(),
            reset_link_base: client_origin.trim_end_matches('/').to_owned(),
        })
    }

    /// Send a password reset link to an account's address.
    ///
    /// # Errors
    ///
    /// Returns error if the relay rejects the mail or the request fails
    /// after retrying.
    pub async fn send_password_reset(
        &self,
        to: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let link = reset_link(&self.reset_link_base, token);
        let text = format!(
            "Hi {username},\n\n\
             Someone asked to reset the password for your account. If that\n\
             was you, follow this link within 15 minutes:\n\n\
             {link}\n\n\
             If it wasn't you, ignore this mail; your password is unchanged.\n"
        );

        self.send(OutgoingMail {
            from: &self.from_address,
            to: [to.as_str()],
            subject: "Reset your password",
            text,
            reply_to: None,
        })
        .await
    }

    /// Send an order confirmation to the order's contact address.
    ///
    /// # Errors
    ///
    /// Returns error if the relay rejects the mail or the request fails
    /// after retrying.
    pub async fn send_order_confirmation(&self, to: &Email, order: &Order) -> Result<(), MailError> {
        let subject = format!("Order #{} confirmed", order.id);
        let text = format!(
            "Thanks for your order!\n\n\
             Order number: {}\n\
             Total: {}\n\
             Paid with: {}\n\n\
             We'll let you know as soon as it ships.\n",
            order.id,
            order.amount,
            order.payment_method.as_str(),
        );

        self.send(OutgoingMail {
            from: &self.from_address,
            to: [to.as_str()],
            subject: &subject,
            text,
            reply_to: None,
        })
        .await
    }

    /// Forward a contact-form submission to the shop inbox.
    ///
    /// The visitor's address goes into `reply-to` so the inbox can answer
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns error if the relay rejects the mail or the request fails
    /// after retrying.
    pub async fn send_contact_notification(
        &self,
        name: &str,
        reply_to: &Email,
        message: &str,
    ) -> Result<(), MailError> {
        let subject = format!("Contact form: {name}");
        let text = format!("From: {name} <{}>\n\n{message}\n", reply_to.as_str());

        self.send(OutgoingMail {
            from: &self.from_address,
            to: [self.contact_recipient.as_str()],
            subject: &subject,
            text,
            reply_to: Some(reply_to.as_str()),
        })
        .await
    }

    async fn send(&self, mail: OutgoingMail<'_>) -> Result<(), MailError> {
        let url = format!("{BASE_URL}/emails");

        let mut backoff = RETRY_BACKOFF;
        let mut attempt = 0;
        let response = loop {
            match self.client.post(&url).json(&mail).send().await {
                Ok(response) => break response,
                Err(e) if is_transient(&e) && attempt < MAX_RETRIES => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "Transient mail relay error, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| MailError::Parse(e.to_string()))?;
        tracing::debug!(mail_id = %sent.id, "Mail accepted by relay");

        Ok(())
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

fn reset_link(base: &str, token: &str) -> String {
    format!("{base}/reset-password?token={token}")
}
