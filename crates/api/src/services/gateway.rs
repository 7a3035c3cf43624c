//! Payment gateway HTTP client.
//!
//! Creates hosted checkout sessions against the gateway's form-encoded API
//! and verifies webhook signatures. All other payment state arrives via
//! webhooks; nothing here polls the gateway.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use clementine_core::CurrencyCode;

use crate::config::GatewayConfig;

/// Gateway API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backoff before the single retry of a transient transport failure.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Maximum retries after the initial attempt.
const MAX_RETRIES: u32 = 1;

/// Maximum age of a webhook timestamp, either direction.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Webhook signature header missing, malformed, stale, or wrong.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Failed to parse a response or build the client.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One ad-hoc checkout line, already converted to minor units.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_amount: i64,
    pub quantity: i64,
}

/// What the checkout session charges for.
#[derive(Debug, Clone)]
pub enum CheckoutItems {
    /// Lines priced by this server from the user's cart.
    AdHoc(Vec<CheckoutLine>),
    /// A price object that already lives on the gateway.
    PriceReference { price_id: String, quantity: i64 },
}

/// Parameters for creating a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    pub items: CheckoutItems,
    pub currency: CurrencyCode,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: String,
    pub client_reference_id: String,
}

/// A created checkout session: where to send the shopper, and the id the
/// webhook will echo back.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

/// Payment gateway API client.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    webhook_secret: SecretString,
}

impl GatewayClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret key can't form a header or the HTTP
    /// client fails to build.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| GatewayError::Parse(format!("Invalid secret key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            webhook_secret: config.webhook_secret.clone(),
        })
    }

    /// Create a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Api` for non-2xx responses and
    /// `GatewayError::Http` when the transport fails twice.
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, GatewayError> {
        let form = build_session_form(params);
        let response = self.post_form("/checkout/sessions", &form).await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| GatewayError::Parse("checkout session has no url".to_owned()))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    /// POST a form, retrying once with backoff on transient transport
    /// failures (timeouts, connection errors). API-level errors are never
    /// retried.
    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{BASE_URL}{path}");
        let mut backoff = RETRY_BACKOFF;
        let mut attempt = 0;

        loop {
            match self.client.post(&url).form(form).send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < MAX_RETRIES && is_transient(&e) => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "Gateway request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Verify a webhook payload against its signature header.
    ///
    /// The header carries `t=<unix>,v1=<hex>` pairs; the signature is
    /// HMAC-SHA256 over `"{t}.{body}"`. Nothing in the payload may be
    /// trusted before this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidSignature` if the header is malformed,
    /// the timestamp is outside the tolerance window, or no candidate
    /// signature matches.
    pub fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> Result<(), GatewayError> {
        self.verify_webhook_at(payload, signature_header, Utc::now().timestamp())
    }

    fn verify_webhook_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<(), GatewayError> {
        let (timestamp, candidates) = parse_signature_header(signature_header)?;

        if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(GatewayError::InvalidSignature);
        }

        let secret = self.webhook_secret.expose_secret().as_bytes();
        for candidate in candidates {
            let Ok(bytes) = hex::decode(candidate) else {
                continue;
            };
            let mut mac = Hmac::<Sha256>::new_from_slice(secret)
                .map_err(|_| GatewayError::InvalidSignature)?;
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            if mac.verify_slice(&bytes).is_ok() {
                return Ok(());
            }
        }

        Err(GatewayError::InvalidSignature)
    }
}

/// Split a `t=...,v1=...` header into the timestamp and the v1 candidates.
fn parse_signature_header(header: &str) -> Result<(i64, Vec<&str>), GatewayError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for pair in header.split(',') {
        let Some((key, value)) = pair.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(GatewayError::InvalidSignature)?;
    if candidates.is_empty() {
        return Err(GatewayError::InvalidSignature);
    }

    Ok((timestamp, candidates))
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

/// Flatten checkout parameters into the gateway's bracketed form encoding.
fn build_session_form(params: &CheckoutSessionParams) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("success_url".to_owned(), params.success_url.clone()),
        ("cancel_url".to_owned(), params.cancel_url.clone()),
        ("customer_email".to_owned(), params.customer_email.clone()),
        (
            "client_reference_id".to_owned(),
            params.client_reference_id.clone(),
        ),
    ];

    match &params.items {
        CheckoutItems::AdHoc(lines) => {
            for (i, line) in lines.iter().enumerate() {
                form.push((
                    format!("line_items[{i}][price_data][currency]"),
                    params.currency.gateway_code().to_owned(),
                ));
                form.push((
                    format!("line_items[{i}][price_data][product_data][name]"),
                    line.name.clone(),
                ));
                form.push((
                    format!("line_items[{i}][price_data][unit_amount]"),
                    line.unit_amount.to_string(),
                ));
                form.push((format!("line_items[{i}][quantity]"), line.quantity.to_string()));
            }
        }
        CheckoutItems::PriceReference { price_id, quantity } => {
            form.push(("line_items[0][price]".to_owned(), price_id.clone()));
            form.push(("line_items[0][quantity]".to_owned(), quantity.to_string()));
        }
    }

    form
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> GatewayClient {
        GatewayClient::new(&GatewayConfig {
            secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            webhook_secret: SecretString::from("whsec_8f2a1b3c4d5e6f708192a3b4c5d6e7f8"),
        })
        .unwrap()
    }

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let gw = client();
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = 1_700_000_000;
        let sig = sign("whsec_8f2a1b3c4d5e6f708192a3b4c5d6e7f8", now, payload);
        let header = format!("t={now},v1={sig}");

        assert!(gw.verify_webhook_at(payload, &header, now).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let gw = client();
        let now = 1_700_000_000;
        let sig = sign("whsec_8f2a1b3c4d5e6f708192a3b4c5d6e7f8", now, b"original");
        let header = format!("t={now},v1={sig}");

        assert!(matches!(
            gw.verify_webhook_at(b"tampered", &header, now),
            Err(GatewayError::InvalidSignature)
        ));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let gw = client();
        let payload = b"{}";
        let then = 1_700_000_000;
        let sig = sign("whsec_8f2a1b3c4d5e6f708192a3b4c5d6e7f8", then, payload);
        let header = format!("t={then},v1={sig}");

        let now = then + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(matches!(
            gw.verify_webhook_at(payload, &header, now),
            Err(GatewayError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_header_rejected() {
        let gw = client();
        for header in ["", "t=abc,v1=00", "v1=00", "t=1700000000", "nonsense"] {
            assert!(
                matches!(
                    gw.verify_webhook_at(b"{}", header, 1_700_000_000),
                    Err(GatewayError::InvalidSignature)
                ),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_one_valid_candidate_among_many() {
        let gw = client();
        let payload = b"{}";
        let now = 1_700_000_000;
        let good = sign("whsec_8f2a1b3c4d5e6f708192a3b4c5d6e7f8", now, payload);
        let header = format!("t={now},v1=deadbeef,v1={good}");

        assert!(gw.verify_webhook_at(payload, &header, now).is_ok());
    }

    #[test]
    fn test_ad_hoc_form_encoding() {
        let form = build_session_form(&CheckoutSessionParams {
            items: CheckoutItems::AdHoc(vec![
                CheckoutLine {
                    name: "Clementine Crate".to_owned(),
                    unit_amount: 1999,
                    quantity: 3,
                },
                CheckoutLine {
                    name: "Gift Wrap".to_owned(),
                    unit_amount: 500,
                    quantity: 1,
                },
            ]),
            currency: CurrencyCode::USD,
            success_url: "https://shop.test/success".to_owned(),
            cancel_url: "https://shop.test/cancel".to_owned(),
            customer_email: "shopper@example.com".to_owned(),
            client_reference_id: "42".to_owned(),
        });

        let get = |k: &str| {
            form.iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(
            get("line_items[0][price_data][unit_amount]"),
            Some("1999")
        );
        assert_eq!(get("line_items[0][quantity]"), Some("3"));
        assert_eq!(
            get("line_items[1][price_data][product_data][name]"),
            Some("Gift Wrap")
        );
        assert_eq!(get("line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(get("client_reference_id"), Some("42"));
    }

    #[test]
    fn test_price_reference_form_encoding() {
        let form = build_session_form(&CheckoutSessionParams {
            items: CheckoutItems::PriceReference {
                price_id: "price_1MoBy5LkdIwHu7ixZhnattbh".to_owned(),
                quantity: 2,
            },
            currency: CurrencyCode::USD,
            success_url: "https://shop.test/success".to_owned(),
            cancel_url: "https://shop.test/cancel".to_owned(),
            customer_email: "shopper@example.com".to_owned(),
            client_reference_id: "7".to_owned(),
        });

        let get = |k: &str| {
            form.iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(
            get("line_items[0][price]"),
            Some("price_1MoBy5LkdIwHu7ixZhnattbh")
        );
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert!(get("line_items[0][price_data][currency]").is_none());
    }
}
