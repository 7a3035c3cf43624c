//! Integration tests for the Clementine API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! docker compose up -d db
//! cargo run -p clementine-cli -- migrate
//!
//! # Start the API server
//! cargo run -p clementine-api
//!
//! # Run the ignored integration suite
//! cargo test -p clementine-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `API_BASE_URL` - base URL of the running API (default `http://localhost:8000`)
//! - `STRIPE_WEBHOOK_SECRET` - must match the server's webhook secret so the
//!   webhook tests can produce valid signatures
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - credentials of an account that has been
//!   granted the admin role (`clementine-cli grant-admin`); admin CRUD tests
//!   skip themselves when these are unset
//!
//! Each test signs up its own throwaway account, so the suite can run
//! repeatedly against the same database without cleanup between runs.

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Webhook signing secret, matching the server's `STRIPE_WEBHOOK_SECRET`.
#[must_use]
pub fn webhook_secret() -> String {
    std::env::var("STRIPE_WEBHOOK_SECRET")
        .unwrap_or_else(|_| "whsec_integration_test_secret".to_string())
}

/// A throwaway account created for a single test.
pub struct TestAccount {
    pub token: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Sign up a fresh account and return its bearer token.
///
/// # Panics
///
/// Panics if the server is unreachable or signup does not answer 201.
pub async fn signup(client: &Client) -> TestAccount {
    let base_url = api_base_url();
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("shopper-{suffix}");
    let email = format!("{username}@example.com");
    let password = "correct horse battery staple".to_string();

    let resp = client
        .post(format!("{base_url}/auth/signup"))
        .json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Failed to sign up test account");
    assert_eq!(resp.status(), 201, "signup failed");

    let body: Value = resp.json().await.expect("Failed to parse signup response");
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .expect("signup response has no token")
        .to_string();

    TestAccount {
        token,
        username,
        email,
        password,
    }
}

/// Sign a webhook payload the way the gateway does: HMAC-SHA256 over
/// `"{t}.{body}"`, delivered as a `t=...,v1=...` header value.
///
/// # Panics
///
/// Panics only if HMAC rejects the key, which it never does for any length.
#[must_use]
pub fn sign_webhook(payload: &[u8]) -> String {
    let timestamp = Utc::now().timestamp();
    let mut mac = Hmac::<sha2::Sha256>::new_from_slice(webhook_secret().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}
