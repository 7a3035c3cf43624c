//! Integration tests for signup, login, and profile management.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p clementine-api)
//!
//! Run with: cargo test -p clementine-integration-tests -- --ignored

use clementine_integration_tests::{api_base_url, signup};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

// ============================================================================
// Signup & Login Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_signup_login_me_roundtrip() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    // Fresh credentials log in
    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({"email": account.email, "password": account.password}))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse login response");
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .expect("login response has no token");

    // The token resolves to the account it was issued for
    let resp = client
        .get(format!("{base_url}/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to get current user");
    assert_eq!(resp.status(), StatusCode::OK);

    let me: Value = resp.json().await.expect("Failed to parse user response");
    assert_eq!(me.get("email").and_then(Value::as_str), Some(account.email.as_str()));
    assert_eq!(
        me.get("username").and_then(Value::as_str),
        Some(account.username.as_str())
    );
    let roles = me
        .get("roles")
        .and_then(Value::as_array)
        .expect("user response has no roles");
    assert!(roles.contains(&json!("user")));
    assert!(!roles.contains(&json!("admin")));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_wrong_password_rejected() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({"email": account.email, "password": "not the password"}))
        .send()
        .await
        .expect("Failed to attempt login");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_email_conflicts() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    let resp = client
        .post(format!("{base_url}/auth/signup"))
        .json(&json!({
            "username": format!("other-{}", Uuid::new_v4().simple()),
            "email": account.email,
            "password": "another perfectly fine password",
        }))
        .send()
        .await
        .expect("Failed to attempt duplicate signup");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

// ============================================================================
// Token Gating Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_me_requires_token() {
    let client = Client::new();
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/auth/me"))
        .send()
        .await
        .expect("Failed to request current user");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_garbage_token_rejected() {
    let client = Client::new();
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/auth/me"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .expect("Failed to request current user");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Profile Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_update_roundtrip() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    let resp = client
        .put(format!("{base_url}/auth/profile"))
        .bearer_auth(&account.token)
        .json(&json!({
            "full_name": "Pat Shopper",
            "city": "Lisbon",
            "country": "PT",
        }))
        .send()
        .await
        .expect("Failed to update profile");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse profile response");
    assert_eq!(body.get("full_name").and_then(Value::as_str), Some("Pat Shopper"));
    assert_eq!(body.get("city").and_then(Value::as_str), Some("Lisbon"));
    // Fields not sent stay unset
    assert!(body.get("address").and_then(Value::as_str).is_none());
}

// ============================================================================
// Password Reset Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_password_reset_request_never_reveals_accounts() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    // Same answer for a registered address, an unknown one, and garbage
    for email in [
        account.email.as_str(),
        "nobody-here@example.com",
        "not-an-email",
    ] {
        let resp = client
            .post(format!("{base_url}/auth/password-reset/request"))
            .json(&json!({"email": email}))
            .send()
            .await
            .expect("Failed to request password reset");
        assert_eq!(resp.status(), StatusCode::ACCEPTED, "email {email:?}");
    }
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_password_reset_confirm_rejects_login_tokens() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    // A session token is not a reset token, even though both are JWTs
    let resp = client
        .post(format!("{base_url}/auth/password-reset/confirm"))
        .json(&json!({"token": account.token, "password": "a brand new password"}))
        .send()
        .await
        .expect("Failed to attempt password reset confirm");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
