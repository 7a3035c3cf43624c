//! Integration tests for admin role gating and product management.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p clementine-api)
//! - For the CRUD tests: `ADMIN_EMAIL` / `ADMIN_PASSWORD` for an account that
//!   has been granted the admin role (clementine-cli grant-admin)
//!
//! Run with: cargo test -p clementine-integration-tests -- --ignored

use clementine_integration_tests::{api_base_url, signup};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Test helper: log in with `ADMIN_EMAIL`/`ADMIN_PASSWORD`, `None` when the
/// environment does not provide admin credentials.
async fn admin_token(client: &Client) -> Option<String> {
    let email = std::env::var("ADMIN_EMAIL").ok()?;
    let password = std::env::var("ADMIN_PASSWORD").ok()?;

    let base_url = api_base_url();
    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("Failed to log in as admin");
    assert_eq!(resp.status(), StatusCode::OK, "admin login failed");

    let body: Value = resp.json().await.expect("Failed to parse login response");
    body.get("token")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

// ============================================================================
// Role Gating Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_routes_require_token() {
    let client = Client::new();
    let base_url = api_base_url();

    for (method, path) in [
        (reqwest::Method::POST, "/admin/products"),
        (reqwest::Method::PUT, "/admin/products/1"),
        (reqwest::Method::DELETE, "/admin/products/1"),
        (reqwest::Method::GET, "/admin/orders"),
        (reqwest::Method::GET, "/admin/users"),
        (reqwest::Method::GET, "/admin/product-requests"),
    ] {
        let resp = client
            .request(method.clone(), format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to request admin route");
        assert_eq!(
            resp.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {path} answered without a token"
        );
    }
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_routes_reject_plain_users() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    for (method, path) in [
        (reqwest::Method::POST, "/admin/products"),
        (reqwest::Method::PUT, "/admin/products/1"),
        (reqwest::Method::DELETE, "/admin/products/1"),
        (reqwest::Method::GET, "/admin/orders"),
        (reqwest::Method::GET, "/admin/users"),
        (reqwest::Method::GET, "/admin/product-requests"),
    ] {
        let resp = client
            .request(method.clone(), format!("{base_url}{path}"))
            .bearer_auth(&account.token)
            .send()
            .await
            .expect("Failed to request admin route");
        assert_eq!(
            resp.status(),
            StatusCode::FORBIDDEN,
            "{method} {path} let a plain user through"
        );
    }
}

// ============================================================================
// Product CRUD Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_admin_product_lifecycle() {
    let client = Client::new();
    let base_url = api_base_url();
    let Some(token) = admin_token(&client).await else {
        return; // No admin credentials in this environment
    };

    // Create
    let name = format!("Integration Crate {}", Uuid::new_v4().simple());
    let resp = client
        .post(format!("{base_url}/admin/products"))
        .bearer_auth(&token)
        .json(&json!({
            "name": name,
            "description": "A crate created by the integration suite.",
            "price": "19.99",
            "stock": 12,
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: Value = resp.json().await.expect("Failed to parse product response");
    let product_id = created
        .get("id")
        .and_then(Value::as_i64)
        .expect("created product has no id");

    // The new product is publicly visible
    let resp = client
        .get(format!("{base_url}/products/{product_id}"))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::OK);

    // Update
    let resp = client
        .put(format!("{base_url}/admin/products/{product_id}"))
        .bearer_auth(&token)
        .json(&json!({
            "name": name,
            "description": "Updated by the integration suite.",
            "price": "24.99",
            "stock": 8,
        }))
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::OK);

    let updated: Value = resp.json().await.expect("Failed to parse product response");
    assert_eq!(updated.get("price").and_then(Value::as_str), Some("24.99"));
    assert_eq!(updated.get("stock").and_then(Value::as_i64), Some(8));

    // Delete, then the public detail 404s
    let resp = client
        .delete(format!("{base_url}/admin/products/{product_id}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base_url}/products/{product_id}"))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_admin_presale_requires_future_release_date() {
    let client = Client::new();
    let base_url = api_base_url();
    let Some(token) = admin_token(&client).await else {
        return;
    };

    // Presale without a release date is rejected
    let resp = client
        .post(format!("{base_url}/admin/products"))
        .bearer_auth(&token)
        .json(&json!({
            "name": format!("Presale {}", Uuid::new_v4().simple()),
            "price": "9.99",
            "stock": 0,
            "presale": true,
        }))
        .send()
        .await
        .expect("Failed to attempt product create");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // As is a release date already behind us
    let resp = client
        .post(format!("{base_url}/admin/products"))
        .bearer_auth(&token)
        .json(&json!({
            "name": format!("Presale {}", Uuid::new_v4().simple()),
            "price": "9.99",
            "stock": 0,
            "presale": true,
            "release_date": "2020-01-01",
        }))
        .send()
        .await
        .expect("Failed to attempt product create");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_admin_order_listing_includes_gateway_references() {
    let client = Client::new();
    let base_url = api_base_url();
    let Some(token) = admin_token(&client).await else {
        return;
    };

    let resp = client
        .get(format!("{base_url}/admin/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);

    let orders: Value = resp.json().await.expect("Failed to parse order list");
    let orders = orders.as_array().expect("order list is not an array");

    // Unlike the shopper view, the admin view carries the gateway fields
    if let Some(order) = orders.first() {
        assert!(order.get("user_id").is_some());
        assert!(order.as_object().is_some_and(|o| o.contains_key("payment_reference")));
        assert!(
            order
                .as_object()
                .is_some_and(|o| o.contains_key("checkout_session_id"))
        );
    }
}
