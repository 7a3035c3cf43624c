//! Integration tests for the shopping cart.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - A seeded catalog (clementine-cli seed -f fixtures/products.yaml)
//! - The API server running (cargo run -p clementine-api)
//!
//! Run with: cargo test -p clementine-integration-tests -- --ignored

use clementine_integration_tests::{api_base_url, signup};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Test helper: first product id in the catalog, `None` when it is empty.
async fn first_product_id(client: &Client) -> Option<i64> {
    let base_url = api_base_url();
    let resp = client
        .get(format!("{base_url}/products"))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::OK);

    let products: Value = resp.json().await.expect("Failed to parse product list");
    products
        .as_array()
        .and_then(|list| list.first())
        .and_then(|p| p.get("id"))
        .and_then(Value::as_i64)
}

/// Test helper: fetch the caller's cart as JSON.
async fn get_cart(client: &Client, token: &str) -> Value {
    let base_url = api_base_url();
    let resp = client
        .get(format!("{base_url}/cart"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse cart response")
}

fn line_quantity(cart: &Value, product_id: i64) -> Option<i64> {
    cart.get("items")?
        .as_array()?
        .iter()
        .find(|line| {
            line.get("product").and_then(|p| p.get("id")).and_then(Value::as_i64)
                == Some(product_id)
        })?
        .get("quantity")?
        .as_i64()
}

// ============================================================================
// Auth Gating Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_requires_token() {
    let client = Client::new();
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to request cart");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({"product_id": 1, "quantity": 1}))
        .send()
        .await
        .expect("Failed to attempt cart add");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Quantity Lifecycle Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server, database, and seeded catalog"]
async fn test_add_increment_decrement_to_zero() {
    let client = Client::new();
    let base_url = api_base_url();
    let Some(product_id) = first_product_id(&client).await else {
        return; // Empty catalog in this environment
    };
    let account = signup(&client).await;

    // A fresh account starts with an empty cart
    let cart = get_cart(&client, &account.token).await;
    assert_eq!(cart.get("items").and_then(Value::as_array).map(Vec::len), Some(0));

    // Add one unit
    let resp = client
        .post(format!("{base_url}/cart/add"))
        .bearer_auth(&account.token)
        .json(&json!({"product_id": product_id, "quantity": 1}))
        .send()
        .await
        .expect("Failed to add cart item");
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = resp.json().await.expect("Failed to parse cart response");
    assert_eq!(line_quantity(&cart, product_id), Some(1));

    // Bump it to two
    let resp = client
        .put(format!("{base_url}/cart/increment"))
        .bearer_auth(&account.token)
        .json(&json!({"product_id": product_id}))
        .send()
        .await
        .expect("Failed to increment cart item");
    assert_eq!(resp.status(), StatusCode::OK);
    let step: Value = resp.json().await.expect("Failed to parse quantity response");
    assert_eq!(step.get("quantity").and_then(Value::as_i64), Some(2));

    // Step back down to one, then to zero
    for expected in [1, 0] {
        let resp = client
            .put(format!("{base_url}/cart/decrement"))
            .bearer_auth(&account.token)
            .json(&json!({"product_id": product_id}))
            .send()
            .await
            .expect("Failed to decrement cart item");
        assert_eq!(resp.status(), StatusCode::OK);
        let step: Value = resp.json().await.expect("Failed to parse quantity response");
        assert_eq!(step.get("quantity").and_then(Value::as_i64), Some(expected));
    }

    // The zeroed line is gone, not lingering at quantity zero
    let cart = get_cart(&client, &account.token).await;
    assert_eq!(line_quantity(&cart, product_id), None);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and seeded catalog"]
async fn test_repeated_adds_accumulate() {
    let client = Client::new();
    let base_url = api_base_url();
    let Some(product_id) = first_product_id(&client).await else {
        return;
    };
    let account = signup(&client).await;

    for quantity in [2, 3] {
        let resp = client
            .post(format!("{base_url}/cart/add"))
            .bearer_auth(&account.token)
            .json(&json!({"product_id": product_id, "quantity": quantity}))
            .send()
            .await
            .expect("Failed to add cart item");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart = get_cart(&client, &account.token).await;
    assert_eq!(line_quantity(&cart, product_id), Some(5));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_add_unknown_product_rejected() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .bearer_auth(&account.token)
        .json(&json!({"product_id": 99_999_999, "quantity": 1}))
        .send()
        .await
        .expect("Failed to attempt cart add");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_add_zero_quantity_rejected() {
    let client = Client::new();
    let base_url = api_base_url();
    let account = signup(&client).await;

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .bearer_auth(&account.token)
        .json(&json!({"product_id": 1, "quantity": 0}))
        .send()
        .await
        .expect("Failed to attempt cart add");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Removal Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server, database, and seeded catalog"]
async fn test_remove_item_is_idempotent() {
    let client = Client::new();
    let base_url = api_base_url();
    let Some(product_id) = first_product_id(&client).await else {
        return;
    };
    let account = signup(&client).await;

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .bearer_auth(&account.token)
        .json(&json!({"product_id": product_id, "quantity": 2}))
        .send()
        .await
        .expect("Failed to add cart item");
    assert_eq!(resp.status(), StatusCode::OK);

    // Removing twice answers 200 both times
    for _ in 0..2 {
        let resp = client
            .delete(format!("{base_url}/cart/items/{product_id}"))
            .bearer_auth(&account.token)
            .send()
            .await
            .expect("Failed to remove cart item");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart = get_cart(&client, &account.token).await;
    assert_eq!(line_quantity(&cart, product_id), None);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and seeded catalog"]
async fn test_clear_cart_empties_it() {
    let client = Client::new();
    let base_url = api_base_url();
    let Some(product_id) = first_product_id(&client).await else {
        return;
    };
    let account = signup(&client).await;

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .bearer_auth(&account.token)
        .json(&json!({"product_id": product_id, "quantity": 4}))
        .send()
        .await
        .expect("Failed to add cart item");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base_url}/cart"))
        .bearer_auth(&account.token)
        .send()
        .await
        .expect("Failed to clear cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let cart = get_cart(&client, &account.token).await;
    assert_eq!(cart.get("items").and_then(Value::as_array).map(Vec::len), Some(0));
    assert_eq!(cart.get("subtotal").and_then(Value::as_str), Some("0"));
}
