//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (verifies database)
//!
//! # Auth
//! POST /auth/signup                  - Create an account, returns token
//! POST /auth/login                   - Exchange credentials for a token
//! GET  /auth/me                      - Current user record
//! PUT  /auth/profile                 - Update profile fields
//! POST /auth/password-reset/request  - Mail a reset token (always 202)
//! POST /auth/password-reset/confirm  - Set a new password with a token
//!
//! # Catalog
//! GET  /products               - Product listing
//! GET  /products/{id}          - Product detail
//!
//! # Cart (requires auth)
//! GET    /cart                     - Cart contents with subtotal
//! DELETE /cart                     - Clear the cart
//! POST   /cart/add                 - Add a product (upsert, increments)
//! PUT    /cart/increment           - Bump a line's quantity by one
//! PUT    /cart/decrement           - Drop by one; zero removes the line
//! DELETE /cart/items/{product_id}  - Remove a line (idempotent)
//!
//! # Checkout & orders (requires auth)
//! POST /checkout               - Open a hosted checkout session
//! GET  /orders                 - Caller's order history
//! GET  /orders/{id}            - Order detail with line items
//!
//! # Payment gateway
//! POST /stripe/webhook         - Signed gateway events (no auth; HMAC)
//!
//! # Marketing
//! POST /contact                - Contact form (persist, then forward)
//! POST /product-requests       - "Stock this product" (auth optional)
//!
//! # Admin (requires role `admin`)
//! POST   /admin/products           - Create a product
//! PUT    /admin/products/{id}      - Replace a product
//! DELETE /admin/products/{id}      - Delete a product
//! GET    /admin/orders             - All orders
//! GET    /admin/users              - All accounts
//! GET    /admin/product-requests   - All product requests
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod orders;
pub mod products;
pub mod webhook;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/profile", put(auth::update_profile))
        .route(
            "/password-reset/request",
            post(auth::password_reset_request),
        )
        .route(
            "/password-reset/confirm",
            post(auth::password_reset_confirm),
        )
}

/// Create the public catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list_products))
        .route("/{id}", get(products::get_product))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::view_cart).delete(cart::clear_cart))
        .route("/add", post(cart::add_item))
        .route("/increment", put(cart::increment_item))
        .route("/decrement", put(cart::decrement_item))
        .route("/items/{product_id}", delete(cart::remove_item))
}

/// Create the order history routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_orders))
        .route("/{id}", get(orders::get_order))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/orders", get(admin::list_all_orders))
        .route("/users", get(admin::list_users))
        .route("/product-requests", get(admin::list_product_requests))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
        .route("/checkout", post(checkout::create_checkout))
        .route("/stripe/webhook", post(webhook::stripe_webhook))
        .route("/contact", post(contact::submit_contact))
        .route("/product-requests", post(contact::submit_product_request))
}
