//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Auth (rate limited)
//! POST /auth/signup            - Register
//! POST /auth/login             - Login
//! POST /auth/logout            - Logout
//!
//! # Users (requires auth)
//! GET    /users/me                   - Current user profile
//! POST   /users/me/merchant          - Become a seller
//! GET    /users/me/addresses         - List addresses
//! POST   /users/me/addresses         - Add address
//! PATCH  /users/me/addresses/{id}    - Update address
//! DELETE /users/me/addresses/{id}    - Delete address
//!
//! # Products
//! GET    /products                   - Search (public)
//! POST   /products                   - Create (seller)
//! GET    /products/merchant          - Seller's products (seller)
//! GET    /products/category/{id}     - By category (public)
//! GET    /products/{id}              - Detail (public)
//! DELETE /products/{id}              - Delete own product (seller)
//!
//! # Categories
//! GET    /categories                     - Full forest (public)
//! POST   /categories                     - Create path (seller)
//! POST   /categories/{id}/subcategories  - Add child (seller)
//! PATCH  /categories/{id}                - Rename (seller)
//! DELETE /categories/{id}                - Delete subtree (seller)
//!
//! # Cart (requires auth)
//! GET    /cart                 - Lines with product details
//! POST   /cart                 - Add line
//! PATCH  /cart/{product_id}    - Update line
//! DELETE /cart/{product_id}    - Remove line
//!
//! # Orders (requires auth)
//! POST  /orders                - Checkout: cart -> orders
//! GET   /orders                - Buyer's orders (admin: all)
//! GET   /orders/merchant       - Seller's incoming orders (seller)
//! GET   /orders/{id}           - Order detail
//! PATCH /orders/{id}/status    - Role-gated status transition
//!
//! # Payments (requires auth)
//! POST /payments/link          - Create payment link
//! GET  /payments/{payment_id}  - Captured status
//! ```

pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router, with its own rate limit.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the user profile / address book router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::me))
        .route("/me/merchant", post(users::become_merchant))
        .route(
            "/me/addresses",
            get(users::list_addresses).post(users::add_address),
        )
        .route(
            "/me/addresses/{id}",
            patch(users::update_address).delete(users::delete_address),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::search).post(products::create))
        .route("/merchant", get(products::merchant_list))
        .route("/category/{category_id}", get(products::by_category))
        .route("/{id}", get(products::get).delete(products::delete))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::forest).post(categories::create_path))
        .route("/{id}/subcategories", post(categories::add_subcategory))
        .route(
            "/{id}",
            patch(categories::rename).delete(categories::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::get).post(cart::add_line))
        .route(
            "/{product_id}",
            patch(cart::update_line).delete(cart::remove_line),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::place))
        .route("/merchant", get(orders::merchant_list))
        .route("/{id}", get(orders::get))
        .route("/{id}/status", patch(orders::update_status))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/link", post(payments::create_link))
        .route("/{payment_id}", get(payments::status))
}

/// Assemble the full application router (without the session layer; the
/// binary adds that so tests can supply their own).
///
/// The general per-IP rate limit covers every route here; the auth router
/// additionally carries its own stricter limit. Health endpoints are
/// mounted outside this router and stay unthrottled.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .layer(api_rate_limiter())
}
