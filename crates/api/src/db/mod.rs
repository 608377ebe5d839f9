//! Database operations for the Threadcart `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - Accounts with role flags (`is_seller`, `is_admin`)
//! - `addresses` - Saved shipping addresses per user
//! - `categories` - Category tree (adjacency list, max depth 3)
//! - `products` / `product_sizes` - Catalog and per-size stock counters
//! - `cart_lines` - One row per (user, product) in a buyer's cart
//! - `orders` - Immutable order records with embedded address snapshots
//! - `sessions` - tower-sessions storage
//!
//! All queries use the runtime-checked sqlx API; repositories borrow the
//! shared [`PgPool`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p threadcart-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod carts;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use orders::{CheckoutCommit, OrderRepository};
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness or state conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data failed to parse back into a domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
