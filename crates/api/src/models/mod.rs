//! API-side models: account rows and session keys.
//!
//! Domain entities (products, orders, carts, addresses) live in
//! `threadcart-core`; this module holds what is specific to the HTTP
//! layer and its Postgres rows.

pub mod user;

pub use user::{AddressFields, User};

/// Session storage keys.
pub mod session_keys {
    /// The logged-in user's id, set at login and cleared at logout.
    pub const CURRENT_USER_ID: &str = "current_user_id";
}
