//! The identity acting on an order or checkout call.
//!
//! Request handlers resolve the session to an [`Actor`] and thread it
//! explicitly into every core operation; no identity is ever pulled from
//! ambient request state.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The role under which a status transition or checkout is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => f.write_str("buyer"),
            Self::Seller => f.write_str("seller"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// An authenticated principal with its role flags.
///
/// Role flags come from the identity provider and are trusted as-is. A user
/// can hold both flags; the effective [`Role`] for an operation depends on
/// the entity being acted on (e.g. a seller is only a seller for orders they
/// fulfil), so resolution lives with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub is_seller: bool,
    pub is_admin: bool,
}

impl Actor {
    /// An actor with no elevated flags.
    #[must_use]
    pub const fn buyer(user_id: UserId) -> Self {
        Self {
            user_id,
            is_seller: false,
            is_admin: false,
        }
    }
}
