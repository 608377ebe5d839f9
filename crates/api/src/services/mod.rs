//! Business logic services.
//!
//! Services sit between the HTTP handlers and the repositories: handlers
//! parse and authenticate, services decide, repositories persist.
//!
//! - [`auth`] - Registration and login with Argon2id password hashing
//! - [`checkout`] - Cart-to-orders workflow with all-or-nothing stock reservation
//! - [`orders`] - Role-gated order status transitions
//! - [`payments`] - Razorpay payment link client

pub mod auth;
pub mod checkout;
pub mod orders;
pub mod payments;
