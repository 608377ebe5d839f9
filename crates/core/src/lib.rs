//! Threadcart Core - Shared domain library.
//!
//! This crate provides the domain types and pure logic used across all
//! Threadcart components:
//! - `api` - REST API server (accounts, catalog, cart, checkout, orders)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Everything with a side effect lives in
//! the `api` crate; this keeps the order placement and inventory rules
//! testable without any infrastructure.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, order status state machine, actor roles
//! - [`pricing`] - Charge and settlement amount calculation
//! - [`product`] - Product model and per-size inventory arithmetic
//! - [`order`] - Immutable order records and the order factory
//! - [`cart`] - Cart line model
//! - [`address`] - Shipping address model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod order;
pub mod pricing;
pub mod product;
pub mod types;

pub use address::Address;
pub use cart::CartLine;
pub use order::{NewOrder, Order, PaymentDetails};
pub use pricing::{LineAmounts, line_amounts};
pub use product::{InventoryError, Product, ProductDescription, SizeStock, derive_availability};
pub use types::*;
