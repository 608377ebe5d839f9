//! Core types for Threadcart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod actor;
pub mod id;
pub mod status;

pub use actor::{Actor, Role};
pub use id::*;
pub use status::{OrderStatus, PaymentStatus, TransitionError};
