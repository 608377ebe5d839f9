//! Cart line model.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One product+size+quantity entry in a buyer's pending selection.
///
/// A buyer's cart holds at most one line per product; that is enforced when
/// the line is inserted, not at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: String,
    /// Always at least 1.
    pub quantity: u32,
}
