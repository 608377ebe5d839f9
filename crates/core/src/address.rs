//! Shipping address model.

use serde::{Deserialize, Serialize};

use crate::types::AddressId;

/// A saved shipping address.
///
/// All fields are required; no validation is applied beyond presence.
/// Orders embed a deep copy of the address (see [`crate::order`]), so a
/// buyer editing or deleting a saved address never changes where an
/// existing order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub name: String,
    pub phone: String,
    pub pincode: String,
    pub state: String,
    pub city: String,
    pub house: String,
    pub area: String,
}
