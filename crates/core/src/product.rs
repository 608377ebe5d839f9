//! Product model and per-size inventory arithmetic.
//!
//! Stock is tracked per size label. The `availability` flag is derived
//! state: it is true iff at least one size has stock, and must be
//! recomputed after every mutation. [`Product::reserve`] and
//! [`Product::release`] keep that invariant; the Postgres repository
//! mirrors the same rules in SQL.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CategoryId, ProductId, UserId};

/// Stock counter for one size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    /// Size label, unique within a product (e.g. "S", "M", "XL").
    pub label: String,
    /// Units in stock, never negative.
    pub quantity: u32,
}

/// Free-text description sections of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescription {
    pub about: String,
    pub manufactured: String,
    pub packed: String,
}

/// A catalog product owned by a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: UserId,
    pub brand: String,
    pub name: String,
    /// Price in minor currency units.
    pub price: i64,
    /// Discount percentage, 0-100.
    pub discount_percent: u8,
    /// Ordered size list; labels are unique within the product.
    pub sizes: Vec<SizeStock>,
    pub tags: Vec<String>,
    pub description: ProductDescription,
    pub image_urls: Vec<String>,
    pub category_id: CategoryId,
    /// Denormalized category path names, root first.
    pub categories: Vec<String>,
    /// Derived: true iff any size has stock.
    pub availability: bool,
}

/// Failures while reserving stock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The product id did not resolve.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The size label is absent, or has less stock than requested.
    #[error("size {size:?} of product {product} is not available in the requested quantity")]
    SizeUnavailable { product: ProductId, size: String },
}

/// Derive the availability flag from a size list.
#[must_use]
pub fn derive_availability(sizes: &[SizeStock]) -> bool {
    sizes.iter().any(|size| size.quantity > 0)
}

impl Product {
    /// Reserve `quantity` units of `size`, returning the remaining stock.
    ///
    /// Decrements the matching size counter and recomputes `availability`.
    /// The product is unchanged on failure.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::SizeUnavailable`] if the label is absent
    /// from the size list or its stock is strictly less than `quantity`.
    pub fn reserve(&mut self, size: &str, quantity: u32) -> Result<u32, InventoryError> {
        let entry = self
            .sizes
            .iter_mut()
            .find(|stock| stock.label == size)
            .filter(|stock| stock.quantity >= quantity)
            .ok_or_else(|| InventoryError::SizeUnavailable {
                product: self.id,
                size: size.to_owned(),
            })?;

        entry.quantity -= quantity;
        let remaining = entry.quantity;
        self.availability = derive_availability(&self.sizes);
        Ok(remaining)
    }

    /// Restore `quantity` units of `size` after a failed checkout.
    ///
    /// The compensating inverse of [`Product::reserve`]; also recomputes
    /// `availability`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::SizeUnavailable`] if the label is absent,
    /// which indicates the size list was mutated underneath the caller.
    pub fn release(&mut self, size: &str, quantity: u32) -> Result<(), InventoryError> {
        let entry = self
            .sizes
            .iter_mut()
            .find(|stock| stock.label == size)
            .ok_or_else(|| InventoryError::SizeUnavailable {
                product: self.id,
                size: size.to_owned(),
            })?;

        entry.quantity += quantity;
        self.availability = derive_availability(&self.sizes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt(sizes: &[(&str, u32)]) -> Product {
        Product {
            id: ProductId::new(1),
            seller_id: UserId::new(9),
            brand: "Loomcraft".to_owned(),
            name: "Oxford shirt".to_owned(),
            price: 1000,
            discount_percent: 0,
            sizes: sizes
                .iter()
                .map(|(label, quantity)| SizeStock {
                    label: (*label).to_owned(),
                    quantity: *quantity,
                })
                .collect(),
            tags: vec!["shirt".to_owned()],
            description: ProductDescription {
                about: "Plain weave".to_owned(),
                manufactured: "Loomcraft Mills".to_owned(),
                packed: "Loomcraft Mills".to_owned(),
            },
            image_urls: Vec::new(),
            category_id: CategoryId::new(3),
            categories: vec!["men".to_owned(), "shirts".to_owned()],
            availability: true,
        }
    }

    #[test]
    fn reserve_decrements_and_reports_remaining() {
        let mut product = shirt(&[("S", 5), ("M", 2)]);
        assert_eq!(product.reserve("S", 3), Ok(2));
        assert_eq!(product.reserve("S", 2), Ok(0));
        assert!(product.availability, "M still has stock");
    }

    #[test]
    fn stock_conservation_over_a_sequence_of_reserves() {
        let mut product = shirt(&[("M", 10)]);
        let reservations = [3_u32, 1, 4];
        for n in reservations {
            product.reserve("M", n).unwrap();
        }
        let total: u32 = reservations.iter().sum();
        assert_eq!(product.sizes[0].quantity, 10 - total);
    }

    #[test]
    fn reserve_fails_on_unknown_size() {
        let mut product = shirt(&[("S", 5)]);
        let err = product.reserve("XXL", 1).unwrap_err();
        assert!(matches!(err, InventoryError::SizeUnavailable { .. }));
        assert_eq!(product.sizes[0].quantity, 5);
    }

    #[test]
    fn reserve_fails_on_insufficient_stock_without_mutating() {
        let mut product = shirt(&[("S", 2)]);
        assert!(product.reserve("S", 3).is_err());
        assert_eq!(product.sizes[0].quantity, 2);
        assert!(product.availability);
    }

    #[test]
    fn availability_follows_stock_through_reserve_and_release() {
        let mut product = shirt(&[("S", 1), ("M", 0)]);
        product.reserve("S", 1).unwrap();
        assert!(!product.availability);

        product.release("S", 1).unwrap();
        assert!(product.availability);
    }

    #[test]
    fn derive_availability_is_any_size_in_stock() {
        assert!(!derive_availability(&[]));
        assert!(!derive_availability(&[SizeStock {
            label: "S".to_owned(),
            quantity: 0,
        }]));
        assert!(derive_availability(&[
            SizeStock {
                label: "S".to_owned(),
                quantity: 0,
            },
            SizeStock {
                label: "M".to_owned(),
                quantity: 1,
            },
        ]));
    }
}
