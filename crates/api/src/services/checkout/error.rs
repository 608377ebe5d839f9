use thiserror::Error;
use threadcart_core::ProductId;

use crate::db::RepositoryError;

/// Errors from the checkout workflow.
///
/// Every variant leaves the system untouched: stock counts, orders and
/// the cart are exactly as they were before the attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The buyer's cart has no lines. Checkout is a no-op; a repeated
    /// request after a successful checkout lands here.
    #[error("cart is empty")]
    EmptyCart,

    /// The chosen shipping address does not exist or belongs to someone
    /// else.
    #[error("address not found")]
    AddressNotFound,

    /// A cart line points at a product that no longer exists.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A cart line asks for more units of a size than are in stock, or
    /// names a size the product does not carry.
    #[error("size {size:?} of product {product} is unavailable in the requested quantity")]
    SizeUnavailable { product: ProductId, size: String },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}
