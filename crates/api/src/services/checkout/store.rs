//! Storage seam for the checkout workflow.
//!
//! Checkout touches carts, addresses, products and orders; this trait
//! collects exactly the operations it needs so the orchestrator can be
//! exercised against an in-memory store in tests.

use sqlx::PgPool;

use threadcart_core::{Address, AddressId, CartLine, NewOrder, Product, ProductId, UserId};

use crate::db::{
    CartRepository, CheckoutCommit, OrderRepository, ProductRepository, RepositoryError,
    UserRepository,
};

/// The storage operations checkout depends on.
pub trait CheckoutStore {
    async fn cart_lines(&self, buyer_id: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    async fn address(
        &self,
        buyer_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>, RepositoryError>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Reserve stock for every line, persist the order batch and clear the
    /// buyer's cart as one atomic unit.
    ///
    /// This is the authoritative stock check, not the earlier reads: lines
    /// are reserved in order and the first short line yields
    /// [`CheckoutCommit::ShortStock`] with nothing applied.
    async fn commit(
        &self,
        buyer_id: UserId,
        lines: &[CartLine],
        orders: &[NewOrder],
    ) -> Result<CheckoutCommit, RepositoryError>;
}

/// Production store backed by the Postgres repositories.
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CheckoutStore for PgCheckoutStore {
    async fn cart_lines(&self, buyer_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        CartRepository::new(&self.pool).lines(buyer_id).await
    }

    async fn address(
        &self,
        buyer_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_address(buyer_id, address_id)
            .await
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get(id).await
    }

    async fn commit(
        &self,
        buyer_id: UserId,
        lines: &[CartLine],
        orders: &[NewOrder],
    ) -> Result<CheckoutCommit, RepositoryError> {
        OrderRepository::new(&self.pool)
            .commit_checkout(buyer_id, lines, orders)
            .await
    }
}
