//! Checkout orchestration.
//!
//! Converts a buyer's entire cart into orders, all-or-nothing. Stock
//! reservation, the order batch insert and the cart clear all happen in a
//! single store transaction, so a crash or failure mid-checkout can never
//! leave stock decremented without a matching order. Product reads during
//! line assembly give early, friendly errors; the conditional decrements
//! inside the commit are the authoritative check.
//!
//! Payment verification happens before this service is invoked; the
//! payment id arrives here already confirmed.

mod error;
mod store;

pub use error::CheckoutError;
pub use store::{CheckoutStore, PgCheckoutStore};

use chrono::Utc;
use tracing::info;

use threadcart_core::{line_amounts, AddressId, NewOrder, UserId};

use crate::db::CheckoutCommit;

/// Orchestrates the cart-to-orders workflow over a [`CheckoutStore`].
pub struct CheckoutService<S> {
    store: S,
}

impl<S: CheckoutStore> CheckoutService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Place orders for every line in the buyer's cart.
    ///
    /// Lines are processed in cart order (insertion order), so when two
    /// lines both fail, the error reported is always the first one. Each
    /// line becomes one order; the whole batch shares one order date and
    /// the same address snapshot.
    ///
    /// Returns the number of orders placed.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] if there is nothing to check out.
    /// - [`CheckoutError::AddressNotFound`] if `address_id` is not one of
    ///   the buyer's saved addresses.
    /// - [`CheckoutError::ProductNotFound`] / [`CheckoutError::SizeUnavailable`]
    ///   if a line cannot be satisfied; nothing is written in that case.
    /// - [`CheckoutError::Store`] on storage failure.
    pub async fn place_order(
        &self,
        buyer_id: UserId,
        address_id: AddressId,
        payment_id: &str,
    ) -> Result<u32, CheckoutError> {
        let lines = self.store.cart_lines(buyer_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let address = self
            .store
            .address(buyer_id, address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;

        let order_date = Utc::now();
        let mut orders: Vec<NewOrder> = Vec::with_capacity(lines.len());

        for line in &lines {
            let mut product = self
                .store
                .product(line.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;

            // Check the line against the product snapshot to fail fast on
            // stock that is already gone; the commit re-checks under its
            // transaction.
            if product.reserve(&line.size, line.quantity).is_err() {
                return Err(CheckoutError::SizeUnavailable {
                    product: line.product_id,
                    size: line.size.clone(),
                });
            }

            let amounts = line_amounts(product.price, product.discount_percent, line.quantity);
            orders.push(NewOrder::build(
                buyer_id,
                line,
                &product,
                &address,
                payment_id,
                amounts,
                order_date,
            ));
        }

        match self.store.commit(buyer_id, &lines, &orders).await? {
            CheckoutCommit::Placed(placed) => {
                info!(%buyer_id, orders = placed, "checkout committed");
                Ok(placed)
            }
            CheckoutCommit::ShortStock { product_id, size } => {
                Err(CheckoutError::SizeUnavailable {
                    product: product_id,
                    size,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use threadcart_core::{
        derive_availability, Address, CartLine, Order, OrderId, Product, ProductDescription,
        ProductId, SizeStock,
    };

    use crate::db::RepositoryError;

    use super::*;

    /// In-memory store mirroring the atomicity contract of the Postgres
    /// implementation: a commit reserves stock, appends orders and clears
    /// the cart under one lock, and applies nothing on failure.
    #[derive(Default)]
    struct MemStore {
        inner: Mutex<MemInner>,
    }

    #[derive(Default)]
    struct MemInner {
        carts: HashMap<UserId, Vec<CartLine>>,
        addresses: HashMap<(UserId, AddressId), Address>,
        products: HashMap<ProductId, Product>,
        orders: Vec<Order>,
        fail_commit: bool,
        /// A competing sale applied just before the commit runs, after the
        /// orchestrator has already read its product snapshots.
        preempt_sale: Option<CartLine>,
    }

    impl CheckoutStore for Arc<MemStore> {
        async fn cart_lines(&self, buyer_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.carts.get(&buyer_id).cloned().unwrap_or_default())
        }

        async fn address(
            &self,
            buyer_id: UserId,
            address_id: AddressId,
        ) -> Result<Option<Address>, RepositoryError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.addresses.get(&(buyer_id, address_id)).cloned())
        }

        async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.products.get(&id).cloned())
        }

        async fn commit(
            &self,
            buyer_id: UserId,
            lines: &[CartLine],
            orders: &[NewOrder],
        ) -> Result<CheckoutCommit, RepositoryError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_commit {
                return Err(RepositoryError::Conflict("simulated commit failure".into()));
            }
            if let Some(sale) = inner.preempt_sale.take() {
                inner
                    .products
                    .get_mut(&sale.product_id)
                    .unwrap()
                    .reserve(&sale.size, sale.quantity)
                    .unwrap();
            }

            // Reserve against a working copy; publish it only if every
            // line succeeds, like the transaction in the real store.
            let mut products = inner.products.clone();
            for line in lines {
                let short = match products.get_mut(&line.product_id) {
                    Some(product) => product.reserve(&line.size, line.quantity).is_err(),
                    None => true,
                };
                if short {
                    return Ok(CheckoutCommit::ShortStock {
                        product_id: line.product_id,
                        size: line.size.clone(),
                    });
                }
            }
            inner.products = products;

            for (i, order) in orders.iter().enumerate() {
                let order = order.clone();
                let next_id = i32::try_from(inner.orders.len()).unwrap() + 1 + i as i32;
                inner.orders.push(Order {
                    id: OrderId::new(next_id),
                    buyer_id: order.buyer_id,
                    seller_id: order.seller_id,
                    product_id: order.product_id,
                    size: order.size,
                    quantity: order.quantity,
                    address: order.address,
                    order_date: order.order_date,
                    status: order.status,
                    payment: order.payment,
                });
            }
            inner.carts.remove(&buyer_id);
            Ok(CheckoutCommit::Placed(u32::try_from(orders.len()).unwrap()))
        }
    }

    fn product(id: i32, seller: i32, price: i64, sizes: &[(&str, u32)]) -> Product {
        let sizes: Vec<SizeStock> = sizes
            .iter()
            .map(|(label, quantity)| SizeStock {
                label: (*label).to_owned(),
                quantity: *quantity,
            })
            .collect();
        let availability = derive_availability(&sizes);
        Product {
            id: ProductId::new(id),
            seller_id: UserId::new(seller),
            brand: "Loomcraft".to_owned(),
            name: format!("product {id}"),
            price,
            discount_percent: 0,
            sizes,
            tags: Vec::new(),
            description: ProductDescription {
                about: String::new(),
                manufactured: String::new(),
                packed: String::new(),
            },
            image_urls: Vec::new(),
            category_id: threadcart_core::CategoryId::new(1),
            categories: vec!["men".to_owned()],
            availability,
        }
    }

    fn address(id: i32) -> Address {
        Address {
            id: AddressId::new(id),
            name: "A. Buyer".to_owned(),
            phone: "9900112233".to_owned(),
            pincode: "560001".to_owned(),
            state: "Karnataka".to_owned(),
            city: "Bengaluru".to_owned(),
            house: "12".to_owned(),
            area: "MG Road".to_owned(),
        }
    }

    const BUYER: UserId = UserId::new(1);
    const ADDR: AddressId = AddressId::new(10);

    fn store_with(products: Vec<Product>, cart: Vec<CartLine>) -> Arc<MemStore> {
        let store = Arc::new(MemStore::default());
        {
            let mut inner = store.inner.lock().unwrap();
            for p in products {
                inner.products.insert(p.id, p);
            }
            inner.carts.insert(BUYER, cart);
            inner.addresses.insert((BUYER, ADDR), address(ADDR.as_i32()));
        }
        store
    }

    fn line(product: i32, size: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            size: size.to_owned(),
            quantity,
        }
    }

    #[tokio::test]
    async fn checkout_places_one_order_per_line_and_clears_cart() {
        let store = store_with(
            vec![
                product(1, 50, 1000, &[("M", 5)]),
                product(2, 51, 700, &[("L", 2)]),
            ],
            vec![line(1, "M", 2), line(2, "L", 1)],
        );
        let service = CheckoutService::new(Arc::clone(&store));

        let placed = service.place_order(BUYER, ADDR, "pay_1").await.unwrap();
        assert_eq!(placed, 2);

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.orders.len(), 2);
        assert!(!inner.carts.contains_key(&BUYER));
        assert_eq!(inner.products[&ProductId::new(1)].sizes[0].quantity, 3);
        assert_eq!(inner.products[&ProductId::new(2)].sizes[0].quantity, 1);
        // Seller ids come from the products, one shared order date.
        assert_eq!(inner.orders[0].seller_id, UserId::new(50));
        assert_eq!(inner.orders[1].seller_id, UserId::new(51));
        assert_eq!(inner.orders[0].order_date, inner.orders[1].order_date);
        assert!(inner.orders.iter().all(|o| o.payment.payment_id == "pay_1"));
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_and_repeat_checkout_fails() {
        let store = store_with(vec![product(1, 50, 1000, &[("M", 5)])], vec![line(1, "M", 1)]);
        let service = CheckoutService::new(Arc::clone(&store));

        service.place_order(BUYER, ADDR, "pay_1").await.unwrap();
        // The first checkout cleared the cart, so replaying the request
        // cannot double-place orders.
        let err = service.place_order(BUYER, ADDR, "pay_1").await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.orders.len(), 1);
        assert_eq!(inner.products[&ProductId::new(1)].sizes[0].quantity, 4);
    }

    #[tokio::test]
    async fn unknown_address_is_rejected_without_touching_stock() {
        let store = store_with(vec![product(1, 50, 1000, &[("M", 5)])], vec![line(1, "M", 1)]);
        let service = CheckoutService::new(Arc::clone(&store));

        let err = service
            .place_order(BUYER, AddressId::new(999), "pay_1")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::AddressNotFound));

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.products[&ProductId::new(1)].sizes[0].quantity, 5);
        assert!(inner.orders.is_empty());
    }

    #[tokio::test]
    async fn short_later_line_fails_the_checkout_without_any_write() {
        // Second line asks for more stock than exists; nothing may be
        // written for the first line either.
        let store = store_with(
            vec![
                product(1, 50, 1000, &[("M", 5)]),
                product(2, 51, 700, &[("L", 1)]),
            ],
            vec![line(1, "M", 2), line(2, "L", 3)],
        );
        let service = CheckoutService::new(Arc::clone(&store));

        let err = service.place_order(BUYER, ADDR, "pay_1").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::SizeUnavailable { product, ref size }
                if product == ProductId::new(2) && size == "L"
        ));

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.products[&ProductId::new(1)].sizes[0].quantity, 5);
        assert_eq!(inner.products[&ProductId::new(2)].sizes[0].quantity, 1);
        assert!(inner.orders.is_empty());
        assert!(inner.carts.contains_key(&BUYER));
    }

    #[tokio::test]
    async fn deleted_product_fails_the_whole_checkout() {
        let store = store_with(
            vec![product(1, 50, 1000, &[("M", 5)])],
            vec![line(1, "M", 1), line(2, "M", 1)],
        );
        let service = CheckoutService::new(Arc::clone(&store));

        let err = service.place_order(BUYER, ADDR, "pay_1").await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound(p) if p == ProductId::new(2)));

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.products[&ProductId::new(1)].sizes[0].quantity, 5);
        assert!(inner.orders.is_empty());
    }

    #[tokio::test]
    async fn first_failing_line_in_cart_order_wins() {
        // Both lines fail; the reported error is the earlier cart line.
        let store = store_with(
            vec![product(1, 50, 1000, &[("M", 0)])],
            vec![line(1, "M", 1), line(99, "M", 1)],
        );
        let service = CheckoutService::new(Arc::clone(&store));

        let err = service.place_order(BUYER, ADDR, "pay_1").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::SizeUnavailable { product, .. } if product == ProductId::new(1)
        ));
    }

    #[tokio::test]
    async fn failed_commit_leaves_stock_orders_and_cart_untouched() {
        // The commit is the only write; when it fails, there is no
        // half-applied state to clean up and no stock can leak.
        let store = store_with(
            vec![
                product(1, 50, 1000, &[("M", 5)]),
                product(2, 51, 700, &[("L", 2)]),
            ],
            vec![line(1, "M", 2), line(2, "L", 1)],
        );
        store.inner.lock().unwrap().fail_commit = true;
        let service = CheckoutService::new(Arc::clone(&store));

        let err = service.place_order(BUYER, ADDR, "pay_1").await.unwrap_err();
        assert!(matches!(err, CheckoutError::Store(_)));

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.products[&ProductId::new(1)].sizes[0].quantity, 5);
        assert_eq!(inner.products[&ProductId::new(2)].sizes[0].quantity, 2);
        assert!(inner.orders.is_empty());
        assert!(inner.carts.contains_key(&BUYER));
    }

    #[tokio::test]
    async fn stock_taken_between_read_and_commit_is_caught_atomically() {
        // Another sale lands after the orchestrator reads its product
        // snapshots. The commit's own reservation must catch the shortage
        // and apply nothing for this buyer.
        let store = store_with(vec![product(1, 50, 1000, &[("M", 3)])], vec![line(1, "M", 2)]);
        store.inner.lock().unwrap().preempt_sale = Some(line(1, "M", 2));
        let service = CheckoutService::new(Arc::clone(&store));

        let err = service.place_order(BUYER, ADDR, "pay_1").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::SizeUnavailable { product, .. } if product == ProductId::new(1)
        ));

        let inner = store.inner.lock().unwrap();
        // Only the competing sale persisted.
        assert_eq!(inner.products[&ProductId::new(1)].sizes[0].quantity, 1);
        assert!(inner.orders.is_empty());
        assert!(inner.carts.contains_key(&BUYER));
    }

    #[tokio::test]
    async fn concurrent_buyers_cannot_oversell_a_size() {
        // Three units of one size, two buyers each wanting two. Exactly
        // one checkout can succeed.
        let store = Arc::new(MemStore::default());
        {
            let mut inner = store.inner.lock().unwrap();
            inner.products.insert(ProductId::new(1), product(1, 50, 1000, &[("M", 3)]));
            for buyer in [1, 2] {
                let buyer_id = UserId::new(buyer);
                inner.carts.insert(buyer_id, vec![line(1, "M", 2)]);
                inner.addresses.insert((buyer_id, ADDR), address(ADDR.as_i32()));
            }
        }

        let mut tasks = Vec::new();
        for buyer in [1, 2] {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                CheckoutService::new(store)
                    .place_order(UserId::new(buyer), ADDR, "pay_x")
                    .await
            }));
        }
        let mut oks = 0;
        let mut unavailable = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => oks += 1,
                Err(CheckoutError::SizeUnavailable { .. }) => unavailable += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((oks, unavailable), (1, 1));

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.products[&ProductId::new(1)].sizes[0].quantity, 1);
        assert_eq!(inner.orders.len(), 1);
    }
}
