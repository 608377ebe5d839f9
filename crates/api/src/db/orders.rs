//! Order repository.
//!
//! Orders are written once, as a batch, in the same transaction that
//! reserves the stock and clears the buyer's cart; a half-applied checkout
//! (decremented stock without an order, orders without a cleared cart)
//! cannot occur. After that only the status columns change, and those via
//! compare-and-swap on the previous status.
//!
//! Order rows embed their address snapshot and reference products without a
//! foreign key: a seller deleting a listing must not disturb order history.

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use threadcart_core::{
    Address, CartLine, NewOrder, Order, OrderId, OrderStatus, PaymentDetails, ProductId, UserId,
};

use super::RepositoryError;
use super::products::reserve_line;

/// Outcome of a checkout commit.
#[derive(Debug)]
pub enum CheckoutCommit {
    /// Every line was reserved and written; carries the order count.
    Placed(u32),
    /// A line could not be reserved. The transaction was rolled back, so no
    /// stock moved, no order was written and the cart is intact.
    ShortStock { product_id: ProductId, size: String },
}

/// The product fields shown next to an order in listings.
///
/// `None` at the call site when the listing has since been deleted.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: i64,
    pub image_urls: Vec<String>,
}

/// An order joined with the product it was placed for.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithProduct {
    pub order: Order,
    pub product: Option<ProductSummary>,
}

const ORDER_COLUMNS: &str = r"
    o.id, o.buyer_id, o.seller_id, o.product_id, o.size, o.quantity,
    o.addr_name, o.addr_phone, o.addr_pincode, o.addr_state, o.addr_city,
    o.addr_house, o.addr_area, o.order_date, o.status,
    o.payment_id, o.amount, o.merchant_receive, o.payment_status
";

fn order_from_row(row: &PgRow) -> Result<Order, RepositoryError> {
    let status: String = row.try_get("status")?;
    let status: OrderStatus = status
        .parse()
        .map_err(RepositoryError::DataCorruption)?;
    let payment_status: String = row.try_get("payment_status")?;
    let payment_status = payment_status
        .parse()
        .map_err(RepositoryError::DataCorruption)?;
    let quantity: i32 = row.try_get("quantity")?;

    Ok(Order {
        id: row.try_get("id")?,
        buyer_id: row.try_get("buyer_id")?,
        seller_id: row.try_get("seller_id")?,
        product_id: row.try_get("product_id")?,
        size: row.try_get("size")?,
        quantity: u32::try_from(quantity)
            .map_err(|_| RepositoryError::DataCorruption(format!("order quantity {quantity}")))?,
        address: Address {
            // Snapshot columns carry no address-book id.
            id: threadcart_core::AddressId::new(0),
            name: row.try_get("addr_name")?,
            phone: row.try_get("addr_phone")?,
            pincode: row.try_get("addr_pincode")?,
            state: row.try_get("addr_state")?,
            city: row.try_get("addr_city")?,
            house: row.try_get("addr_house")?,
            area: row.try_get("addr_area")?,
        },
        order_date: row.try_get("order_date")?,
        status,
        payment: PaymentDetails {
            payment_id: row.try_get("payment_id")?,
            amount: row.try_get("amount")?,
            merchant_receive: row.try_get("merchant_receive")?,
            status: payment_status,
        },
    })
}

fn with_product(row: &PgRow) -> Result<OrderWithProduct, RepositoryError> {
    let order = order_from_row(row)?;
    let product_name: Option<String> = row.try_get("product_name")?;
    let product = match product_name {
        Some(name) => Some(ProductSummary {
            id: order.product_id,
            name,
            brand: row.try_get("product_brand")?,
            price: row.try_get("product_price")?,
            image_urls: row.try_get("product_image_urls")?,
        }),
        None => None,
    };
    Ok(OrderWithProduct { order, product })
}

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a checkout in one transaction: reserve stock for every
    /// line with conditional decrements, insert the order batch, and clear
    /// the buyer's cart. Either all of it happens or none of it does; a
    /// crash mid-checkout can never leak reserved stock.
    ///
    /// Lines are reserved in the given order, so the `ShortStock` outcome
    /// always names the first line that cannot be satisfied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails; in
    /// that case nothing is applied.
    pub async fn commit_checkout(
        &self,
        buyer_id: UserId,
        lines: &[CartLine],
        orders: &[NewOrder],
    ) -> Result<CheckoutCommit, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for line in lines {
            if !reserve_line(&mut *tx, line.product_id, &line.size, line.quantity).await? {
                tx.rollback().await?;
                return Ok(CheckoutCommit::ShortStock {
                    product_id: line.product_id,
                    size: line.size.clone(),
                });
            }
        }

        for order in orders {
            sqlx::query(
                r"
                INSERT INTO orders
                    (buyer_id, seller_id, product_id, size, quantity,
                     addr_name, addr_phone, addr_pincode, addr_state, addr_city,
                     addr_house, addr_area, order_date, status,
                     payment_id, amount, merchant_receive, payment_status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                        $11, $12, $13, $14, $15, $16, $17, $18)
                ",
            )
            .bind(order.buyer_id)
            .bind(order.seller_id)
            .bind(order.product_id)
            .bind(&order.size)
            .bind(i32::try_from(order.quantity).unwrap_or(i32::MAX))
            .bind(&order.address.name)
            .bind(&order.address.phone)
            .bind(&order.address.pincode)
            .bind(&order.address.state)
            .bind(&order.address.city)
            .bind(&order.address.house)
            .bind(&order.address.area)
            .bind(order.order_date)
            .bind(order.status.as_str())
            .bind(&order.payment.payment_id)
            .bind(order.payment.amount)
            .bind(order.payment.merchant_receive)
            .bind(order.payment.status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(buyer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CheckoutCommit::Placed(
            u32::try_from(orders.len()).unwrap_or(u32::MAX),
        ))
    }

    /// A buyer's orders, newest first, with product summaries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_buyer(
        &self,
        buyer_id: UserId,
    ) -> Result<Vec<OrderWithProduct>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ORDER_COLUMNS},
                   p.name AS product_name, p.brand AS product_brand,
                   p.price AS product_price, p.image_urls AS product_image_urls
            FROM orders o
            LEFT JOIN products p ON p.id = o.product_id
            WHERE o.buyer_id = $1
            ORDER BY o.order_date DESC, o.id DESC
            "
        ))
        .bind(buyer_id)
        .fetch_all(self.pool)
        .await?;
        rows.iter().map(with_product).collect()
    }

    /// Every order in the system, newest first. Admin listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderWithProduct>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ORDER_COLUMNS},
                   p.name AS product_name, p.brand AS product_brand,
                   p.price AS product_price, p.image_urls AS product_image_urls
            FROM orders o
            LEFT JOIN products p ON p.id = o.product_id
            ORDER BY o.order_date DESC, o.id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;
        rows.iter().map(with_product).collect()
    }

    /// A seller's incoming orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<OrderWithProduct>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ORDER_COLUMNS},
                   p.name AS product_name, p.brand AS product_brand,
                   p.price AS product_price, p.image_urls AS product_image_urls
            FROM orders o
            LEFT JOIN products p ON p.id = o.product_id
            WHERE o.seller_id = $1
            ORDER BY o.order_date DESC, o.id DESC
            "
        ))
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;
        rows.iter().map(with_product).collect()
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    /// Compare-and-swap the order status.
    ///
    /// The update only applies while the status still equals `from`; a
    /// concurrent transition in between surfaces as a conflict instead of
    /// silently overwriting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the status changed under us,
    /// `RepositoryError::Database` for query failures.
    pub async fn cas_update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "order status changed concurrently".to_owned(),
            ));
        }
        Ok(())
    }
}
