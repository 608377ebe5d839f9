//! Immutable order records and the order factory.
//!
//! An order is created once, at checkout, from a cart line plus a product
//! and address snapshot. After creation only `status` and the payment
//! status may change; product, quantity, size, address and amounts are
//! frozen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::cart::CartLine;
use crate::pricing::LineAmounts;
use crate::product::Product;
use crate::types::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

/// Payment reference and settlement amounts for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Opaque gateway payment id, confirmed before checkout is invoked.
    pub payment_id: String,
    /// Amount charged to the buyer, minor currency units.
    pub amount: i64,
    /// Merchant's net receivable after platform commission.
    pub merchant_receive: i64,
    pub status: PaymentStatus,
}

/// An order record as built at checkout, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub buyer_id: UserId,
    /// Copied from the product at creation time, never re-derived.
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
    /// Deep copy of the shipping address; survives later address edits.
    pub address: Address,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub payment: PaymentDetails,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
    pub address: Address,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub payment: PaymentDetails,
}

impl NewOrder {
    /// Build an order record from a cart line and its resolved product.
    ///
    /// Pure constructor: trusts that the caller has already reserved stock
    /// and computed amounts. The payment arrives confirmed, so the payment
    /// status starts as [`PaymentStatus::Paid`]; the order status starts at
    /// its initial state, [`OrderStatus::Processing`].
    #[must_use]
    pub fn build(
        buyer_id: UserId,
        line: &CartLine,
        product: &Product,
        address: &Address,
        payment_id: &str,
        amounts: LineAmounts,
        order_date: DateTime<Utc>,
    ) -> Self {
        Self {
            buyer_id,
            seller_id: product.seller_id,
            product_id: product.id,
            size: line.size.clone(),
            quantity: line.quantity,
            address: address.clone(),
            order_date,
            status: OrderStatus::default(),
            payment: PaymentDetails {
                payment_id: payment_id.to_owned(),
                amount: amounts.amount,
                merchant_receive: amounts.merchant_receive,
                status: PaymentStatus::Paid,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{ProductDescription, SizeStock};
    use crate::types::{AddressId, CategoryId};

    fn fixture() -> (CartLine, Product, Address) {
        let line = CartLine {
            product_id: ProductId::new(5),
            size: "M".to_owned(),
            quantity: 2,
        };
        let product = Product {
            id: ProductId::new(5),
            seller_id: UserId::new(77),
            brand: "Loomcraft".to_owned(),
            name: "Oxford shirt".to_owned(),
            price: 1000,
            discount_percent: 10,
            sizes: vec![SizeStock {
                label: "M".to_owned(),
                quantity: 6,
            }],
            tags: Vec::new(),
            description: ProductDescription {
                about: String::new(),
                manufactured: String::new(),
                packed: String::new(),
            },
            image_urls: Vec::new(),
            category_id: CategoryId::new(1),
            categories: Vec::new(),
            availability: true,
        };
        let address = Address {
            id: AddressId::new(3),
            name: "A. Buyer".to_owned(),
            phone: "9900112233".to_owned(),
            pincode: "560001".to_owned(),
            state: "Karnataka".to_owned(),
            city: "Bengaluru".to_owned(),
            house: "12".to_owned(),
            area: "MG Road".to_owned(),
        };
        (line, product, address)
    }

    #[test]
    fn build_copies_seller_and_marks_paid() {
        let (line, product, address) = fixture();
        let now = Utc::now();
        let order = NewOrder::build(
            UserId::new(1),
            &line,
            &product,
            &address,
            "pay_123",
            LineAmounts {
                amount: 1800,
                merchant_receive: 1620,
            },
            now,
        );

        assert_eq!(order.buyer_id, UserId::new(1));
        assert_eq!(order.seller_id, product.seller_id);
        assert_eq!(order.product_id, product.id);
        assert_eq!(order.size, "M");
        assert_eq!(order.quantity, 2);
        assert_eq!(order.order_date, now);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment.payment_id, "pay_123");
        assert_eq!(order.payment.amount, 1800);
        assert_eq!(order.payment.merchant_receive, 1620);
        assert_eq!(order.payment.status, PaymentStatus::Paid);
    }

    #[test]
    fn address_is_snapshotted_not_referenced() {
        let (line, product, mut address) = fixture();
        let order = NewOrder::build(
            UserId::new(1),
            &line,
            &product,
            &address,
            "pay_123",
            LineAmounts {
                amount: 1800,
                merchant_receive: 1620,
            },
            Utc::now(),
        );

        // Later edits to the saved address must not affect the order.
        address.city = "Mumbai".to_owned();
        assert_eq!(order.address.city, "Bengaluru");
    }
}
