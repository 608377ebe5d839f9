//! Order status transitions.
//!
//! Resolves the acting role for an order, runs the status state machine,
//! and persists the result with a compare-and-swap on the previous status
//! so concurrent transitions cannot silently overwrite each other.

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use threadcart_core::{Actor, Order, OrderId, OrderStatus, Role, TransitionError};

use crate::db::{OrderRepository, RepositoryError};

/// Errors from a status update attempt.
#[derive(Debug, Error)]
pub enum StatusUpdateError {
    #[error("order not found")]
    OrderNotFound,

    /// The actor is neither the buyer, the fulfilling seller, nor an admin.
    #[error("not permitted to act on this order")]
    Forbidden,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The status changed between read and write; the client should refetch
    /// and retry.
    #[error("order status changed concurrently")]
    Conflict,

    #[error(transparent)]
    Repository(RepositoryError),
}

/// Resolve the role `actor` holds over `order`, if any.
///
/// The admin flag outranks everything. A seller acts as a seller only on
/// orders they fulfil; on anyone else's order a seller is just a buyer
/// candidate like everybody else, and a buyer candidate must actually be
/// the order's buyer.
fn resolve_role(actor: &Actor, order: &Order) -> Option<Role> {
    if actor.is_admin {
        return Some(Role::Admin);
    }
    if actor.is_seller && order.seller_id == actor.user_id {
        return Some(Role::Seller);
    }
    if order.buyer_id == actor.user_id {
        return Some(Role::Buyer);
    }
    None
}

/// Order status service.
pub struct OrderStatusService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderStatusService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Move an order to `to` on behalf of `actor`.
    ///
    /// Returns the order with its new status.
    ///
    /// # Errors
    ///
    /// Returns [`StatusUpdateError::Forbidden`] if the actor has no role on
    /// the order, [`StatusUpdateError::Transition`] if the state machine
    /// rejects the move, and [`StatusUpdateError::Conflict`] if the status
    /// changed concurrently.
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        to: OrderStatus,
    ) -> Result<Order, StatusUpdateError> {
        let mut order = self
            .orders
            .get(order_id)
            .await
            .map_err(StatusUpdateError::Repository)?
            .ok_or(StatusUpdateError::OrderNotFound)?;

        let role = resolve_role(actor, &order).ok_or(StatusUpdateError::Forbidden)?;
        let new_status = order.status.transition(role, to)?;

        match self
            .orders
            .cas_update_status(order_id, order.status, new_status)
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => return Err(StatusUpdateError::Conflict),
            Err(other) => return Err(StatusUpdateError::Repository(other)),
        }

        info!(%order_id, from = %order.status, to = %new_status, %role, "order status updated");
        order.status = new_status;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use threadcart_core::{
        Address, AddressId, PaymentDetails, PaymentStatus, ProductId, UserId,
    };

    use super::*;

    fn order(buyer: i32, seller: i32) -> Order {
        Order {
            id: OrderId::new(1),
            buyer_id: UserId::new(buyer),
            seller_id: UserId::new(seller),
            product_id: ProductId::new(9),
            size: "M".to_owned(),
            quantity: 1,
            address: Address {
                id: AddressId::new(0),
                name: String::new(),
                phone: String::new(),
                pincode: String::new(),
                state: String::new(),
                city: String::new(),
                house: String::new(),
                area: String::new(),
            },
            order_date: Utc::now(),
            status: OrderStatus::Processing,
            payment: PaymentDetails {
                payment_id: "pay_1".to_owned(),
                amount: 100,
                merchant_receive: 90,
                status: PaymentStatus::Paid,
            },
        }
    }

    fn actor(user: i32, is_seller: bool, is_admin: bool) -> Actor {
        Actor {
            user_id: UserId::new(user),
            is_seller,
            is_admin,
        }
    }

    #[test]
    fn admin_flag_outranks_buyer_and_seller() {
        let order = order(1, 2);
        assert_eq!(resolve_role(&actor(1, true, true), &order), Some(Role::Admin));
    }

    #[test]
    fn seller_role_applies_only_to_own_orders() {
        let order = order(1, 2);
        assert_eq!(resolve_role(&actor(2, true, false), &order), Some(Role::Seller));
        // A different seller has no standing on this order.
        assert_eq!(resolve_role(&actor(3, true, false), &order), None);
    }

    #[test]
    fn seller_buying_from_someone_else_acts_as_buyer() {
        let order = order(5, 2);
        assert_eq!(resolve_role(&actor(5, true, false), &order), Some(Role::Buyer));
    }

    #[test]
    fn unrelated_user_has_no_role() {
        let order = order(1, 2);
        assert_eq!(resolve_role(&actor(7, false, false), &order), None);
    }
}
