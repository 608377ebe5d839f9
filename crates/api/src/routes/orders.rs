//! Order route handlers.
//!
//! `place` is the checkout endpoint: it verifies the payment was captured,
//! then hands the cart to the checkout service. Everything else is reads
//! plus the role-gated status transition.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use threadcart_core::{AddressId, Order, OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireSeller, RequireUser};
use crate::services::checkout::{CheckoutService, PgCheckoutStore};
use crate::services::orders::OrderStatusService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub payment_id: String,
    pub address_id: AddressId,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// `POST /orders` — convert the buyer's cart into orders.
pub async fn place(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    // Payment first: no stock moves until the charge is confirmed.
    if !state.payments().is_captured(&req.payment_id).await? {
        return Err(AppError::BadRequest("payment has not been captured".to_owned()));
    }

    let service = CheckoutService::new(PgCheckoutStore::new(state.pool().clone()));
    let order_count = service
        .place_order(user.id, req.address_id, &req.payment_id)
        .await?;

    info!(user_id = %user.id, order_count, "orders placed");
    Ok((StatusCode::CREATED, Json(json!({ "order_count": order_count }))))
}

/// `GET /orders` — the buyer's orders; admins see every order.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    let repo = OrderRepository::new(state.pool());
    let orders = if user.is_admin {
        repo.list_all().await?
    } else {
        repo.list_for_buyer(user.id).await?
    };
    Ok(Json(json!({ "orders": orders })))
}

/// `GET /orders/merchant` — the seller's incoming orders.
pub async fn merchant_list(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_seller(seller.id)
        .await?;
    Ok(Json(json!({ "orders": orders })))
}

/// `GET /orders/{id}`
pub async fn get(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_owned()))?;

    let actor = user.actor();
    let involved = actor.is_admin
        || order.buyer_id == actor.user_id
        || (actor.is_seller && order.seller_id == actor.user_id);
    if !involved {
        // Hide the order's existence from outsiders.
        return Err(AppError::NotFound("order not found".to_owned()));
    }

    Ok(Json(order))
}

/// `PATCH /orders/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>> {
    let order = OrderStatusService::new(state.pool())
        .update_status(&user.actor(), id, req.status)
        .await?;
    Ok(Json(order))
}
