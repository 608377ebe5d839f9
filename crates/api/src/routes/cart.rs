//! Cart route handlers.
//!
//! The cart holds at most one line per product. Stock is only checked
//! loosely here, for early feedback; the authoritative check is the atomic
//! reservation at checkout.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use threadcart_core::{CartLine, Product, ProductId, line_amounts};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    pub size: String,
    pub quantity: u32,
}

/// A cart line joined with its product, as returned by `GET /cart`.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product: Product,
    pub size: String,
    pub quantity: u32,
    /// Charge for this line at current prices.
    pub amount: i64,
}

/// `GET /cart`
pub async fn get(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    let lines = CartRepository::new(state.pool()).lines(user.id).await?;
    let products = ProductRepository::new(state.pool());

    let mut views = Vec::with_capacity(lines.len());
    let mut total: i64 = 0;
    for line in lines {
        // Lines pointing at deleted products are skipped rather than
        // failing the whole cart; checkout will reject them explicitly.
        let Some(product) = products.get(line.product_id).await? else {
            continue;
        };
        let amount = line_amounts(product.price, product.discount_percent, line.quantity).amount;
        total += amount;
        views.push(CartLineView {
            product,
            size: line.size,
            quantity: line.quantity,
            amount,
        });
    }

    Ok(Json(json!({ "lines": views, "total": total })))
}

/// `POST /cart`
pub async fn add_line(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<AddLineRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    if req.quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_owned()));
    }

    let product = ProductRepository::new(state.pool())
        .get(req.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;
    if !product.availability {
        return Err(AppError::Conflict("product is out of stock".to_owned()));
    }
    check_stock(&product, &req.size, req.quantity)?;

    let line = CartLine {
        product_id: req.product_id,
        size: req.size,
        quantity: req.quantity,
    };
    CartRepository::new(state.pool())
        .add_line(user.id, &line)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "added to cart" }))))
}

/// `PATCH /cart/{product_id}`
pub async fn update_line(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
    Json(req): Json<UpdateLineRequest>,
) -> Result<Json<Value>> {
    if req.quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_owned()));
    }

    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;
    check_stock(&product, &req.size, req.quantity)?;

    CartRepository::new(state.pool())
        .update_line(user.id, product_id, &req.size, req.quantity)
        .await?;

    Ok(Json(json!({ "message": "cart updated" })))
}

/// `DELETE /cart/{product_id}`
pub async fn remove_line(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Value>> {
    let removed = CartRepository::new(state.pool())
        .remove_line(user.id, product_id)
        .await?;
    if removed {
        Ok(Json(json!({ "message": "removed from cart" })))
    } else {
        Err(AppError::NotFound("product not in cart".to_owned()))
    }
}

/// Advisory stock check for cart operations.
fn check_stock(product: &Product, size: &str, quantity: u32) -> Result<()> {
    let in_stock = product
        .sizes
        .iter()
        .any(|s| s.label == size && s.quantity >= quantity);
    if in_stock {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "size {size:?} is not available in the requested quantity"
        )))
    }
}
