//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use threadcart_core::{CategoryId, Product, ProductId};

use crate::db::{CategoryRepository, ProductRepository, products::NewProduct};
use crate::error::{AppError, Result};
use crate::middleware::RequireSeller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// `POST /products` (seller only)
pub async fn create(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Json(new): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    if new.name.trim().is_empty() || new.brand.trim().is_empty() {
        return Err(AppError::BadRequest("name and brand are required".to_owned()));
    }
    if new.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".to_owned()));
    }
    if new.discount_percent > 100 {
        return Err(AppError::BadRequest(
            "discount_percent must be between 0 and 100".to_owned(),
        ));
    }
    if new.sizes.is_empty() {
        return Err(AppError::BadRequest("at least one size is required".to_owned()));
    }
    if CategoryRepository::new(state.pool())
        .get(new.category_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("unknown category".to_owned()));
    }

    let product = ProductRepository::new(state.pool())
        .create(seller.id, &new)
        .await?;

    info!(product_id = %product.id, seller_id = %seller.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /products?search=` (public)
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>> {
    let query = params.search.unwrap_or_default();
    let products = ProductRepository::new(state.pool()).search(&query).await?;
    Ok(Json(json!({ "products": products })))
}

/// `GET /products/{id}` (public)
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))
}

/// `GET /products/category/{category_id}` (public)
pub async fn by_category(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Value>> {
    let products = ProductRepository::new(state.pool())
        .list_by_category(category_id)
        .await?;
    Ok(Json(json!({ "products": products })))
}

/// `GET /products/merchant?search=` (seller only)
pub async fn merchant_list(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>> {
    let products = ProductRepository::new(state.pool())
        .list_by_seller(seller.id, params.search.as_deref())
        .await?;
    Ok(Json(json!({ "products": products })))
}

/// `DELETE /products/{id}` (seller only, own products only)
pub async fn delete(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    let removed = ProductRepository::new(state.pool())
        .delete(id, seller.id)
        .await?;
    if removed {
        info!(product_id = %id, seller_id = %seller.id, "product deleted");
        Ok(Json(json!({ "message": "product deleted" })))
    } else {
        // Either no such product, or it belongs to another seller; don't
        // distinguish.
        Err(AppError::NotFound("product not found".to_owned()))
    }
}
