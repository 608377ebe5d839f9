//! Category tree route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use threadcart_core::CategoryId;

use crate::db::{CategoryRepository, categories::MAX_DEPTH};
use crate::error::{AppError, Result};
use crate::middleware::RequireSeller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePathRequest {
    /// Root-to-leaf category names, 1 to 3 deep.
    pub path: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// `POST /categories` (seller only)
pub async fn create_path(
    State(state): State<AppState>,
    RequireSeller(_): RequireSeller,
    Json(req): Json<CreatePathRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    if req.path.iter().any(|name| name.trim().is_empty()) {
        return Err(AppError::BadRequest("category names must not be blank".to_owned()));
    }

    let id = CategoryRepository::new(state.pool())
        .create_path(&req.path)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "category_id": id }))))
}

/// `GET /categories` (public)
pub async fn forest(State(state): State<AppState>) -> Result<Json<Value>> {
    let forest = CategoryRepository::new(state.pool()).forest().await?;
    Ok(Json(json!({ "categories": forest })))
}

/// `POST /categories/{id}/subcategories` (seller only)
pub async fn add_subcategory(
    State(state): State<AppState>,
    RequireSeller(_): RequireSeller,
    Path(parent_id): Path<CategoryId>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be blank".to_owned()));
    }

    let repo = CategoryRepository::new(state.pool());
    let parent = repo
        .get(parent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("category not found".to_owned()))?;

    if parent.depth >= MAX_DEPTH {
        return Err(AppError::BadRequest(format!(
            "categories nest at most {MAX_DEPTH} levels"
        )));
    }

    let id = repo.add_child(parent_id, parent.depth, req.name.trim()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "category_id": id }))))
}

/// `PATCH /categories/{id}` (seller only)
pub async fn rename(
    State(state): State<AppState>,
    RequireSeller(_): RequireSeller,
    Path(id): Path<CategoryId>,
    Json(req): Json<NameRequest>,
) -> Result<Json<Value>> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be blank".to_owned()));
    }

    CategoryRepository::new(state.pool())
        .rename(id, req.name.trim())
        .await?;
    Ok(Json(json!({ "message": "category renamed" })))
}

/// `DELETE /categories/{id}` (seller only)
///
/// Deletes the whole subtree (`ON DELETE CASCADE`).
pub async fn delete(
    State(state): State<AppState>,
    RequireSeller(_): RequireSeller,
    Path(id): Path<CategoryId>,
) -> Result<Json<Value>> {
    let removed = CategoryRepository::new(state.pool()).delete(id).await?;
    if removed {
        Ok(Json(json!({ "message": "category deleted" })))
    } else {
        Err(AppError::NotFound("category not found".to_owned()))
    }
}
