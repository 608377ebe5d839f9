//! User profile and address book route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use threadcart_core::AddressId;

use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::user::{AddressFields, User};
use crate::state::AppState;

/// `GET /users/me`
pub async fn me(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}

/// `POST /users/me/merchant`
///
/// Self-service upgrade to seller. The new flag takes effect on the next
/// request via the session extractor's fresh user load.
pub async fn become_merchant(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    if user.is_seller {
        return Err(AppError::Conflict("already a seller".to_owned()));
    }

    UserRepository::new(state.pool()).set_seller(user.id).await?;
    Ok(Json(json!({ "message": "seller access granted" })))
}

/// `GET /users/me/addresses`
pub async fn list_addresses(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    let addresses = UserRepository::new(state.pool())
        .list_addresses(user.id)
        .await?;
    Ok(Json(json!({ "addresses": addresses })))
}

/// `POST /users/me/addresses`
pub async fn add_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(fields): Json<AddressFields>,
) -> Result<(StatusCode, Json<Value>)> {
    validate_address(&fields)?;

    let address = UserRepository::new(state.pool())
        .add_address(user.id, &fields)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "address": address }))))
}

/// `PATCH /users/me/addresses/{id}`
pub async fn update_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(address_id): Path<AddressId>,
    Json(fields): Json<AddressFields>,
) -> Result<Json<Value>> {
    validate_address(&fields)?;

    match UserRepository::new(state.pool())
        .update_address(user.id, address_id, &fields)
        .await
    {
        Ok(()) => Ok(Json(json!({ "message": "address updated" }))),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound("address not found".to_owned()))
        }
        Err(other) => Err(other.into()),
    }
}

/// `DELETE /users/me/addresses/{id}`
pub async fn delete_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(address_id): Path<AddressId>,
) -> Result<Json<Value>> {
    let removed = UserRepository::new(state.pool())
        .delete_address(user.id, address_id)
        .await?;
    if removed {
        Ok(Json(json!({ "message": "address deleted" })))
    } else {
        Err(AppError::NotFound("address not found".to_owned()))
    }
}

fn validate_address(fields: &AddressFields) -> Result<()> {
    let missing = fields.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "missing address fields: {}",
            missing.join(", ")
        )))
    }
}
