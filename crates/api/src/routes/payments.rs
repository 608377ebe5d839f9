//! Payment route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    /// Total to charge, minor currency units.
    pub amount: i64,
}

/// `POST /payments/link` — create a Razorpay payment link for the buyer.
pub async fn create_link(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreateLinkRequest>,
) -> Result<Json<Value>> {
    if req.amount <= 0 {
        return Err(AppError::BadRequest("amount must be positive".to_owned()));
    }

    let link = state.payments().create_payment_link(req.amount, &user).await?;
    Ok(Json(json!({ "payment_id": link.id, "url": link.short_url })))
}

/// `GET /payments/{payment_id}` — report whether the payment was captured.
pub async fn status(
    State(state): State<AppState>,
    RequireUser(_): RequireUser,
    Path(payment_id): Path<String>,
) -> Result<Json<Value>> {
    let captured = state.payments().is_captured(&payment_id).await?;
    Ok(Json(json!({ "captured": captured })))
}
