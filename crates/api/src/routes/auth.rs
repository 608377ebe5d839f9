//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_owned()));
    }
    if req.phone.trim().is_empty() {
        return Err(AppError::BadRequest("phone is required".to_owned()));
    }

    let user = AuthService::new(state.pool())
        .signup(req.name.trim(), &req.email, req.phone.trim(), &req.password)
        .await?;

    set_current_user(&session, user.id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    set_sentry_user(&user.id, Some(&user.email));

    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;

    // Rotate the session id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    set_current_user(&session, user.id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    set_sentry_user(&user.id, Some(&user.email));

    info!(user_id = %user.id, "user logged in");
    Ok(Json(json!({ "user": user })))
}

/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    clear_sentry_user();
    Ok(Json(json!({ "message": "logged out" })))
}
