//! Authentication middleware and extractors.
//!
//! The session stores only the user id; extractors reload the user row on
//! every request so role flags (`is_seller`, `is_admin`) are always
//! current. Granting or revoking a role takes effect on the next request,
//! not the next login.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use threadcart_core::UserId;

use crate::db::UserRepository;
use crate::models::{session_keys, user::User};
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that requires a logged-in user with the seller flag.
pub struct RequireSeller(pub User);

/// Extractor that requires a logged-in user with the admin flag.
pub struct RequireAdmin(pub User);

/// Error returned when a request fails authentication or authorization.
pub enum AuthRejection {
    /// No session, or the session's user no longer exists.
    Unauthorized,
    /// Logged in, but missing the required role flag.
    Forbidden(&'static str),
    /// The user row could not be loaded.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "authentication required" })),
            )
                .into_response(),
            Self::Forbidden(role) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": format!("{role} access required") })),
            )
                .into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Load the session's user from the database, if any.
async fn load_session_user(
    parts: &mut Parts,
    state: &AppState,
) -> Result<Option<User>, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    let Some(user_id) = session
        .get::<UserId>(session_keys::CURRENT_USER_ID)
        .await
        .map_err(|_| AuthRejection::Internal)?
    else {
        return Ok(None);
    };

    UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await
        .map_err(|_| AuthRejection::Internal)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        load_session_user(parts, state)
            .await?
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if user.is_seller {
            Ok(Self(user))
        } else {
            Err(AuthRejection::Forbidden("seller"))
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if user.is_admin {
            Ok(Self(user))
        } else {
            Err(AuthRejection::Forbidden("admin"))
        }
    }
}

/// Record the logged-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user_id: UserId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER_ID, user_id).await
}

/// Clear the logged-in user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<UserId>(session_keys::CURRENT_USER_ID).await?;
    Ok(())
}
