//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::orders::StatusUpdateError;
use crate::services::payments::PaymentError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed or was refused.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order status update failed or was refused.
    #[error("Status update error: {0}")]
    Status(#[from] StatusUpdateError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// State conflict (duplicate, concurrent update).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Database(err) => !matches!(err, RepositoryError::NotFound),
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_) | AuthError::PasswordHash
            ),
            Self::Checkout(err) => matches!(err, CheckoutError::Store(_)),
            Self::Status(err) => matches!(err, StatusUpdateError::Repository(_)),
            Self::Payment(err) => {
                matches!(err, PaymentError::Http(_) | PaymentError::Gateway { .. })
            }
            _ => false,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken | AuthError::PhoneTaken => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => StatusCode::CONFLICT,
                CheckoutError::AddressNotFound | CheckoutError::ProductNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CheckoutError::SizeUnavailable { .. } => StatusCode::CONFLICT,
                CheckoutError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Status(err) => match err {
                StatusUpdateError::OrderNotFound => StatusCode::NOT_FOUND,
                StatusUpdateError::Forbidden => StatusCode::FORBIDDEN,
                StatusUpdateError::Transition(_) => StatusCode::UNPROCESSABLE_ENTITY,
                StatusUpdateError::Conflict => StatusCode::CONFLICT,
                StatusUpdateError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(err) => match err {
                PaymentError::PaymentNotFound => StatusCode::NOT_FOUND,
                PaymentError::Http(_) | PaymentError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message returned to the client. Server-side failures are never
    /// echoed back in detail.
    fn client_message(&self) -> String {
        if self.is_server_error() {
            return match self {
                Self::Payment(_) => "Payment gateway error".to_string(),
                _ => "Internal server error".to_string(),
            };
        }
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Auth(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Status(err) => err.to_string(),
            Self::Payment(PaymentError::PaymentNotFound) => "Payment not found".to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Internal(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();
        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use threadcart_core::{OrderStatus, ProductId, Role, TransitionError};

    use super::*;

    #[test]
    fn repository_not_found_maps_to_404() {
        let err = AppError::Database(RepositoryError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(!err.is_server_error());
    }

    #[test]
    fn checkout_refusals_map_to_conflict_or_not_found() {
        assert_eq!(
            AppError::Checkout(CheckoutError::EmptyCart).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::SizeUnavailable {
                product: ProductId::new(1),
                size: "M".to_owned(),
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::ProductNotFound(ProductId::new(1))).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn illegal_transition_maps_to_422() {
        let err = AppError::Status(StatusUpdateError::Transition(TransitionError {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
            role: Role::Buyer,
        }));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!err.is_server_error());
    }

    #[test]
    fn server_errors_hide_details() {
        let err = AppError::Internal("pool exhausted".to_owned());
        assert_eq!(err.client_message(), "Internal server error");
    }
}
