//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::cart::CartError;
use crate::services::customers::CustomerError;
use crate::services::pricing::PricingError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(CartError),

    /// Customer registration failed.
    #[error("Customer error: {0}")]
    Customer(CustomerError),

    /// Price computation failed.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        // Infrastructure failures inside a cart operation are server errors,
        // everything else is the client's problem.
        match err {
            CartError::Repository(repo) => Self::Database(repo),
            CartError::Pricing(pricing) => Self::Pricing(pricing),
            other => Self::Cart(other),
        }
    }
}

impl From<CustomerError> for AppError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::Repository(repo) => Self::Database(repo),
            other => Self::Customer(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Pricing(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Pricing(_) => {
                "Internal server error".to_string()
            }
            Self::Cart(err) => match err {
                CartError::SkuNotFound(_) | CartError::WrongStore { .. } => {
                    "Product not available in this store".to_string()
                }
                other => other.to_string(),
            },
            Self::Customer(err) => match err {
                CustomerError::AlreadyRegistered => {
                    "An account with this email already exists".to_string()
                }
                CustomerError::Hash | CustomerError::Repository(_) => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Pricing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Cart(err) => match err {
                CartError::SkuNotFound(_) | CartError::WrongStore { .. } => StatusCode::NOT_FOUND,
                CartError::AttributeNotFound { .. }
                | CartError::InvalidQuantity
                | CartError::CartClosed => StatusCode::UNPROCESSABLE_ENTITY,
                CartError::Pricing(_) | CartError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Customer(err) => match err {
                CustomerError::AlreadyRegistered => StatusCode::CONFLICT,
                CustomerError::InvalidEmail(_) | CustomerError::WeakPassword => {
                    StatusCode::BAD_REQUEST
                }
                CustomerError::Hash | CustomerError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_errors_map_to_client_statuses() {
        let not_found: AppError = CartError::SkuNotFound("GONE".to_owned()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let closed: AppError = CartError::CartClosed.into();
        assert_eq!(closed.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_repository_failures_are_server_errors() {
        let err: AppError = CartError::Repository(RepositoryError::NotFound).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_registration_conflict_maps_to_conflict() {
        let err: AppError = CustomerError::AlreadyRegistered.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
