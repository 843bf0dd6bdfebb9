//! Error handling module
//!
//! HTTP response conversion for domain errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::rates::RateError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            AppError::Domain(domain_err) => match domain_err {
                // 400 Bad Request
                DomainError::InvalidAmount(e) => {
                    (StatusCode::BAD_REQUEST, "invalid_amount", Some(e.to_string()))
                }
                DomainError::TransferToSelf => {
                    (StatusCode::BAD_REQUEST, "transfer_to_self", None)
                }
                DomainError::UnsupportedCurrency(code) => {
                    (StatusCode::BAD_REQUEST, "unsupported_currency", Some(code.clone()))
                }
                DomainError::InvalidUser(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_user", Some(msg.clone()))
                }
                DomainError::InsufficientFunds { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_funds", Some(domain_err.to_string()))
                }

                // 404 Not Found
                DomainError::AccountNotFound(id) => {
                    (StatusCode::NOT_FOUND, "account_not_found", Some(id.to_string()))
                }
                DomainError::UserNotFound(id) => {
                    (StatusCode::NOT_FOUND, "user_not_found", Some(id.to_string()))
                }

                // External rate service
                DomainError::Conversion(rate_err) => match rate_err {
                    RateError::Unavailable { .. } => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "rate_service_unavailable",
                        Some(rate_err.to_string()),
                    ),
                    RateError::Cancelled => {
                        (StatusCode::REQUEST_TIMEOUT, "conversion_cancelled", None)
                    }
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "conversion_failed",
                        Some(rate_err.to_string()),
                    ),
                },

                // 500 Internal Server Error
                DomainError::ReconciliationFailed { .. } => {
                    tracing::error!("Reconciliation required: {}", domain_err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "reconciliation_required",
                        Some(domain_err.to_string()),
                    )
                }
                DomainError::Store(e) => {
                    tracing::error!("Storage error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
                }
                DomainError::Internal(msg) => {
                    tracing::error!("Internal error: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
                }
            },
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
