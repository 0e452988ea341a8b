//! Error handling
//!
//! Every error is detected at the boundary of the component that owns the
//! invariant and propagated unchanged to the HTTP layer; nothing downgrades
//! or swallows another component's error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::inference::model::ModelError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Auth errors
    InvalidCredentials,
    TokenExpired,
    TokenInvalid,
    Unauthorized,

    // Resource errors
    NotFound(String),
    AlreadyExists(String),

    // Validation errors - carries the rejected field names
    Validation(Vec<String>),

    // Classifier failed to load or is structurally incompatible
    ModelUnavailable(String),

    // Database errors
    DatabaseError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password".to_string())
            }
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired".to_string()),
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(fields) => {
                let body = Json(json!({
                    "error": "Validation failed",
                    "rejected_fields": fields,
                    "status": StatusCode::BAD_REQUEST.as_u16(),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ModelUnavailable(reason) => {
                tracing::error!("Fraud model unavailable: {}", reason);
                (StatusCode::SERVICE_UNAVAILABLE, "Fraud model unavailable".to_string())
            }
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred".to_string())
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::TokenInvalid,
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::ModelUnavailable(err.to_string())
    }
}
