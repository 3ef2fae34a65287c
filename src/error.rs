use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A stored document that could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A missing, invalid, or expired credential.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// A failed login. Whether the ID was unknown or the password wrong
    /// is never revealed.
    #[error("Incorrect university ID or password")]
    InvalidCredentials,

    /// No dean matches the requested name.
    #[error("No dean found with that name")]
    DeanNotFound,

    /// The requested slot ordinal does not resolve to an available slot.
    #[error("No such slot is available")]
    SlotNotFound,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A signup without a recognized role.
    #[error("Role error: {0}")]
    Role(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Persistence(ref msg) => {
                tracing::error!("Persistence error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Persistence error".to_string())
            }

            AppError::Unauthenticated(ref msg) => {
                tracing::warn!("Unauthenticated: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Login rejected");
                (
                    StatusCode::UNAUTHORIZED,
                    "Incorrect university ID or password".to_string(),
                )
            }

            AppError::DeanNotFound => {
                tracing::debug!("Dean not found");
                (StatusCode::NOT_FOUND, "No dean found with that name".to_string())
            }

            AppError::SlotNotFound => {
                tracing::debug!("Slot not found");
                (StatusCode::NOT_FOUND, "No such slot is available".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Role(ref msg) => {
                tracing::debug!("Role error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
