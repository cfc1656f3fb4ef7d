//! Error types and HTTP response conversion

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Client sent a payload we cannot turn into a user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            status: status.as_u16(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::BadRequest(msg) => {
                tracing::debug!(reason = %msg, "rejecting request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
                )
            }
            Error::Database(ref e) => {
                // Internals stay in the log, not the response.
                tracing::error!(error = %e, "database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DATABASE_ERROR",
                        "Database operation failed",
                    ),
                )
            }
            Error::Config(ref e) => {
                tracing::error!(error = %e, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONFIG_ERROR",
                        "Service misconfigured",
                    ),
                )
            }
            Error::Io(ref e) => {
                tracing::error!(error = %e, "I/O error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "Internal server error",
                    ),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
