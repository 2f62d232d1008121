//! # App Errors
//!
//! The application-level error type, shared by the CLI and the HTTP API.
//!
//! HTTP handlers return `Result<_, AppError>`; the `IntoResponse` impl maps
//! each variant to a status code and a JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tally_core::TallyError;
use thiserror::Error;

/// Errors surfaced by the app layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// A request required a session and none was presented.
    #[error("not logged in")]
    NotLoggedIn,

    /// The request was rejected by the rate limiter.
    #[error("too many requests")]
    Throttled,

    /// A CLI argument combination is not supported.
    #[error("{0}")]
    InvalidArgument(String),

    /// An engine-level failure.
    #[error(transparent)]
    Core(#[from] TallyError),

    /// File I/O failure (JSON backend, export/import).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotLoggedIn => (StatusCode::UNAUTHORIZED, String::from("Not logged in")),
            Self::Throttled => (
                StatusCode::TOO_MANY_REQUESTS,
                String::from("Too many requests"),
            ),
            Self::Core(TallyError::UnknownParticipant(name)) => (
                StatusCode::NOT_FOUND,
                format!("Unknown participant: {name}"),
            ),
            Self::Core(TallyError::InvalidName(reason)) => {
                (StatusCode::BAD_REQUEST, format!("Invalid name: {reason}"))
            }
            _ => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Internal error"),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
