use crate::services::{
    store_client::StoreClientError,
    version_index::{FailureCause, IndexError},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Status to report for a failed store call. The store's own status is kept
/// when it is a usable HTTP error code.
fn store_status(err: &StoreClientError) -> StatusCode {
    match err {
        StoreClientError::Store { status, .. } => u16::try_from(*status)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .filter(|code| code.is_client_error() || code.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        StoreClientError::Connection { .. } | StoreClientError::Protocol(_) => {
            StatusCode::BAD_GATEWAY
        }
        StoreClientError::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        let message = err.to_string();
        match &err {
            IndexError::NotFound(_) => AppError::not_found(message),
            IndexError::InvalidDocument(_) => AppError::new(StatusCode::BAD_REQUEST, message),
            IndexError::Store(store) => AppError::new(store_status(store), message),
            IndexError::ReadFailure { source, .. } => match source {
                FailureCause::Store(store) => AppError::new(store_status(store), message),
                FailureCause::Codec(_) => AppError::internal(message),
            },
            IndexError::WriteFailure { source, .. } => match source {
                FailureCause::Store(store) => AppError::new(store_status(store), message),
                FailureCause::Codec(_) => AppError::new(StatusCode::BAD_REQUEST, message),
            },
        }
    }
}
