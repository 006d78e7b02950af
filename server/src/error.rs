//! Error-to-HTTP mapping and the wire error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use strata_store::Error;

/// A store error paired with the HTTP status it maps to for the current
/// operation. Serialized as `{"errors": ["<message>"]}`.
#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    message: String,
}

impl ServerError {
    pub fn new(status: StatusCode, err: &Error) -> Self {
        Self {
            status,
            message: err.to_string(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, &Error::InvalidMethod)
    }

    /// Get and Delete misses.
    pub fn not_found(err: &Error) -> Self {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    /// Create conflicts and Update misses.
    pub fn not_acceptable(err: &Error) -> Self {
        Self::new(StatusCode::NOT_ACCEPTABLE, err)
    }

    /// Unreadable bodies, bad query arguments, List failures.
    pub fn bad_request(err: &Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, message = %self.message, "request failed");
        let body = Json(json!({ "errors": [self.message] }));
        (self.status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
