//! Transport-level error mapping (§7): the single point of HTTP-status
//! mapping, producing the flat wire contract §6 documents: `{detail:
//! string}`, with no leak of internal stack traces or key names.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use loom_core::error::LoomError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

/// §7 error taxonomy → HTTP status mapping.
impl From<LoomError> for ApiError {
    fn from(err: LoomError) -> Self {
        let status = match &err {
            LoomError::NotFound(_) => StatusCode::NOT_FOUND,
            LoomError::Inactive(_) => StatusCode::BAD_REQUEST,
            LoomError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LoomError::Storage(_)
            | LoomError::Generator(_)
            | LoomError::Integrity(_)
            | LoomError::ContextAdvisory(_)
            | LoomError::Serialization(_)
            | LoomError::Config(_)
            | LoomError::Internal(_)
            | LoomError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}
