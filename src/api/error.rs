use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// API-layer error; wraps the orchestrator's error kinds
#[derive(Debug)]
pub struct ApiError(pub QueryError);

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            QueryError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            QueryError::ListingSourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            kind: self.0.kind().into(),
            message: self.0.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError(err)
    }
}

// Unreadable bodies are bad queries too
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(QueryError::invalid("body", rejection.body_text()))
    }
}
