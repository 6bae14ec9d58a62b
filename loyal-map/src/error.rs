//! HTTP mapping of core errors
//!
//! Every failure is a non-fatal signal for the page: the session keeps its
//! previous data and the page shows the message next to the action.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use loyal_common::Error;

/// Core error returned from a handler
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            Error::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
            Error::Geolocation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "geolocation"),
            Error::VoteFailed { .. } => (StatusCode::BAD_GATEWAY, "vote_failed"),
            Error::Store(_) => (StatusCode::BAD_GATEWAY, "store"),
            Error::Config(_) | Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let body = Json(json!({
            "error": self.0.to_string(),
            "kind": kind,
        }));
        (status, body).into_response()
    }
}

/// Handler result
pub type ApiResult<T> = Result<T, ApiError>;
