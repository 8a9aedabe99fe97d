use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use aistudio_protocol::BuildError;
use aistudio_provider_core::{CredentialError, UpstreamPassthroughError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamPassthroughError),
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<BuildError> for ApiError {
    fn from(err: BuildError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotAuthenticated => json_error(StatusCode::UNAUTHORIZED, "Not logged in"),
            ApiError::InvalidRequest(message) => json_error(StatusCode::BAD_REQUEST, &message),
            ApiError::Upstream(err) => passthrough_error(err),
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Status, content type and body exactly as the provider sent them.
fn passthrough_error(err: UpstreamPassthroughError) -> Response {
    let mut resp = Response::new(Body::from(err.body));
    *resp.status_mut() = err.status;
    resp.headers_mut().extend(err.headers);
    resp
}
