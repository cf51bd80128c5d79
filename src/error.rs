// Gateway error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::upstream::{error_chain, UpstreamError};

/// Faults raised by the gateway itself, as opposed to business errors the
/// upstream returns (those are relayed untouched)
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    InvalidJson(String),

    // 404 Not Found
    NotFound(String),

    // Request body could not be read (413 when over the size limit)
    BodyRejected { status: StatusCode, message: String },

    // 500 Internal Server Error: upstream answered with something other than JSON
    UpstreamProtocol {
        message: String,
        upstream_status: u16,
        debug: String,
    },

    // 500 Internal Server Error: upstream could not be reached
    UpstreamUnreachable(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BodyRejected { status, .. } => *status,
            ApiError::UpstreamProtocol { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamUnreachable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::InvalidJson(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::BodyRejected { message, .. } => message,
            ApiError::UpstreamProtocol { message, .. } => message,
            ApiError::UpstreamUnreachable(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// JSON body sent to the browser
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::UpstreamProtocol {
                message,
                upstream_status,
                debug,
            } => json!({
                "error": message,
                "status": upstream_status,
                "debug": debug,
            }),
            _ => json!({ "error": self.message() }),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn body_rejected(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::BodyRejected {
            status,
            message: message.into(),
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Transport(e) => {
                let reason = error_chain(&e);
                tracing::error!("Upstream request failed: {}", reason);
                ApiError::UpstreamUnreachable(format!("Failed to connect to API server: {}", reason))
            }
            UpstreamError::NotJson {
                status,
                content_type,
                excerpt,
            } => {
                tracing::warn!(
                    "Upstream returned non-JSON response (status {}, content-type {:?})",
                    status,
                    content_type
                );
                ApiError::UpstreamProtocol {
                    message: "API server returned a non-JSON response".to_string(),
                    upstream_status: status,
                    debug: excerpt,
                }
            }
            UpstreamError::MalformedJson { status, excerpt, source } => {
                tracing::warn!("Upstream returned unparseable JSON (status {}): {}", status, source);
                ApiError::UpstreamProtocol {
                    message: format!("API server returned invalid JSON: {}", source),
                    upstream_status: status,
                    debug: excerpt,
                }
            }
            UpstreamError::InvalidUrl(url) => {
                tracing::error!("Invalid upstream URL: {}", url);
                ApiError::internal_server_error(format!("Invalid upstream URL: {}", url))
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
