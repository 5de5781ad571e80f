use crate::request::RequestConfig;
use crate::response::ApiResponse;
use crate::storage::StorageError;
use crate::transport::TransportError;
use thiserror::Error;

/// Client error types.
///
/// Only the refresh-and-replay rule (see
/// [`RefreshAuthInterceptor`](crate::interceptors::RefreshAuthInterceptor))
/// recovers from an error automatically; every other failure surfaces
/// unchanged to the caller. `Transport` and `Status` variants carry the
/// original request configuration (and, for `Status`, the full response) so
/// callers can inspect status codes and error bodies.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClientError {
    /// Invalid or missing client/request configuration.
    ///
    /// Raised synchronously, before any I/O is performed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL failed to parse or to join against the base URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Transport-level failure (network, timeout, malformed request)
    #[error("Transport error: {source}")]
    Transport {
        /// The request configuration that failed
        request: Box<RequestConfig>,
        #[source]
        source: TransportError,
    },

    /// HTTP non-2xx status
    #[error("HTTP {}", .response.status)]
    Status {
        /// The request configuration that failed
        request: Box<RequestConfig>,
        /// The response as received, error body included
        response: Box<ApiResponse>,
    },

    /// Well-formed auth response lacking the expected token fields
    #[error("Auth data error: {0}")]
    AuthData(String),

    /// Token-state error, e.g. renewing without a stored refresh token
    #[error("Token state error: {0}")]
    TokenState(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// The HTTP status of the failed response, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            ClientError::Status { response, .. } => Some(response.status),
            _ => None,
        }
    }

    /// The response received for a failed request, if any.
    #[must_use]
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            ClientError::Status { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The request configuration that produced this error, if it was
    /// captured at dispatch time.
    #[must_use]
    pub fn request(&self) -> Option<&RequestConfig> {
        match self {
            ClientError::Transport { request, .. } | ClientError::Status { request, .. } => {
                Some(request)
            }
            _ => None,
        }
    }
}
