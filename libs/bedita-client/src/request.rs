use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use bytes::Bytes;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Request body payload.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON body, serialized at dispatch time
    Json(Value),
    /// Raw bytes body (uploads)
    Raw(Bytes),
}

impl RequestBody {
    /// `true` when no body is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// Configuration for a single API request.
///
/// Beyond the transport-level fields (method, url, headers, query, body) a
/// config may carry ad-hoc interceptor lists to use for this call only; they
/// are stripped from the config before dispatch and the interceptors detached
/// once the call settles, unless an interceptor of the same kind was already
/// attached (see [`BEditaApiClient::request`](crate::BEditaApiClient::request)).
#[derive(Clone, Default)]
pub struct RequestConfig {
    pub method: http::Method,
    /// Endpoint path, resolved against the client base URL, or an absolute URL
    pub url: String,
    pub headers: http::HeaderMap,
    /// Query string pairs, appended to the resolved URL
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Request interceptors to use for this call only
    pub request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    /// Response interceptors to use for this call only
    pub response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    /// Set once this request has been replayed after a token refresh; caps
    /// the refresh-and-replay recovery at one replay per original failure.
    pub(crate) replayed: bool,
}

impl RequestConfig {
    /// Create a config for the given method and endpoint URL.
    #[must_use]
    pub fn new(method: http::Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Add a query string pair.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add a request interceptor for this call only.
    #[must_use]
    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Add a response interceptor for this call only.
    #[must_use]
    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .field("replayed", &self.replayed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_get_with_empty_body() {
        let config = RequestConfig::default();
        assert_eq!(config.method, http::Method::GET);
        assert!(config.body.is_empty());
        assert!(!config.replayed);
    }

    #[test]
    fn query_pairs_accumulate() {
        let config = RequestConfig::new(http::Method::GET, "/documents")
            .query("page", "2")
            .query("filter[type]", "images");
        assert_eq!(config.query.len(), 2);
        assert_eq!(config.query[0], ("page".to_owned(), "2".to_owned()));
    }
}
