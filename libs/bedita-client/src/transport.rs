use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level error types.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Request attempt timed out
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure (DNS, TCP, TLS)
    #[error("Connection error: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A fully resolved request, ready to go on the wire.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A raw response as received from the wire.
///
/// The transport makes no judgement on the status code; the client converts
/// non-2xx statuses into errors after body parsing.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The HTTP transport boundary.
///
/// Implementations issue a single request and return the response, or a
/// [`TransportError`] when nothing usable came back. Interceptors, auth and
/// response shaping all live above this trait, so a test double only has to
/// fake the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;
}

/// Default [`Transport`] backed by the hyper legacy client.
///
/// TLS via rustls with webpki roots; plain `http://` is accepted as well
/// since BEdita instances are commonly reached on a local address. HTTP/2 is
/// negotiated through ALPN when the server supports it.
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl HyperTransport {
    /// Create a transport with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom per-request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_all_versions()
            .build();

        let client = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(https);

        Self { client, timeout }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let mut req = Request::builder()
            .method(request.method)
            .uri(request.url.as_str())
            .body(Full::new(request.body))?;
        *req.headers_mut() = request.headers;

        let response = tokio::time::timeout(self.timeout, self.client.request(req))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|e| TransportError::Connect(Box::new(e)))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TransportError::Body(Box::new(e)))?
            .to_bytes();

        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn request(method: http::Method, url: &str) -> TransportRequest {
        TransportRequest {
            method,
            url: Url::parse(url).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn get_returns_status_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/status");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"ok":true}"#);
        });

        let transport = HyperTransport::new();
        let url = format!("{}/status", server.base_url());
        let response = transport.send(request(http::Method::GET, &url)).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], br#"{"ok":true}"#);
        mock.assert();
    }

    #[tokio::test]
    async fn non_2xx_is_not_a_transport_error() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not here");
        });

        let transport = HyperTransport::new();
        let url = format!("{}/missing", server.base_url());
        let response = transport.send(request(http::Method::GET, &url)).await.unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn request_body_and_headers_reach_the_wire() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/echo")
                .header("x-custom", "value")
                .body("payload");
            then.status(201);
        });

        let transport = HyperTransport::new();
        let mut req = request(http::Method::POST, &format!("{}/echo", server.base_url()));
        req.headers
            .insert("x-custom", http::HeaderValue::from_static("value"));
        req.body = Bytes::from_static(b"payload");

        let response = transport.send(req).await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
        mock.assert();
    }

    #[tokio::test]
    async fn connection_refused_maps_to_connect_error() {
        let transport = HyperTransport::with_timeout(Duration::from_secs(2));
        // Port 9 (discard) is virtually never listening locally.
        let err = transport
            .send(request(http::Method::GET, "http://127.0.0.1:9/"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, TransportError::Connect(_) | TransportError::Timeout(_)),
            "expected Connect or Timeout, got: {err:?}"
        );
    }
}
