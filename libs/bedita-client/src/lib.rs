//! BEdita API client
//!
//! A client-side access layer for BEdita's JSON:API backend:
//! - Verb methods plus `save` and `upload` over a pluggable [`Transport`]
//! - A de-duplicated, ordered interceptor pipeline around every request,
//!   extensible globally or per call
//! - Token authentication (password, client-credentials and refresh grants)
//!   with automatic `Bearer` injection, transparent client-credentials
//!   bootstrap and refresh-and-replay recovery on token expiry
//! - Namespaced token/user persistence over a pluggable [`StorageAdapter`]
//! - Response shaping: inline mapping of `included` resources (optionally
//!   substituting translated fields), user formatting, link stripping
//!
//! # Example
//!
//! ```ignore
//! use bedita_client::{ApiClientConfig, BEditaApiClient};
//!
//! let client = BEditaApiClient::new(
//!     ApiClientConfig::new("https://api.example.com")
//!         .client_credentials("my-app", "s3cret"),
//! )?;
//!
//! client.authenticate("admin", "password").await?;
//! let response = client.get("/documents", None).await?;
//! ```

mod client;
mod config;
mod error;
mod interceptor;
pub mod interceptors;
mod provider;
mod request;
mod response;
pub mod storage;
mod transport;
mod types;

pub use client::{BEditaApiClient, BEditaApiClientBuilder};
pub use config::{ApiClientConfig, DEFAULT_CLIENT_NAME};
pub use error::ClientError;
pub use interceptor::{Interceptor, InterceptorRegistry, Phase, RequestInterceptor, ResponseInterceptor};
pub use provider::ApiProvider;
pub use request::{RequestBody, RequestConfig};
pub use response::ApiResponse;
pub use storage::{
    FileStorageAdapter, MemoryStorageAdapter, StorageAdapter, StorageError, StorageService,
};
pub use transport::{
    DEFAULT_TIMEOUT, HyperTransport, RawResponse, Transport, TransportError, TransportRequest,
};
pub use types::{AuthData, FileUpload, GrantType, ResourceObject};
