use crate::config::{ApiClientConfig, DEFAULT_CLIENT_NAME};
use crate::error::ClientError;
use crate::interceptor::{Interceptor, InterceptorRegistry, Phase};
use crate::interceptors::{
    AuthInterceptor, ContentTypeInterceptor, FormatUserInterceptor, RefreshAuthInterceptor,
};
use crate::request::{RequestBody, RequestConfig};
use crate::response::ApiResponse;
use crate::storage::{StorageAdapter, StorageService};
use crate::transport::{DEFAULT_TIMEOUT, HyperTransport, Transport, TransportRequest};
use crate::types::{AuthData, FileUpload, ResourceObject};
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use serde_json::{Value, json};
use std::sync::Arc;
use url::Url;

/// Storage key holding the formatted authenticated-user blob.
const USER_KEY: &str = "user";

/// BEdita API client.
///
/// Owns the configuration, the [`StorageService`], the transport and the
/// interceptor registry. Requests flow through the ordered request-phase
/// interceptors, the transport, and the ordered response-phase interceptors;
/// errors flow through the response-phase error handlers, which gives the
/// refresh interceptor its chance to recover an expired-token failure.
///
/// The client is designed to be shared: every method takes `&self`, and the
/// registry discipline (per-call attach/detach of only the indices a call
/// attached itself) keeps concurrent calls from interfering.
///
/// # Example
///
/// ```ignore
/// use bedita_client::{ApiClientConfig, BEditaApiClient};
///
/// let client = BEditaApiClient::new(
///     ApiClientConfig::new("https://api.example.com")
///         .client_credentials("my-app", "s3cret"),
/// )?;
///
/// // Client-credentials auth happens transparently on first use.
/// let response = client.get("/documents", None).await?;
/// ```
pub struct BEditaApiClient {
    config: ApiClientConfig,
    transport: Arc<dyn Transport>,
    storage: StorageService,
    registry: InterceptorRegistry,
    /// Single-flight gate for token refresh; see
    /// [`RefreshAuthInterceptor`](crate::interceptors::RefreshAuthInterceptor).
    refresh_gate: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for BEditaApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BEditaApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`BEditaApiClient`] with injected transport or storage.
pub struct BEditaApiClientBuilder {
    config: ApiClientConfig,
    transport: Option<Arc<dyn Transport>>,
    storage_adapter: Option<Arc<dyn StorageAdapter>>,
}

impl BEditaApiClientBuilder {
    /// Use a custom transport instead of the default [`HyperTransport`].
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom storage adapter instead of the in-memory default.
    #[must_use]
    pub fn storage_adapter(mut self, adapter: Arc<dyn StorageAdapter>) -> Self {
        self.storage_adapter = Some(adapter);
        self
    }

    /// Build the client and attach the default interceptors.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when `base_url` is missing and
    /// [`ClientError::InvalidUrl`] when it does not parse.
    pub fn build(self) -> Result<BEditaApiClient, ClientError> {
        let mut config = self.config;

        if config.base_url.is_empty() {
            return Err(ClientError::Config("missing required baseUrl".into()));
        }
        Url::parse(&config.base_url).map_err(|e| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        if config.name.is_empty() {
            config.name = DEFAULT_CLIENT_NAME.to_owned();
        }
        if config.client_id.is_some() {
            // Client credentials supersede the deprecated API key.
            config.api_key = None;
        }

        let storage = match self.storage_adapter {
            Some(adapter) => StorageService::with_adapter(config.name.clone(), adapter),
            None => StorageService::new(config.name.clone()),
        };

        let transport = self.transport.unwrap_or_else(|| {
            Arc::new(HyperTransport::with_timeout(
                config.timeout.unwrap_or(DEFAULT_TIMEOUT),
            ))
        });

        let client = BEditaApiClient {
            config,
            transport,
            storage,
            registry: InterceptorRegistry::new(),
            refresh_gate: tokio::sync::Mutex::new(()),
        };
        client.add_default_interceptors();

        Ok(client)
    }
}

impl BEditaApiClient {
    /// Create a client with the default transport and in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when `base_url` is missing and
    /// [`ClientError::InvalidUrl`] when it does not parse.
    pub fn new(config: ApiClientConfig) -> Result<Self, ClientError> {
        Self::builder(config).build()
    }

    /// Create a builder for configuring the client.
    #[must_use]
    pub fn builder(config: ApiClientConfig) -> BEditaApiClientBuilder {
        BEditaApiClientBuilder {
            config,
            transport: None,
            storage_adapter: None,
        }
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// The storage service.
    #[must_use]
    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    pub(crate) fn refresh_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.refresh_gate
    }

    fn add_default_interceptors(&self) {
        self.registry
            .add(Interceptor::Request(Arc::new(AuthInterceptor)));
        self.registry
            .add(Interceptor::Request(Arc::new(ContentTypeInterceptor)));
        self.registry
            .add(Interceptor::Response(Arc::new(RefreshAuthInterceptor)));
    }

    /// Attach an interceptor for the client's lifetime.
    ///
    /// Attaching a kind already present in the same phase is a no-op
    /// returning the existing attachment index.
    pub fn add_interceptor(&self, interceptor: Interceptor) -> usize {
        self.registry.add(interceptor)
    }

    /// Detach the interceptor holding `index` in `phase`; unknown indices
    /// are a safe no-op.
    pub fn remove_interceptor(&self, index: usize, phase: Phase) {
        self.registry.remove(index, phase);
    }

    /// Whether an interceptor of the same kind is attached to the same phase.
    #[must_use]
    pub fn has_interceptor(&self, interceptor: &Interceptor) -> bool {
        self.registry.has(interceptor)
    }

    /// Send a request through the interceptor pipeline.
    ///
    /// Ad-hoc interceptors carried by the config are attached first (unless
    /// an interceptor of the same kind is already present) and detached once
    /// the call settles — only the ones this call attached, so concurrent
    /// calls never detach each other's or the client's own interceptors.
    ///
    /// # Errors
    ///
    /// Propagates interceptor, transport and non-2xx status errors; see
    /// [`ClientError`].
    pub async fn request(&self, mut config: RequestConfig) -> Result<ApiResponse, ClientError> {
        let adhoc_request = std::mem::take(&mut config.request_interceptors);
        let adhoc_response = std::mem::take(&mut config.response_interceptors);

        let mut attached: Vec<(usize, Phase)> = Vec::new();
        for interceptor in adhoc_request {
            let interceptor = Interceptor::Request(interceptor);
            if !self.registry.has(&interceptor) {
                attached.push((self.registry.add(interceptor), Phase::Request));
            }
        }
        for interceptor in adhoc_response {
            let interceptor = Interceptor::Response(interceptor);
            if !self.registry.has(&interceptor) {
                attached.push((self.registry.add(interceptor), Phase::Response));
            }
        }

        let result = self.dispatch(config).await;

        for (index, phase) in attached {
            self.registry.remove(index, phase);
        }

        result
    }

    /// Run the interceptor chains around the transport call.
    ///
    /// Both chains are state machines over `Result`: a successful state runs
    /// the success handler, a failed one the error handler, which may
    /// recover. A request-phase failure skips the transport and enters the
    /// response chain in the failed state.
    async fn dispatch(&self, mut config: RequestConfig) -> Result<ApiResponse, ClientError> {
        self.apply_default_headers(&mut config)?;

        let mut state: Result<RequestConfig, ClientError> = Ok(config);
        for interceptor in self.registry.request_chain() {
            state = match state {
                Ok(config) => interceptor.on_request(self, config).await,
                Err(error) => interceptor.on_error(self, error).await,
            };
        }

        let mut state: Result<ApiResponse, ClientError> = match state {
            Ok(config) => self.send(config).await,
            Err(error) => Err(error),
        };
        for interceptor in self.registry.response_chain() {
            state = match state {
                Ok(response) => interceptor.on_response(self, response).await,
                Err(error) => interceptor.on_error(self, error).await,
            };
        }

        state
    }

    /// Resolve the URL, serialize the body and call the transport.
    async fn send(&self, config: RequestConfig) -> Result<ApiResponse, ClientError> {
        let url = self.build_url(&config)?;
        let body = match &config.body {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Json(value) => Bytes::from(serde_json::to_vec(value)?),
            RequestBody::Raw(bytes) => bytes.clone(),
        };

        tracing::debug!(method = %config.method, url = %url, "dispatching request");

        let request = TransportRequest {
            method: config.method.clone(),
            url,
            headers: config.headers.clone(),
            body,
        };

        let raw = match self.transport.send(request).await {
            Ok(raw) => raw,
            Err(source) => {
                return Err(ClientError::Transport {
                    request: Box::new(config),
                    source,
                });
            }
        };

        let body = if raw.body.is_empty() {
            None
        } else {
            serde_json::from_slice(&raw.body).ok()
        };
        let response = ApiResponse {
            status: raw.status,
            headers: raw.headers,
            body,
            formatted_data: None,
        };

        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ClientError::Status {
                request: Box::new(config),
                response: Box::new(response),
            })
        }
    }

    /// Default headers every request carries unless overridden.
    fn apply_default_headers(&self, config: &mut RequestConfig) -> Result<(), ClientError> {
        if !config.headers.contains_key(ACCEPT) {
            config.headers.insert(
                ACCEPT,
                HeaderValue::from_static("application/vnd.api+json"),
            );
        }
        if let Some(api_key) = &self.config.api_key {
            if !config.headers.contains_key("x-api-key") {
                config
                    .headers
                    .insert("x-api-key", HeaderValue::from_str(api_key)?);
            }
        }
        Ok(())
    }

    /// Join the endpoint URL against the base URL and append query pairs.
    fn build_url(&self, config: &RequestConfig) -> Result<Url, ClientError> {
        let raw = if config.url.starts_with("http://") || config.url.starts_with("https://") {
            config.url.clone()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                config.url.trim_start_matches('/')
            )
        };

        let mut url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        if !config.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                config
                    .query
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );
        }

        Ok(url)
    }

    /// Send a GET request.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn get(
        &self,
        url: &str,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, ClientError> {
        let mut config = config.unwrap_or_default();
        config.method = Method::GET;
        config.url = url.to_owned();

        self.request(config).await
    }

    /// Send a POST request.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn post(
        &self,
        url: &str,
        body: Option<Value>,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, ClientError> {
        let mut config = config.unwrap_or_default();
        config.method = Method::POST;
        config.url = url.to_owned();
        config.body = body.map_or(RequestBody::Empty, RequestBody::Json);

        self.request(config).await
    }

    /// Send a PATCH request.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn patch(
        &self,
        url: &str,
        body: Option<Value>,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, ClientError> {
        let mut config = config.unwrap_or_default();
        config.method = Method::PATCH;
        config.url = url.to_owned();
        config.body = body.map_or(RequestBody::Empty, RequestBody::Json);

        self.request(config).await
    }

    /// Send a DELETE request.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn delete(
        &self,
        url: &str,
        body: Option<Value>,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, ClientError> {
        let mut config = config.unwrap_or_default();
        config.method = Method::DELETE;
        config.url = url.to_owned();
        config.body = body.map_or(RequestBody::Empty, RequestBody::Json);

        self.request(config).await
    }

    /// Authenticate a user with the password grant, storing the access and
    /// refresh tokens.
    ///
    /// API-key and password-grant are mutually exclusive credential modes:
    /// in API-key mode any stored tokens are cleared first. The stored user
    /// blob is always cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AuthData`] when the response lacks the token
    /// metadata; otherwise see [`ClientError`].
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ApiResponse, ClientError> {
        if self.config.api_key.is_some() {
            self.storage.clear_tokens().await?;
        }
        self.storage.remove(USER_KEY).await?;

        self.auth(AuthData::password(username, password), None).await
    }

    /// Authenticate with the client-credentials grant.
    ///
    /// Normally there is no need to call this directly: the auth interceptor
    /// bootstraps client credentials transparently when no access token is
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when no `client_id` is configured;
    /// otherwise see [`ClientError`].
    pub async fn client_credentials(&self) -> Result<ApiResponse, ClientError> {
        let Some(client_id) = self.config.client_id.clone() else {
            return Err(ClientError::Config(
                "missing clientId for client credentials auth".into(),
            ));
        };

        self.auth(
            AuthData::client_credentials(client_id, self.config.client_secret.clone()),
            None,
        )
        .await
    }

    /// Execute an auth request and store the returned token pair.
    async fn auth(
        &self,
        data: AuthData,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, ClientError> {
        let body = serde_json::to_value(&data)?;
        let response = self.post("/auth", Some(body), config).await?;

        let (jwt, renew) = {
            let meta = response.meta();
            (
                meta.and_then(|m| m.get("jwt"))
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                meta.and_then(|m| m.get("renew"))
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            )
        };
        let (Some(jwt), Some(renew)) = (jwt, renew) else {
            return Err(ClientError::AuthData(
                "auth response is missing jwt/renew token metadata".into(),
            ));
        };

        self.storage.set_access_token(&jwt).await?;
        self.storage.set_refresh_token(&renew).await?;

        Ok(response)
    }

    /// Renew the access and refresh tokens using the stored refresh token as
    /// bearer credential.
    ///
    /// # Errors
    ///
    /// Fails fast with [`ClientError::TokenState`] when no refresh token is
    /// stored. On any other failure both tokens and the stored user are
    /// cleared before the error propagates — an expired session is never
    /// silently retried.
    pub async fn renew_tokens(&self) -> Result<ApiResponse, ClientError> {
        let Some(refresh_token) = self.storage.refresh_token().await? else {
            return Err(ClientError::TokenState("missing refresh token".into()));
        };

        let mut config = RequestConfig::new(Method::POST, "/auth");
        let mut bearer = HeaderValue::from_str(&format!("Bearer {refresh_token}"))?;
        bearer.set_sensitive(true);
        config.headers.insert(AUTHORIZATION, bearer);

        match self.auth(AuthData::refresh_token(), Some(config)).await {
            Ok(response) => {
                tracing::debug!("tokens renewed");
                Ok(response)
            }
            Err(error) => {
                tracing::error!(error = %error, "token renewal failed, clearing stored credentials");
                self.storage.clear_tokens().await?;
                self.storage.remove(USER_KEY).await?;
                Err(error)
            }
        }
    }

    /// Get the authenticated user, reshape it through
    /// [`FormatUserInterceptor`] and store the formatted blob.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn get_user_auth(&self) -> Result<ApiResponse, ClientError> {
        let config = RequestConfig::default().response_interceptor(Arc::new(FormatUserInterceptor));
        let response = self.get("/auth/user", Some(config)).await?;

        if let Some(formatted) = &response.formatted_data {
            self.storage.set(USER_KEY, &formatted.to_string()).await?;
        }

        Ok(response)
    }

    /// Save a resource: `PATCH /<type>/<id>` when `data` carries an `id`,
    /// `POST /<type>` otherwise.
    ///
    /// # Errors
    ///
    /// Rejects with [`ClientError::Config`] before any network call when
    /// `type_` is empty.
    pub async fn save(&self, type_: &str, data: Value) -> Result<ApiResponse, ClientError> {
        if type_.is_empty() {
            return Err(ClientError::Config("missing required type".into()));
        }

        let mut attributes = data.as_object().cloned().unwrap_or_default();
        let id = attributes.remove("id").and_then(|id| match id {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        let resource = ResourceObject {
            type_: type_.to_owned(),
            id: id.clone(),
            attributes: Some(attributes),
            ..ResourceObject::default()
        };
        let body = json!({"data": resource});

        match id {
            Some(id) => self.patch(&format!("{type_}/{id}"), Some(body), None).await,
            None => self.post(type_, Some(body), None).await,
        }
    }

    /// Upload a file: posts the raw bytes to `/<type>/upload/<name>` with
    /// the file's content type.
    ///
    /// The path name defaults to the file's own name, then to a UTC
    /// timestamp; it is percent-encoded into the URL.
    ///
    /// # Errors
    ///
    /// Rejects with [`ClientError::Config`] before any network call when
    /// `type_` is empty.
    pub async fn upload(
        &self,
        file: &FileUpload,
        type_: &str,
        name: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        if type_.is_empty() {
            return Err(ClientError::Config("missing required type".into()));
        }

        let name = name
            .map(str::to_owned)
            .or_else(|| file.name.clone())
            .unwrap_or_else(|| chrono::Utc::now().format("%Y%m%d%H%M%S").to_string());

        let mut config = RequestConfig::new(
            Method::POST,
            format!("{}/upload/{}", type_, urlencoding::encode(&name)),
        );
        if let Some(content_type) = &file.content_type {
            config
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        }
        config.body = RequestBody::Raw(file.bytes.clone());

        self.request(config).await
    }
}
