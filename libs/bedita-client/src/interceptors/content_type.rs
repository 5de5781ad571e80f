use crate::client::BEditaApiClient;
use crate::error::ClientError;
use crate::interceptor::RequestInterceptor;
use crate::request::RequestConfig;
use async_trait::async_trait;
use http::HeaderValue;
use http::header::CONTENT_TYPE;

/// Defaults the `Content-Type` header to JSON when the request carries a
/// body and no explicit content type was set.
pub struct ContentTypeInterceptor;

#[async_trait]
impl RequestInterceptor for ContentTypeInterceptor {
    fn name(&self) -> &'static str {
        "content-type"
    }

    async fn on_request(
        &self,
        _client: &BEditaApiClient,
        mut config: RequestConfig,
    ) -> Result<RequestConfig, ClientError> {
        if !config.body.is_empty() && !config.headers.contains_key(CONTENT_TYPE) {
            config
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(config)
    }
}
