use crate::client::BEditaApiClient;
use crate::error::ClientError;
use crate::interceptor::RequestInterceptor;
use crate::request::RequestConfig;
use async_trait::async_trait;
use http::HeaderValue;
use http::header::AUTHORIZATION;

/// Injects the `Authorization` header on outgoing requests.
///
/// An explicitly-set `Authorization` header is never overwritten — the
/// refresh grant authenticates with the refresh token as bearer and must not
/// be clobbered with the stale access token. When no access token is stored
/// and a `client_id` is configured, the interceptor transparently performs a
/// client-credentials auth first, so that mode is self-bootstrapping without
/// caller intervention. The `/auth` call itself always passes through
/// unauthenticated.
pub struct AuthInterceptor;

/// `true` for the auth endpoint call itself.
fn is_auth_request(config: &RequestConfig) -> bool {
    config.method == http::Method::POST && config.url.trim_matches('/') == "auth"
}

fn bearer_value(token: &str) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl RequestInterceptor for AuthInterceptor {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn on_request(
        &self,
        client: &BEditaApiClient,
        mut config: RequestConfig,
    ) -> Result<RequestConfig, ClientError> {
        if config.headers.contains_key(AUTHORIZATION) {
            return Ok(config);
        }

        if let Some(token) = client.storage().access_token().await? {
            config.headers.insert(AUTHORIZATION, bearer_value(&token)?);
            return Ok(config);
        }

        if is_auth_request(&config) {
            return Ok(config);
        }

        if client.config().client_id.is_some() {
            tracing::debug!(url = %config.url, "no access token stored, bootstrapping client credentials");
            client.client_credentials().await?;
            if let Some(token) = client.storage().access_token().await? {
                config.headers.insert(AUTHORIZATION, bearer_value(&token)?);
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoint_detection() {
        assert!(is_auth_request(&RequestConfig::new(
            http::Method::POST,
            "/auth"
        )));
        assert!(is_auth_request(&RequestConfig::new(
            http::Method::POST,
            "auth"
        )));
        assert!(!is_auth_request(&RequestConfig::new(
            http::Method::GET,
            "/auth"
        )));
        assert!(!is_auth_request(&RequestConfig::new(
            http::Method::POST,
            "/auth/user"
        )));
    }

    #[test]
    fn bearer_values_are_sensitive() {
        let value = bearer_value("tok-123").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer tok-123");
        assert!(value.is_sensitive());
    }
}
