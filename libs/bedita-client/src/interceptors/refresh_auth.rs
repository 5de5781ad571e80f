use crate::client::BEditaApiClient;
use crate::error::ClientError;
use crate::interceptor::ResponseInterceptor;
use crate::response::ApiResponse;
use async_trait::async_trait;
use http::HeaderMap;
use http::header::AUTHORIZATION;

/// Backend error code that specifically signals an expired access token.
const TOKEN_EXPIRED_CODE: &str = "be_token_expired";

/// Recovers from expired-token failures: renews the tokens and replays the
/// failed request once.
///
/// Only a 401 whose error body carries the code `be_token_expired` triggers
/// the recovery; any other 401 clears the stored tokens and user and
/// propagates, preventing stale-credential retry storms. A replayed request
/// is marked so a second expiry failure propagates instead of looping.
///
/// Concurrent expiry failures are single-flighted through the client's
/// refresh gate: the first caller renews, later callers observe the changed
/// access token and replay directly.
pub struct RefreshAuthInterceptor;

/// Extract the bearer token from an `Authorization` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

fn is_token_expired(response: &ApiResponse) -> bool {
    response.status == http::StatusCode::UNAUTHORIZED
        && response.error_code() == Some(TOKEN_EXPIRED_CODE)
}

/// Auth-endpoint failures are never replayed: a refresh request failing with
/// an expiry code must not trigger another refresh from inside the gate.
fn is_auth_endpoint(request: &crate::request::RequestConfig) -> bool {
    request.url.trim_matches('/') == "auth"
}

#[async_trait]
impl ResponseInterceptor for RefreshAuthInterceptor {
    fn name(&self) -> &'static str {
        "refresh-auth"
    }

    async fn on_error(
        &self,
        client: &BEditaApiClient,
        error: ClientError,
    ) -> Result<ApiResponse, ClientError> {
        let ClientError::Status { request, response } = &error else {
            return Err(error);
        };

        if is_token_expired(response) {
            if request.replayed || is_auth_endpoint(request) {
                // At most one replay per original failure, and auth calls
                // themselves are never replayed.
                return Err(error);
            }

            let stale = bearer_token(&request.headers);
            {
                let _gate = client.refresh_gate().lock().await;
                let current = client.storage().access_token().await?;
                let refreshed_elsewhere = match (&stale, &current) {
                    (Some(stale), Some(current)) => stale != current,
                    _ => false,
                };
                if !refreshed_elsewhere {
                    tracing::debug!(url = %request.url, "access token expired, renewing");
                    client.renew_tokens().await?;
                }
            }

            let mut retry = (**request).clone();
            retry.headers.remove(AUTHORIZATION);
            retry.replayed = true;

            return client.request(retry).await;
        }

        if response.status == http::StatusCode::UNAUTHORIZED {
            // Not an expired token's fault: drop the stored credentials so
            // the next call starts clean, then surface the original error.
            tracing::warn!(url = %request.url, code = ?response.error_code(), "unauthorized, clearing stored tokens");
            client.storage().clear_tokens().await?;
            client.storage().remove("user").await?;
        }

        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expiry_requires_both_status_and_code() {
        let mut response = ApiResponse::new(http::StatusCode::UNAUTHORIZED);
        response.body = Some(json!({"error": {"code": "be_token_expired"}}));
        assert!(is_token_expired(&response));

        response.body = Some(json!({"error": {"code": "be_auth_failed"}}));
        assert!(!is_token_expired(&response));

        let mut response = ApiResponse::new(http::StatusCode::FORBIDDEN);
        response.body = Some(json!({"error": {"code": "be_token_expired"}}));
        assert!(!is_token_expired(&response));
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            AUTHORIZATION,
            http::HeaderValue::from_static("Bearer tok-1"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok-1"));

        headers.insert(AUTHORIZATION, http::HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }
}
