use crate::client::BEditaApiClient;
use crate::error::ClientError;
use crate::interceptor::ResponseInterceptor;
use crate::response::ApiResponse;
use async_trait::async_trait;
use serde_json::Value;

/// Strips `links` members from a JSON:API response.
///
/// Removes `links` at the envelope, per-resource and per-relationship levels
/// in both `data` and `included`, plus the `schema` block from `meta`.
/// No-ops safely when the body or `data` is absent, not an object/array, or
/// empty.
pub struct RemoveLinksInterceptor;

/// Strip links from a resource object or an array of them.
fn remove_links(data: &mut Value) {
    match data {
        Value::Array(items) => {
            for item in items {
                remove_links(item);
            }
        }
        Value::Object(resource) => {
            resource.remove("links");
            if let Some(relationships) = resource
                .get_mut("relationships")
                .and_then(Value::as_object_mut)
            {
                for rel in relationships.values_mut() {
                    if let Some(rel) = rel.as_object_mut() {
                        rel.remove("links");
                    }
                }
            }
        }
        _ => {}
    }
}

#[async_trait]
impl ResponseInterceptor for RemoveLinksInterceptor {
    fn name(&self) -> &'static str {
        "remove-links"
    }

    async fn on_response(
        &self,
        _client: &BEditaApiClient,
        mut response: ApiResponse,
    ) -> Result<ApiResponse, ClientError> {
        let Some(envelope) = response.body.as_mut().and_then(Value::as_object_mut) else {
            return Ok(response);
        };

        envelope.remove("links");
        if let Some(meta) = envelope.get_mut("meta").and_then(Value::as_object_mut) {
            meta.remove("schema");
        }
        if let Some(data) = envelope.get_mut("data") {
            remove_links(data);
        }
        if let Some(included) = envelope.get_mut("included") {
            remove_links(included);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiClientConfig;
    use serde_json::json;

    fn test_client() -> BEditaApiClient {
        BEditaApiClient::new(ApiClientConfig::new("https://example.com")).unwrap()
    }

    fn response_with_body(body: Value) -> ApiResponse {
        let mut response = ApiResponse::new(http::StatusCode::OK);
        response.body = Some(body);
        response
    }

    #[tokio::test]
    async fn links_removed_at_every_level() {
        let response = response_with_body(json!({
            "data": [{
                "id": 1,
                "type": "users",
                "attributes": {"title": "User number one"},
                "links": {"self": "https://api.example.com/users/1"},
                "relationships": {
                    "attach": {
                        "links": {
                            "related": "https://api.example.com/users/1/attach",
                            "self": "https://api.example.com/users/1/relationships/attach",
                        },
                    },
                    "poster": {
                        "links": {
                            "related": "https://api.example.com/users/1/poster",
                            "self": "https://api.example.com/users/1/relationships/poster",
                        },
                    },
                },
            }],
            "links": {
                "self": "https://api.example.com/users",
                "next": "https://api.example.com/users?page=2",
            },
            "meta": {
                "schema": {"users": {"revision": "123456789"}},
                "pagination": {"count": 1},
            },
            "included": [{
                "id": 12,
                "type": "images",
                "attributes": {"title": "Image number one"},
                "links": {"self": "https://api.example.com/images/12"},
                "relationships": {
                    "attached_to": {
                        "links": {
                            "related": "https://api.example.com/images/12/attached_to",
                            "self": "https://api.example.com/images/12/relationships/attached_to",
                        },
                    },
                },
            }],
        }));

        let response = RemoveLinksInterceptor
            .on_response(&test_client(), response)
            .await
            .unwrap();

        let body = response.body.unwrap();
        assert!(body.get("links").is_none());
        assert!(body.pointer("/meta/schema").is_none());
        // Other meta content survives.
        assert_eq!(body.pointer("/meta/pagination/count"), Some(&json!(1)));

        assert!(body.pointer("/data/0/links").is_none());
        assert!(body.pointer("/data/0/relationships/attach/links").is_none());
        assert!(body.pointer("/data/0/relationships/poster/links").is_none());

        assert!(body.pointer("/included/0/links").is_none());
        assert!(
            body.pointer("/included/0/relationships/attached_to/links")
                .is_none()
        );
    }

    #[tokio::test]
    async fn missing_data_is_untouched() {
        let response = response_with_body(json!({"meta": {"ok": true}}));
        let response = RemoveLinksInterceptor
            .on_response(&test_client(), response)
            .await
            .unwrap();
        assert_eq!(response.body.unwrap(), json!({"meta": {"ok": true}}));
    }

    #[tokio::test]
    async fn empty_body_is_untouched() {
        let response = response_with_body(json!({}));
        let response = RemoveLinksInterceptor
            .on_response(&test_client(), response)
            .await
            .unwrap();
        assert_eq!(response.body.unwrap(), json!({}));

        let response = ApiResponse::new(http::StatusCode::NO_CONTENT);
        let response = RemoveLinksInterceptor
            .on_response(&test_client(), response)
            .await
            .unwrap();
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn non_object_data_is_untouched() {
        let response = response_with_body(json!({"data": "weird"}));
        let response = RemoveLinksInterceptor
            .on_response(&test_client(), response)
            .await
            .unwrap();
        assert_eq!(response.body.unwrap(), json!({"data": "weird"}));
    }
}
