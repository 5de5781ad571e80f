use crate::client::BEditaApiClient;
use crate::error::ClientError;
use crate::interceptor::ResponseInterceptor;
use crate::response::ApiResponse;
use async_trait::async_trait;
use serde_json::{Value, json};

/// Reshapes the authenticated-user response into `{data, roles}`.
///
/// Role names are drawn from `included` entries of type `"roles"`; the
/// result lands in [`ApiResponse::formatted_data`].
pub struct FormatUserInterceptor;

#[async_trait]
impl ResponseInterceptor for FormatUserInterceptor {
    fn name(&self) -> &'static str {
        "format-user"
    }

    async fn on_response(
        &self,
        _client: &BEditaApiClient,
        mut response: ApiResponse,
    ) -> Result<ApiResponse, ClientError> {
        let Some(body) = &response.body else {
            return Ok(response);
        };

        let data = body.get("data").cloned().unwrap_or(Value::Null);
        let roles: Vec<Value> = body
            .get("included")
            .and_then(Value::as_array)
            .map(|included| {
                included
                    .iter()
                    .filter(|item| item.get("type").and_then(Value::as_str) == Some("roles"))
                    .filter_map(|item| item.pointer("/attributes/name").cloned())
                    .collect()
            })
            .unwrap_or_default();

        response.formatted_data = Some(json!({"data": data, "roles": roles}));

        Ok(response)
    }
}
