use serde_json::Value;

/// An API response after the interceptor chain has run.
///
/// `body` holds the parsed JSON:API envelope when the transport returned a
/// non-empty JSON body. Response-shaping interceptors may additionally store
/// a reshaped payload in `formatted_data` without touching the envelope.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: http::StatusCode,
    pub headers: http::HeaderMap,
    /// Parsed response envelope, when the body was valid JSON
    pub body: Option<Value>,
    /// Interceptor-produced reshaped data (e.g. mapped includes, user format)
    pub formatted_data: Option<Value>,
}

impl ApiResponse {
    /// Create an empty response with the given status.
    #[must_use]
    pub fn new(status: http::StatusCode) -> Self {
        Self {
            status,
            headers: http::HeaderMap::new(),
            body: None,
            formatted_data: None,
        }
    }

    /// The envelope `data` member, if present.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.body.as_ref().and_then(|body| body.get("data"))
    }

    /// The envelope `meta` member, if present.
    #[must_use]
    pub fn meta(&self) -> Option<&Value> {
        self.body.as_ref().and_then(|body| body.get("meta"))
    }

    /// The backend error code (`error.code`) from a failure envelope.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| body.get("error"))
            .and_then(|error| error.get("code"))
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_accessors() {
        let mut response = ApiResponse::new(http::StatusCode::OK);
        assert!(response.data().is_none());
        assert!(response.error_code().is_none());

        response.body = Some(json!({
            "data": [{"id": "1", "type": "documents"}],
            "meta": {"pagination": {"count": 1}},
        }));
        assert!(response.data().unwrap().is_array());
        assert!(response.meta().is_some());
    }

    #[test]
    fn error_code_from_failure_envelope() {
        let mut response = ApiResponse::new(http::StatusCode::UNAUTHORIZED);
        response.body = Some(json!({"error": {"code": "be_token_expired", "status": "401"}}));
        assert_eq!(response.error_code(), Some("be_token_expired"));
    }
}
