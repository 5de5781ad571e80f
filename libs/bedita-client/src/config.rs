use serde::Deserialize;
use std::time::Duration;

/// Default client name, used as the storage namespace prefix.
pub const DEFAULT_CLIENT_NAME: &str = "bedita";

/// API client configuration.
///
/// `base_url` is the only required field. `api_key` is deprecated; configure
/// `client_id`/`client_secret` for the client-credentials flow instead — when
/// `client_id` is set, any `api_key` is dropped at construction time.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApiClientConfig {
    /// The BEdita API base URL
    pub base_url: String,
    /// The name of the client instance, also the storage namespace
    pub name: String,
    /// The API key to use. Deprecated in favour of `client_id`/`client_secret`.
    pub api_key: Option<String>,
    /// The client id used for the client-credentials flow
    pub client_id: Option<String>,
    /// The client secret used for the client-credentials flow
    pub client_secret: Option<String>,
    /// Per-request transport timeout
    pub timeout: Option<Duration>,
}

impl ApiClientConfig {
    /// Create a configuration for the given base URL with default name.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the client name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the deprecated API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the client-credentials pair.
    #[must_use]
    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set the per-request transport timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            name: DEFAULT_CLIENT_NAME.to_owned(),
            api_key: None,
            client_id: None,
            client_secret: None,
            timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name() {
        let config = ApiClientConfig::new("https://example.com");
        assert_eq!(config.name, "bedita");
        assert_eq!(config.base_url, "https://example.com");
    }

    #[test]
    fn custom_name() {
        let config = ApiClientConfig::new("https://example.com").name("gustavo-api");
        assert_eq!(config.name, "gustavo-api");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ApiClientConfig =
            serde_json::from_str(r#"{"base_url": "https://example.com"}"#).unwrap();
        assert_eq!(config.base_url, "https://example.com");
        assert_eq!(config.name, "bedita");
        assert!(config.api_key.is_none());
    }
}
