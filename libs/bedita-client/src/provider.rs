use crate::client::BEditaApiClient;
use crate::config::ApiClientConfig;
use crate::error::ClientError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Named registry of [`BEditaApiClient`] instances.
///
/// `get` returns the client registered under a name, constructing it on
/// first lookup from the supplied configuration. The registered name
/// overrides `config.name` and is immutable from then on. The provider is a
/// plain value — own one and share it, there is no global singleton.
#[derive(Default)]
pub struct ApiProvider {
    registry: RwLock<HashMap<String, Arc<BEditaApiClient>>>,
}

impl ApiProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the client registered under `name`, or create and register one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when no client is registered and the
    /// configuration is missing or has no `base_url`; construction errors
    /// propagate from [`BEditaApiClient::new`].
    pub fn get(
        &self,
        name: &str,
        config: Option<ApiClientConfig>,
    ) -> Result<Arc<BEditaApiClient>, ClientError> {
        let mut registry = self.registry.write();
        if let Some(client) = registry.get(name) {
            return Ok(client.clone());
        }

        let Some(mut config) = config else {
            return Err(ClientError::Config(
                "missing required API configuration".into(),
            ));
        };
        if config.base_url.is_empty() {
            return Err(ClientError::Config(
                "missing required API configuration".into(),
            ));
        }

        config.name = name.to_owned();
        let client = Arc::new(BEditaApiClient::new(config)?);
        registry.insert(name.to_owned(), client.clone());

        Ok(client)
    }

    /// Remove a client instance from the registry. Unknown names are a
    /// no-op.
    pub fn remove(&self, name: &str) {
        self.registry.write().remove(name);
    }
}
