use super::adapter::{MemoryStorageAdapter, StorageAdapter, StorageError};
use crate::config::DEFAULT_CLIENT_NAME;
use std::sync::Arc;

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Namespaced access to the storage adapter.
///
/// Keys are prefixed with `<name><separator>` so that several clients can
/// share one backing store. Exposes typed accessors for the access and
/// refresh tokens on top of raw `get`/`set`/`remove`.
///
/// Access-token absence does not imply refresh-token absence: the access
/// token may be cleared on its own to force a renewal. Both tokens are
/// cleared together only by [`clear_tokens`](Self::clear_tokens).
#[derive(Clone)]
pub struct StorageService {
    adapter: Arc<dyn StorageAdapter>,
    name: String,
    separator: String,
}

impl StorageService {
    /// Create a service over an in-memory adapter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_adapter(name, Arc::new(MemoryStorageAdapter::new()))
    }

    /// Create a service over the given adapter.
    #[must_use]
    pub fn with_adapter(name: impl Into<String>, adapter: Arc<dyn StorageAdapter>) -> Self {
        let name = name.into();
        Self {
            adapter,
            name: if name.is_empty() {
                DEFAULT_CLIENT_NAME.to_owned()
            } else {
                name
            },
            separator: ".".to_owned(),
        }
    }

    /// Change the namespace separator (default `"."`).
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}{}", self.name, self.separator, key)
    }

    /// Get a namespaced value.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing store fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.adapter.get(&self.namespaced(key)).await
    }

    /// Set a namespaced value.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing store fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.adapter.set(&self.namespaced(key), value).await
    }

    /// Remove a namespaced key.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing store fails.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.adapter.remove(&self.namespaced(key)).await
    }

    /// The stored access token, if any.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing store fails.
    pub async fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.get(ACCESS_TOKEN_KEY).await
    }

    /// Store the access token.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing store fails.
    pub async fn set_access_token(&self, value: &str) -> Result<(), StorageError> {
        self.set(ACCESS_TOKEN_KEY, value).await
    }

    /// The stored refresh token, if any.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing store fails.
    pub async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.get(REFRESH_TOKEN_KEY).await
    }

    /// Store the refresh token.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing store fails.
    pub async fn set_refresh_token(&self, value: &str) -> Result<(), StorageError> {
        self.set(REFRESH_TOKEN_KEY, value).await
    }

    /// Remove both tokens.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing store fails.
    pub async fn clear_tokens(&self) -> Result<(), StorageError> {
        self.remove(ACCESS_TOKEN_KEY).await?;
        self.remove(REFRESH_TOKEN_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_set_remove_are_namespaced() {
        let adapter = Arc::new(MemoryStorageAdapter::new());
        let service = StorageService::with_adapter("bedita", adapter.clone());

        service.set("one", "hello").await.unwrap();
        assert_eq!(
            adapter.get("bedita.one").await.unwrap().as_deref(),
            Some("hello")
        );
        assert_eq!(service.get("one").await.unwrap().as_deref(), Some("hello"));

        service.remove("one").await.unwrap();
        assert_eq!(service.get("one").await.unwrap(), None);
    }

    #[tokio::test]
    async fn custom_namespace_separator() {
        let adapter = Arc::new(MemoryStorageAdapter::new());
        let service = StorageService::with_adapter("gustavo", adapter.clone()).separator("_");

        service.set_access_token("abc").await.unwrap();
        assert_eq!(
            adapter.get("gustavo_access_token").await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn token_round_trip_and_clear() {
        let service = StorageService::new("bedita");

        service.set_access_token("access-1").await.unwrap();
        service.set_refresh_token("refresh-1").await.unwrap();
        assert_eq!(
            service.access_token().await.unwrap().as_deref(),
            Some("access-1")
        );
        assert_eq!(
            service.refresh_token().await.unwrap().as_deref(),
            Some("refresh-1")
        );

        service.clear_tokens().await.unwrap();
        assert_eq!(service.access_token().await.unwrap(), None);
        assert_eq!(service.refresh_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn access_token_can_be_cleared_alone() {
        let service = StorageService::new("bedita");
        service.set_access_token("access-1").await.unwrap();
        service.set_refresh_token("refresh-1").await.unwrap();

        service.remove(ACCESS_TOKEN_KEY).await.unwrap();
        assert_eq!(service.access_token().await.unwrap(), None);
        assert_eq!(
            service.refresh_token().await.unwrap().as_deref(),
            Some("refresh-1")
        );
    }

    #[tokio::test]
    async fn empty_name_falls_back_to_default() {
        let adapter = Arc::new(MemoryStorageAdapter::new());
        let service = StorageService::with_adapter("", adapter.clone());
        service.set("k", "v").await.unwrap();
        assert_eq!(adapter.get("bedita.k").await.unwrap().as_deref(), Some("v"));
    }
}
