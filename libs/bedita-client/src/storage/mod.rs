//! Token and user-blob persistence: a raw key/value [`StorageAdapter`]
//! boundary plus the namespacing [`StorageService`] built on top of it.

mod adapter;
mod service;

pub use adapter::{FileStorageAdapter, MemoryStorageAdapter, StorageAdapter, StorageError};
pub use service::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, StorageService};
