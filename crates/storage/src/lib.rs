//! Candidate profile document store.
//!
//! Profiles are markdown documents keyed by lower-cased first name
//! (`<prefix>/<name>.md`) in any `object_store` backend.

pub mod backend;
pub mod error;

use std::sync::Arc;

use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::PutPayload;
use tracing::debug;

pub use backend::{BucketBackend, LocalBackend, StorageBackend};
pub use error::StorageError;

/// Key/value text fetch over a configured backend.
pub struct ProfileStore {
    backend: StorageBackend,
    prefix: String,
}

impl ProfileStore {
    pub fn new(backend: StorageBackend, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Create a store from config. Selects local, S3 or GCS via `PROFILE_STORE`.
    pub fn from_config(config: &mammoth_core::config::StorageConfig) -> Result<Self, StorageError> {
        let backend = StorageBackend::from_config(config)?;
        Ok(Self::new(backend, config.prefix.clone()))
    }

    /// Empty in-memory store (tests and local demos).
    pub fn in_memory() -> Self {
        Self::new(StorageBackend::Memory(Arc::new(InMemory::new())), "")
    }

    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Object key for a profile name: lower-cased, trimmed, `.md` suffixed.
    pub fn key_for(&self, name: &str) -> Result<ObjectPath, StorageError> {
        let safe = name.trim().to_lowercase();
        if safe.is_empty()
            || safe.starts_with('.')
            || safe.contains(['/', '\\'])
            || safe.chars().any(char::is_control)
        {
            return Err(StorageError::InvalidKey(name.to_string()));
        }
        let file_name = format!("{}.md", safe);
        let key = if self.prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", self.prefix, file_name)
        };
        Ok(ObjectPath::from(key))
    }

    /// Fetch a profile as UTF-8 text. A missing object is `Ok(None)`.
    pub async fn fetch(&self, name: &str) -> Result<Option<String>, StorageError> {
        let key = self.key_for(name)?;
        debug!(key = %key, backend = self.backend.label(), "fetching profile");

        let result = match self.backend.store().get(&key).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let bytes = result.bytes().await?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Write (or replace) a profile document.
    pub async fn put(&self, name: &str, contents: &str) -> Result<(), StorageError> {
        let key = self.key_for(name)?;
        self.backend
            .store()
            .put(&key, PutPayload::from(contents.to_string()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_is_case_insensitive() {
        let store = ProfileStore::in_memory();
        store.put("Jason", "Jason is great.").await.unwrap();

        assert_eq!(store.fetch("jason").await.unwrap().as_deref(), Some("Jason is great."));
        assert_eq!(store.fetch("JASON").await.unwrap().as_deref(), Some("Jason is great."));
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let store = ProfileStore::in_memory();
        assert!(store.fetch("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let store = ProfileStore::in_memory();
        assert!(matches!(store.fetch("../etc/passwd").await, Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.fetch("  ").await, Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn key_includes_prefix() {
        let store = ProfileStore::new(StorageBackend::Memory(Arc::new(InMemory::new())), "/candidates/");
        assert_eq!(store.key_for("Tanner").unwrap().as_ref(), "candidates/tanner.md");
    }

    #[tokio::test]
    async fn local_backend_reads_markdown_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("shailaja.md"), "# Shailaja\nStaff engineer").unwrap();

        let store = ProfileStore::new(StorageBackend::Local(LocalBackend::new(tmp.path()).unwrap()), "");
        let text = store.fetch("Shailaja").await.unwrap().unwrap();
        assert!(text.starts_with("# Shailaja"));
    }
}
