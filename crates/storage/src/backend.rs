use std::path::{Path, PathBuf};
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use tracing::info;

use mammoth_core::config::{StorageConfig, StoreBackend};

use crate::error::StorageError;

/// Unified storage backend wrapping object_store.
pub enum StorageBackend {
    Local(LocalBackend),
    S3(BucketBackend),
    Gcs(BucketBackend),
    Memory(Arc<InMemory>),
}

impl StorageBackend {
    /// Build the backend selected by `PROFILE_STORE`.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match config.backend {
            StoreBackend::Local => Ok(StorageBackend::Local(LocalBackend::new(&config.local_dir)?)),
            StoreBackend::S3 => Ok(StorageBackend::S3(BucketBackend::s3(config)?)),
            StoreBackend::Gcs => Ok(StorageBackend::Gcs(BucketBackend::gcs(config)?)),
        }
    }

    /// Get the underlying ObjectStore.
    pub fn store(&self) -> &dyn ObjectStore {
        match self {
            StorageBackend::Local(b) => b.store.as_ref(),
            StorageBackend::S3(b) | StorageBackend::Gcs(b) => b.store.as_ref(),
            StorageBackend::Memory(store) => store.as_ref(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StorageBackend::Local(_) => "local",
            StorageBackend::S3(_) => "s3",
            StorageBackend::Gcs(_) => "gcs",
            StorageBackend::Memory(_) => "memory",
        }
    }
}

/// Local filesystem backend.
pub struct LocalBackend {
    pub store: Arc<dyn ObjectStore>,
    pub root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root)?;
        let canonical = std::fs::canonicalize(root)?;
        let store = LocalFileSystem::new_with_prefix(&canonical)?;
        info!("Profile store: local backend at {}", canonical.display());
        Ok(Self {
            store: Arc::new(store),
            root: canonical,
        })
    }
}

/// Remote bucket backend (S3 or GCS).
pub struct BucketBackend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
}

impl BucketBackend {
    fn s3(config: &StorageConfig) -> Result<Self, StorageError> {
        let bucket = non_empty_bucket(config)?;

        let mut builder = AmazonS3Builder::new()
            .with_region(&config.aws_region)
            .with_bucket_name(bucket);

        if let Some(ref key) = config.aws_access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(ref secret) = config.aws_secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(ref endpoint) = config.aws_endpoint_url {
            // object_store requires absolute endpoint URLs
            let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.clone()
            } else {
                format!("https://{}", endpoint)
            };
            builder = builder
                .with_allow_http(endpoint_url.starts_with("http://"))
                .with_endpoint(endpoint_url);
        }

        let store = builder.build()?;
        info!("Profile store: S3 backend s3://{} (region: {})", bucket, config.aws_region);

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
        })
    }

    fn gcs(config: &StorageConfig) -> Result<Self, StorageError> {
        let bucket = non_empty_bucket(config)?;

        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
        if let Some(ref path) = config.gcs_service_account_path {
            builder = builder.with_service_account_path(path);
        }

        let store = builder.build()?;
        info!("Profile store: GCS backend gs://{}", bucket);

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
        })
    }
}

fn non_empty_bucket(config: &StorageConfig) -> Result<&str, StorageError> {
    let bucket = config.bucket.trim();
    if bucket.is_empty() {
        return Err(StorageError::NotConfigured("PROFILE_BUCKET not set".into()));
    }
    Ok(bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backend_creates_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested/profiles");
        let backend = LocalBackend::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(StorageBackend::Local(backend).label(), "local");
    }

    #[test]
    fn memory_backend_label() {
        let backend = StorageBackend::Memory(Arc::new(InMemory::new()));
        assert_eq!(backend.label(), "memory");
    }
}
