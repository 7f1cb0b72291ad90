use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid profile key: {0:?}")]
    InvalidKey(String),

    #[error("not configured: {0}")]
    NotConfigured(String),
}
