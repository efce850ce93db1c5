use async_trait::async_trait;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    /// An unknown or internal error happened with the backing medium
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

/// Represents a medium that can durably store opaque values by key.
///
/// This is the only thing the rest of the system knows about persistence,
/// so the backing medium can be swapped without touching the layers above.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()>;
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Helper trait to reduce boilerplate
pub trait IntoStorageError {
    fn any(self) -> StorageError;
}

impl IntoStorageError for std::io::Error {
    fn any(self) -> StorageError {
        StorageError::Internal(Box::new(self))
    }
}
