use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("provider error: {0}")]
    ProviderError(String),
    #[error("storage error: {0}")]
    StorageError(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, WalletError>;
