use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Notification error: {0}")]
    NotificationError(String),
    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
