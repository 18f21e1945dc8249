use thiserror::Error;

/// Errors that can occur during object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The provided object key is invalid.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    /// The object exceeds the configured size limit.
    #[error("object exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The remote provider rejected or failed the request.
    #[error("storage provider error: {0}")]
    Provider(String),
    /// The backend is missing required configuration.
    #[error("storage misconfigured: {0}")]
    Config(String),
}
