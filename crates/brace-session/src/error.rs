//! Error types for session operations.

/// Error type for session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key is reserved for session bookkeeping.
    #[error("Reserved session key: {0}")]
    ReservedKey(String),

    /// The storage key contains characters a backend cannot address.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// A value could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error from a storage backend.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error from a storage backend.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;
