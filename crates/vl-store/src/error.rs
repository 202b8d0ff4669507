use vl_types::DigestAlgorithm;

/// Errors from hash store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record failed its checksum or could not be decoded.
    #[error("corrupt record at index {index}: {reason}")]
    Corrupt { index: u64, reason: String },

    /// The store file is not a hash store or uses an unsupported layout.
    #[error("invalid store format: {0}")]
    Format(String),

    /// The store holds hashes produced by a different digest.
    #[error("store holds {found} hashes, expected {expected}")]
    AlgorithmMismatch {
        expected: DigestAlgorithm,
        found: DigestAlgorithm,
    },

    /// Another handle, possibly in another process, holds the store file.
    #[error("store {0} is locked by another handle")]
    Locked(String),

    /// An internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
