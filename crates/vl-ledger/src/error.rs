use vl_crypto::ProofError;
use vl_store::StoreError;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// An index or tree size lies outside what the ledger holds.
    ///
    /// Recoverable: the ledger state is untouched.
    #[error("out of range: {0}")]
    OutOfRange(ProofError),

    /// A proof or encoded value was malformed (wrong length, foreign digest).
    #[error("invalid proof: {0}")]
    InvalidProof(ProofError),

    /// Stored or reconstructed data disagrees with what the ledger recorded.
    ///
    /// Never retried and never healed automatically.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// The hash store failed. The failed operation did not partially apply.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ProofError> for LedgerError {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::IndexOutOfRange { .. }
            | ProofError::SizeOutOfRange { .. }
            | ProofError::InvertedSizes { .. } => Self::OutOfRange(err),
            _ => Self::InvalidProof(err),
        }
    }
}

impl LedgerError {
    pub(crate) fn integrity(index: u64, reason: impl std::fmt::Display) -> Self {
        Self::Integrity(format!("index {index}: {reason}"))
    }

    pub(crate) fn poisoned() -> Self {
        Self::Integrity("accumulator lock poisoned".into())
    }

    /// Whether this error is a range error the caller can correct.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange(_))
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
