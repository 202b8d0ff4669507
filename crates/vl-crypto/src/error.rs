use vl_types::{DigestAlgorithm, TypeError};

/// Errors from proof construction, verification, and proof decoding.
///
/// A proof that simply fails to verify is not an error; verification
/// returns `Ok(false)` for that. These variants cover malformed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    #[error("leaf index {index} out of range for tree size {size}")]
    IndexOutOfRange { index: u64, size: u64 },

    #[error("tree size {size} exceeds available leaves {available}")]
    SizeOutOfRange { size: u64, available: u64 },

    #[error("first tree size {size1} is larger than second tree size {size2}")]
    InvertedSizes { size1: u64, size2: u64 },

    #[error("proof has {actual} hashes, tree shape requires {expected}")]
    ProofLength { expected: usize, actual: usize },

    #[error("proof was built with {actual}, verifier expects {expected}")]
    AlgorithmMismatch {
        expected: DigestAlgorithm,
        actual: DigestAlgorithm,
    },

    #[error("malformed proof encoding: {0}")]
    Encoding(String),
}

impl From<TypeError> for ProofError {
    fn from(err: TypeError) -> Self {
        Self::Encoding(err.to_string())
    }
}

/// Result alias for proof operations.
pub type ProofResult<T> = Result<T, ProofError>;
