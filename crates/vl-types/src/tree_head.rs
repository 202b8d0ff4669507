use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::DigestAlgorithm;
use crate::error::TypeError;
use crate::hash::{Hash, HASH_LEN};

/// A root hash bound to the tree size and digest that produced it.
///
/// Wire format (41 bytes):
/// ```text
/// [1 byte: algorithm id][8 bytes: size, big-endian][32 bytes: root]
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeHead {
    pub algorithm: DigestAlgorithm,
    pub size: u64,
    pub root: Hash,
}

impl TreeHead {
    /// Encoded length in bytes.
    pub const ENCODED_LEN: usize = 1 + 8 + HASH_LEN;

    pub fn new(algorithm: DigestAlgorithm, size: u64, root: Hash) -> Self {
        Self {
            algorithm,
            size,
            root,
        }
    }

    /// Flat binary encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        buf.push(self.algorithm.id());
        buf.extend_from_slice(&self.size.to_be_bytes());
        buf.extend_from_slice(self.root.as_bytes());
        buf
    }

    /// Decode the flat binary encoding.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TypeError> {
        if data.len() != Self::ENCODED_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::ENCODED_LEN,
                actual: data.len(),
            });
        }
        let algorithm = DigestAlgorithm::from_id(data[0])?;
        let mut size = [0u8; 8];
        size.copy_from_slice(&data[1..9]);
        let root = Hash::from_slice(&data[9..])?;
        Ok(Self {
            algorithm,
            size: u64::from_be_bytes(size),
            root,
        })
    }
}

impl fmt::Display for TreeHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.algorithm, self.size, self.root)
    }
}
