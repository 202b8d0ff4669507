//! Proof value types and their flat binary encoding.
//!
//! On-wire format (all integers big-endian):
//! ```text
//! InclusionProof:   [1: algorithm id][8: index][8: size][4: count][count × 32: hashes]
//! ConsistencyProof: [1: algorithm id][8: size1][8: size2][4: count][count × 32: hashes]
//! ```

use serde::{Deserialize, Serialize};
use vl_types::{DigestAlgorithm, Hash, HASH_LEN};

use crate::error::{ProofError, ProofResult};

const HEADER_LEN: usize = 1 + 8 + 8 + 4;

/// Merkle audit path for one leaf, ordered leaf-adjacent first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub algorithm: DigestAlgorithm,
    pub index: u64,
    pub size: u64,
    pub hashes: Vec<Hash>,
}

impl InclusionProof {
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self.algorithm, self.index, self.size, &self.hashes)
    }

    pub fn from_bytes(data: &[u8]) -> ProofResult<Self> {
        let (algorithm, index, size, hashes) = decode(data)?;
        Ok(Self {
            algorithm,
            index,
            size,
            hashes,
        })
    }
}

/// Evidence that the tree at `size2` extends the tree at `size1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyProof {
    pub algorithm: DigestAlgorithm,
    pub size1: u64,
    pub size2: u64,
    pub hashes: Vec<Hash>,
}

impl ConsistencyProof {
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self.algorithm, self.size1, self.size2, &self.hashes)
    }

    pub fn from_bytes(data: &[u8]) -> ProofResult<Self> {
        let (algorithm, size1, size2, hashes) = decode(data)?;
        Ok(Self {
            algorithm,
            size1,
            size2,
            hashes,
        })
    }
}

fn encode(algorithm: DigestAlgorithm, a: u64, b: u64, hashes: &[Hash]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + hashes.len() * HASH_LEN);
    buf.push(algorithm.id());
    buf.extend_from_slice(&a.to_be_bytes());
    buf.extend_from_slice(&b.to_be_bytes());
    buf.extend_from_slice(&(hashes.len() as u32).to_be_bytes());
    for hash in hashes {
        buf.extend_from_slice(hash.as_bytes());
    }
    buf
}

fn decode(data: &[u8]) -> ProofResult<(DigestAlgorithm, u64, u64, Vec<Hash>)> {
    if data.len() < HEADER_LEN {
        return Err(ProofError::Encoding(format!(
            "too short: have {}, need at least {HEADER_LEN}",
            data.len()
        )));
    }
    let algorithm = DigestAlgorithm::from_id(data[0])?;
    let a = read_u64(&data[1..9]);
    let b = read_u64(&data[9..17]);
    let count = u32::from_be_bytes([data[17], data[18], data[19], data[20]]) as usize;

    let body = &data[HEADER_LEN..];
    if body.len() != count * HASH_LEN {
        return Err(ProofError::Encoding(format!(
            "expected {count} hashes ({} bytes), found {} bytes",
            count * HASH_LEN,
            body.len()
        )));
    }
    let hashes = body
        .chunks_exact(HASH_LEN)
        .map(Hash::from_slice)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((algorithm, a, b, hashes))
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(bytes);
    u64::from_be_bytes(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(count: u8) -> Vec<Hash> {
        (0..count).map(|i| Hash::from_bytes([i; HASH_LEN])).collect()
    }

    #[test]
    fn inclusion_encoding_layout() {
        let proof = InclusionProof {
            algorithm: DigestAlgorithm::Sha256,
            index: 1,
            size: 3,
            hashes: hashes(2),
        };
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN + 2 * HASH_LEN);
        assert_eq!(bytes[0], DigestAlgorithm::Sha256.id());
        assert_eq!(&bytes[17..21], &[0, 0, 0, 2]);
        assert_eq!(InclusionProof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn empty_consistency_proof_encodes_header_only() {
        let proof = ConsistencyProof {
            algorithm: DigestAlgorithm::Blake3,
            size1: 0,
            size2: 9,
            hashes: vec![],
        };
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(ConsistencyProof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn decode_rejects_count_mismatch() {
        let proof = ConsistencyProof {
            algorithm: DigestAlgorithm::Blake3,
            size1: 2,
            size2: 3,
            hashes: hashes(2),
        };
        let bytes = proof.to_bytes();
        let err = ConsistencyProof::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ProofError::Encoding(_)));
    }

    #[test]
    fn decode_rejects_short_header() {
        assert!(matches!(
            InclusionProof::from_bytes(&[1, 0, 0]),
            Err(ProofError::Encoding(_))
        ));
    }

    #[test]
    fn json_carries_hex_hashes() {
        let proof = InclusionProof {
            algorithm: DigestAlgorithm::Blake3,
            index: 0,
            size: 2,
            hashes: hashes(1),
        };
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["algorithm"], "blake3");
        assert_eq!(json["hashes"][0], Hash::from_bytes([0; HASH_LEN]).to_hex());
    }
}
