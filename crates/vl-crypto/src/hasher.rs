use sha2::{Digest, Sha256};
use vl_types::{DigestAlgorithm, Hash};

/// Prefix byte for leaf hashes.
pub const LEAF_PREFIX: u8 = 0x00;
/// Prefix byte for internal node hashes.
pub const NODE_PREFIX: u8 = 0x01;

/// Domain-separated tree hasher.
///
/// Leaves hash as `H(0x00 || entry)` and internal nodes as
/// `H(0x01 || left || right)`. The prefixes keep a leaf from ever being
/// reinterpreted as an internal node (and vice versa), so a crafted entry
/// cannot stand in for a subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeHasher {
    algorithm: DigestAlgorithm,
}

impl TreeHasher {
    /// RFC 6962 compatible SHA-256 hasher.
    pub const SHA256: Self = Self::new(DigestAlgorithm::Sha256);
    /// BLAKE3 hasher.
    pub const BLAKE3: Self = Self::new(DigestAlgorithm::Blake3);

    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The digest this hasher uses.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Root of the empty tree: the digest of the empty input.
    pub fn empty_root(&self) -> Hash {
        self.digest(&[])
    }

    /// Hash one ledger entry.
    pub fn leaf_hash(&self, entry: &[u8]) -> Hash {
        self.digest(&[&[LEAF_PREFIX], entry])
    }

    /// Hash two child hashes into their parent.
    pub fn node_hash(&self, left: &Hash, right: &Hash) -> Hash {
        self.digest(&[&[NODE_PREFIX], left.as_bytes(), right.as_bytes()])
    }

    fn digest(&self, parts: &[&[u8]]) -> Hash {
        match self.algorithm {
            DigestAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                Hash::from_bytes(hasher.finalize().into())
            }
            DigestAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                for part in parts {
                    hasher.update(part);
                }
                Hash::from_bytes(*hasher.finalize().as_bytes())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_rfc6962_vectors() {
        let hasher = TreeHasher::SHA256;
        assert_eq!(
            hasher.empty_root().to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hasher.leaf_hash(b"").to_hex(),
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
        );
    }

    #[test]
    fn hashing_is_deterministic() {
        for hasher in [TreeHasher::SHA256, TreeHasher::BLAKE3] {
            assert_eq!(hasher.leaf_hash(b"entry"), hasher.leaf_hash(b"entry"));
            let l = hasher.leaf_hash(b"l");
            let r = hasher.leaf_hash(b"r");
            assert_eq!(hasher.node_hash(&l, &r), hasher.node_hash(&l, &r));
        }
    }

    #[test]
    fn node_hash_is_order_sensitive() {
        let hasher = TreeHasher::BLAKE3;
        let l = hasher.leaf_hash(b"l");
        let r = hasher.leaf_hash(b"r");
        assert_ne!(hasher.node_hash(&l, &r), hasher.node_hash(&r, &l));
    }

    #[test]
    fn leaf_and_node_domains_are_separated() {
        for hasher in [TreeHasher::SHA256, TreeHasher::BLAKE3] {
            let l = hasher.leaf_hash(b"l");
            let r = hasher.leaf_hash(b"r");
            let mut concatenated = l.as_bytes().to_vec();
            concatenated.extend_from_slice(r.as_bytes());
            assert_ne!(hasher.leaf_hash(&concatenated), hasher.node_hash(&l, &r));
        }
    }

    #[test]
    fn algorithms_produce_different_hashes() {
        assert_ne!(
            TreeHasher::SHA256.leaf_hash(b"x"),
            TreeHasher::BLAKE3.leaf_hash(b"x")
        );
        assert_ne!(TreeHasher::SHA256.empty_root(), TreeHasher::BLAKE3.empty_root());
    }

    #[test]
    fn blake3_empty_root_is_plain_digest() {
        assert_eq!(
            TreeHasher::BLAKE3.empty_root().as_bytes(),
            blake3::hash(b"").as_bytes()
        );
    }
}
