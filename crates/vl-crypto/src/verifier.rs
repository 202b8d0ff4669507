use vl_types::{DigestAlgorithm, Hash};

use crate::error::{ProofError, ProofResult};
use crate::hasher::TreeHasher;
use crate::proof::{ConsistencyProof, InclusionProof};
use crate::shape;

/// Stateless proof checker.
///
/// The verifier holds no notion of truth of its own: it only recomputes
/// roots from proofs and compares them with roots the caller supplies.
/// `Ok(false)` means the proof does not match; `Err` means the input was
/// malformed (out-of-range index, wrong proof length, foreign digest).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProofVerifier {
    hasher: TreeHasher,
}

impl ProofVerifier {
    pub fn new(hasher: TreeHasher) -> Self {
        Self { hasher }
    }

    pub fn for_algorithm(algorithm: DigestAlgorithm) -> Self {
        Self::new(TreeHasher::new(algorithm))
    }

    pub fn hasher(&self) -> &TreeHasher {
        &self.hasher
    }

    /// Check that `entry` sits at `index` in the tree of `size` leaves with root `expected_root`.
    pub fn verify_inclusion(
        &self,
        entry: &[u8],
        index: u64,
        size: u64,
        proof: &[Hash],
        expected_root: &Hash,
    ) -> ProofResult<bool> {
        let leaf = self.hasher.leaf_hash(entry);
        self.verify_inclusion_hash(&leaf, index, size, proof, expected_root)
    }

    /// Like [`Self::verify_inclusion`], starting from an already computed leaf hash.
    pub fn verify_inclusion_hash(
        &self,
        leaf: &Hash,
        index: u64,
        size: u64,
        proof: &[Hash],
        expected_root: &Hash,
    ) -> ProofResult<bool> {
        let candidate = self.root_from_inclusion(leaf, index, size, proof)?;
        Ok(candidate == *expected_root)
    }

    /// Verify a self-describing [`InclusionProof`].
    pub fn verify_inclusion_proof(
        &self,
        entry: &[u8],
        proof: &InclusionProof,
        expected_root: &Hash,
    ) -> ProofResult<bool> {
        self.check_algorithm(proof.algorithm)?;
        self.verify_inclusion(entry, proof.index, proof.size, &proof.hashes, expected_root)
    }

    /// Recompute the root implied by `leaf`, its position, and its audit path.
    ///
    /// Left/right decisions come from `index` and `size` alone (RFC 9162,
    /// section 2.1.3.2).
    pub fn root_from_inclusion(
        &self,
        leaf: &Hash,
        index: u64,
        size: u64,
        proof: &[Hash],
    ) -> ProofResult<Hash> {
        if index >= size {
            return Err(ProofError::IndexOutOfRange { index, size });
        }
        let expected = shape::inclusion_proof_len(index, size);
        if proof.len() != expected {
            return Err(ProofError::ProofLength {
                expected,
                actual: proof.len(),
            });
        }

        let mut fnode = index;
        let mut snode = size - 1;
        let mut root = *leaf;
        for sibling in proof {
            if fnode & 1 == 1 || fnode == snode {
                root = self.hasher.node_hash(sibling, &root);
                // Skip levels where this node has no right sibling.
                while fnode & 1 == 0 && fnode != 0 {
                    fnode >>= 1;
                    snode >>= 1;
                }
            } else {
                root = self.hasher.node_hash(&root, sibling);
            }
            fnode >>= 1;
            snode >>= 1;
        }
        Ok(root)
    }

    /// Check that the tree of `size2` leaves (root `root2`) extends the tree
    /// of `size1` leaves (root `root1`).
    pub fn verify_consistency(
        &self,
        size1: u64,
        size2: u64,
        root1: &Hash,
        root2: &Hash,
        proof: &[Hash],
    ) -> ProofResult<bool> {
        if size1 > size2 {
            return Err(ProofError::InvertedSizes { size1, size2 });
        }
        let expected = shape::consistency_proof_len(size1, size2);
        if proof.len() != expected {
            return Err(ProofError::ProofLength {
                expected,
                actual: proof.len(),
            });
        }
        if size1 == 0 {
            // The empty tree's root is a fixed constant; a size-0 tree has no other.
            let empty = self.hasher.empty_root();
            return Ok(*root1 == empty && (size2 > 0 || *root2 == empty));
        }
        if size1 == size2 {
            return Ok(root1 == root2);
        }

        let (candidate1, candidate2) = self.roots_from_consistency(size1, size2, root1, proof);
        Ok(candidate1 == *root1 && candidate2 == *root2)
    }

    /// Verify a self-describing [`ConsistencyProof`].
    pub fn verify_consistency_proof(
        &self,
        proof: &ConsistencyProof,
        root1: &Hash,
        root2: &Hash,
    ) -> ProofResult<bool> {
        self.check_algorithm(proof.algorithm)?;
        self.verify_consistency(proof.size1, proof.size2, root1, root2, &proof.hashes)
    }

    /// Rebuild both roots from a consistency proof (RFC 9162, section 2.1.4.2).
    ///
    /// Requires `0 < size1 < size2` and a proof of the predicted length.
    fn roots_from_consistency(
        &self,
        size1: u64,
        size2: u64,
        root1: &Hash,
        proof: &[Hash],
    ) -> (Hash, Hash) {
        // When the old tree is a complete subtree its root is implied, not sent.
        let (seed, rest) = if size1.is_power_of_two() {
            (*root1, proof)
        } else {
            (proof[0], &proof[1..])
        };

        let mut fnode = size1 - 1;
        let mut snode = size2 - 1;
        while fnode & 1 == 1 {
            fnode >>= 1;
            snode >>= 1;
        }

        let mut old_root = seed;
        let mut new_root = seed;
        for hash in rest {
            if fnode & 1 == 1 || fnode == snode {
                old_root = self.hasher.node_hash(hash, &old_root);
                new_root = self.hasher.node_hash(hash, &new_root);
                while fnode & 1 == 0 && fnode != 0 {
                    fnode >>= 1;
                    snode >>= 1;
                }
            } else {
                new_root = self.hasher.node_hash(&new_root, hash);
            }
            fnode >>= 1;
            snode >>= 1;
        }
        (old_root, new_root)
    }

    fn check_algorithm(&self, actual: DigestAlgorithm) -> ProofResult<()> {
        let expected = self.hasher.algorithm();
        if actual != expected {
            return Err(ProofError::AlgorithmMismatch { expected, actual });
        }
        Ok(())
    }
}
