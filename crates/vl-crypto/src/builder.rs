use vl_types::Hash;

use crate::error::{ProofError, ProofResult};
use crate::hasher::TreeHasher;
use crate::proof::{ConsistencyProof, InclusionProof};
use crate::shape;

/// Read-only access to a leaf sequence, optionally with memoized subtree roots.
///
/// Implementations must be append-only views: `leaf(i)` never changes for
/// `i < leaf_count()`.
pub trait NodeSource {
    /// Number of leaves available.
    fn leaf_count(&self) -> u64;

    /// Leaf hash at `index`. Callers guarantee `index < leaf_count()`.
    fn leaf(&self, index: u64) -> Hash;

    /// Root of the complete subtree of height `level` covering leaves
    /// `[index << level, (index + 1) << level)`, if the source has it.
    ///
    /// Returning `None` makes the builder recompute it from the leaves.
    fn complete_subtree(&self, _level: u32, _index: u64) -> Option<Hash> {
        None
    }
}

impl NodeSource for [Hash] {
    fn leaf_count(&self) -> u64 {
        self.len() as u64
    }

    fn leaf(&self, index: u64) -> Hash {
        self[index as usize]
    }
}

impl NodeSource for Vec<Hash> {
    fn leaf_count(&self) -> u64 {
        self.len() as u64
    }

    fn leaf(&self, index: u64) -> Hash {
        self[index as usize]
    }
}

/// Computes roots and proofs over a [`NodeSource`].
///
/// Pure and lock-free: the builder only reads from its source, so many
/// builders may run in parallel over the same snapshot.
pub struct ProofBuilder<'a, S: NodeSource + ?Sized> {
    hasher: TreeHasher,
    source: &'a S,
}

impl<'a, S: NodeSource + ?Sized> ProofBuilder<'a, S> {
    pub fn new(hasher: TreeHasher, source: &'a S) -> Self {
        Self { hasher, source }
    }

    /// Root of the tree over the first `size` leaves.
    pub fn root(&self, size: u64) -> ProofResult<Hash> {
        self.check_size(size)?;
        if size == 0 {
            return Ok(self.hasher.empty_root());
        }
        Ok(self.subtree_root(0, size))
    }

    /// Audit path proving leaf `index` is in the tree of `size` leaves.
    pub fn inclusion_proof(&self, index: u64, size: u64) -> ProofResult<InclusionProof> {
        self.check_size(size)?;
        if index >= size {
            return Err(ProofError::IndexOutOfRange { index, size });
        }
        let mut hashes = Vec::with_capacity(shape::inclusion_proof_len(index, size));
        self.audit_path(index, 0, size, &mut hashes);
        Ok(InclusionProof {
            algorithm: self.hasher.algorithm(),
            index,
            size,
            hashes,
        })
    }

    /// Proof that the tree of `size2` leaves extends the tree of `size1` leaves.
    pub fn consistency_proof(&self, size1: u64, size2: u64) -> ProofResult<ConsistencyProof> {
        if size1 > size2 {
            return Err(ProofError::InvertedSizes { size1, size2 });
        }
        self.check_size(size2)?;
        let mut hashes = Vec::with_capacity(shape::consistency_proof_len(size1, size2));
        if size1 > 0 && size1 < size2 {
            self.subproof(size1, 0, size2, true, &mut hashes);
        }
        Ok(ConsistencyProof {
            algorithm: self.hasher.algorithm(),
            size1,
            size2,
            hashes,
        })
    }

    /// Root of the leaf range `[lo, hi)`. Requires `lo < hi <= leaf_count()`.
    pub fn subtree_root(&self, lo: u64, hi: u64) -> Hash {
        debug_assert!(lo < hi && hi <= self.source.leaf_count());
        if hi - lo == 1 {
            return self.source.leaf(lo);
        }
        if shape::is_complete(lo, hi) {
            let level = shape::level_of(hi - lo);
            if let Some(hash) = self.source.complete_subtree(level, lo >> level) {
                return hash;
            }
        }
        let k = shape::split_point(hi - lo);
        let left = self.subtree_root(lo, lo + k);
        let right = self.subtree_root(lo + k, hi);
        self.hasher.node_hash(&left, &right)
    }

    fn check_size(&self, size: u64) -> ProofResult<()> {
        let available = self.source.leaf_count();
        if size > available {
            return Err(ProofError::SizeOutOfRange { size, available });
        }
        Ok(())
    }

    fn audit_path(&self, index: u64, lo: u64, hi: u64, out: &mut Vec<Hash>) {
        if hi - lo == 1 {
            return;
        }
        let k = shape::split_point(hi - lo);
        if index < lo + k {
            self.audit_path(index, lo, lo + k, out);
            out.push(self.subtree_root(lo + k, hi));
        } else {
            self.audit_path(index, lo + k, hi, out);
            out.push(self.subtree_root(lo, lo + k));
        }
    }

    /// `m` counts old leaves relative to `lo`. `whole_old_tree` stays true
    /// while `[lo, lo + m)` is the entire old tree, whose root the verifier
    /// already holds and so is left out of the proof.
    fn subproof(&self, m: u64, lo: u64, hi: u64, whole_old_tree: bool, out: &mut Vec<Hash>) {
        let n = hi - lo;
        if m == n {
            if !whole_old_tree {
                out.push(self.subtree_root(lo, hi));
            }
            return;
        }
        let k = shape::split_point(n);
        if m <= k {
            self.subproof(m, lo, lo + k, whole_old_tree, out);
            out.push(self.subtree_root(lo + k, hi));
        } else {
            self.subproof(m - k, lo + k, hi, false, out);
            out.push(self.subtree_root(lo, lo + k));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_leaves() -> Vec<Vec<u8>> {
        [
            "",
            "00",
            "10",
            "2021",
            "3031",
            "40414243",
            "5051525354555657",
            "606162636465666768696a6b6c6d6e6f",
        ]
        .iter()
        .map(|h| hex::decode(h).unwrap())
        .collect()
    }

    fn rfc_leaves(hasher: &TreeHasher) -> Vec<Hash> {
        hex_leaves().iter().map(|d| hasher.leaf_hash(d)).collect()
    }

    #[test]
    fn roots_match_rfc6962_reference_tree() {
        let hasher = TreeHasher::SHA256;
        let leaves = rfc_leaves(&hasher);
        let builder = ProofBuilder::new(hasher, leaves.as_slice());
        let expected = [
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d",
            "fac54203e7cc696cf0dfcb42c92a1d9dbaf70ad9e621f4bd8d98662f00e3c125",
            "aeb6bcfe274b70a14fb067a5e5578264db0fa9b51af5e0ba159158f329e06e77",
            "d37ee418976dd95753c1c73862b9398fa2a2cf9b4ff0fdfe8b30cd95209614b7",
            "4e3bbb1f7b478dcfe71fb631631519a3bca12c9aefca1612bfce4c13a86264d4",
            "76e67dadbcdf1e10e1b74ddc608abd2f98dfb16fbce75277b5232a127f2087ef",
            "ddb89be403809e325750d3d263cd78929c2942b7942a34b77e122c9594a74c8c",
            "5dc9da79a70659a9ad559cb701ded9a2ab9d823aad2f4960cfe370eff4604328",
        ];
        for (i, root) in expected.iter().enumerate() {
            assert_eq!(builder.root(i as u64 + 1).unwrap().to_hex(), *root, "size {}", i + 1);
        }
        assert_eq!(builder.root(0).unwrap(), hasher.empty_root());
    }

    /// Named nodes of the seven-leaf example tree in RFC 6962 section 2.1.3.
    struct SevenLeafTree {
        leaf: Vec<Hash>,
        g: Hash,
        h: Hash,
        i: Hash,
        k: Hash,
        l: Hash,
    }

    fn seven_leaf_tree(hasher: &TreeHasher) -> SevenLeafTree {
        let leaf: Vec<Hash> = (0..7u8).map(|i| hasher.leaf_hash(&[i])).collect();
        let g = hasher.node_hash(&leaf[0], &leaf[1]);
        let h = hasher.node_hash(&leaf[2], &leaf[3]);
        let i = hasher.node_hash(&leaf[4], &leaf[5]);
        let k = hasher.node_hash(&g, &h);
        let l = hasher.node_hash(&i, &leaf[6]);
        SevenLeafTree { leaf, g, h, i, k, l }
    }

    #[test]
    fn inclusion_paths_follow_rfc_example() {
        let hasher = TreeHasher::BLAKE3;
        let t = seven_leaf_tree(&hasher);
        let builder = ProofBuilder::new(hasher, &t.leaf);

        assert_eq!(builder.inclusion_proof(0, 7).unwrap().hashes, vec![t.leaf[1], t.h, t.l]);
        assert_eq!(builder.inclusion_proof(3, 7).unwrap().hashes, vec![t.leaf[2], t.g, t.l]);
        assert_eq!(builder.inclusion_proof(4, 7).unwrap().hashes, vec![t.leaf[5], t.leaf[6], t.k]);
        assert_eq!(builder.inclusion_proof(6, 7).unwrap().hashes, vec![t.i, t.k]);
        assert_eq!(builder.root(7).unwrap(), hasher.node_hash(&t.k, &t.l));
    }

    #[test]
    fn consistency_proofs_follow_rfc_example() {
        let hasher = TreeHasher::BLAKE3;
        let t = seven_leaf_tree(&hasher);
        let builder = ProofBuilder::new(hasher, &t.leaf);

        assert_eq!(
            builder.consistency_proof(3, 7).unwrap().hashes,
            vec![t.leaf[2], t.leaf[3], t.g, t.l]
        );
        assert_eq!(builder.consistency_proof(4, 7).unwrap().hashes, vec![t.l]);
        assert_eq!(
            builder.consistency_proof(6, 7).unwrap().hashes,
            vec![t.i, t.leaf[6], t.k]
        );
    }

    #[test]
    fn trivial_consistency_proofs_are_empty() {
        let hasher = TreeHasher::SHA256;
        let leaves = rfc_leaves(&hasher);
        let builder = ProofBuilder::new(hasher, &leaves);
        assert!(builder.consistency_proof(0, 8).unwrap().hashes.is_empty());
        assert!(builder.consistency_proof(5, 5).unwrap().hashes.is_empty());
        assert!(builder.consistency_proof(0, 0).unwrap().hashes.is_empty());
    }

    #[test]
    fn index_at_or_past_size_is_rejected() {
        let hasher = TreeHasher::SHA256;
        let leaves = rfc_leaves(&hasher);
        let builder = ProofBuilder::new(hasher, &leaves[..3]);
        assert_eq!(
            builder.inclusion_proof(5, 3).unwrap_err(),
            ProofError::IndexOutOfRange { index: 5, size: 3 }
        );
        assert_eq!(
            builder.inclusion_proof(3, 3).unwrap_err(),
            ProofError::IndexOutOfRange { index: 3, size: 3 }
        );
    }

    #[test]
    fn sizes_past_available_leaves_are_rejected() {
        let hasher = TreeHasher::SHA256;
        let leaves = rfc_leaves(&hasher);
        let builder = ProofBuilder::new(hasher, &leaves[..3]);
        let range = ProofError::SizeOutOfRange {
            size: 4,
            available: 3,
        };
        assert_eq!(builder.root(4).unwrap_err(), range);
        assert_eq!(builder.inclusion_proof(0, 4).unwrap_err(), range);
        assert_eq!(builder.consistency_proof(1, 4).unwrap_err(), range);
        assert_eq!(
            builder.consistency_proof(3, 2).unwrap_err(),
            ProofError::InvertedSizes { size1: 3, size2: 2 }
        );
    }

    /// Source that memoizes every complete subtree, like the ledger's accumulator.
    struct Memoized {
        levels: Vec<Vec<Hash>>,
    }

    impl Memoized {
        fn new(hasher: &TreeHasher, leaves: &[Hash]) -> Self {
            let mut levels = vec![leaves.to_vec()];
            while levels.last().map_or(false, |l| l.len() > 1) {
                let prev = levels.last().unwrap();
                let next: Vec<Hash> = prev
                    .chunks_exact(2)
                    .map(|pair| hasher.node_hash(&pair[0], &pair[1]))
                    .collect();
                levels.push(next);
            }
            Self { levels }
        }
    }

    impl NodeSource for Memoized {
        fn leaf_count(&self) -> u64 {
            self.levels[0].len() as u64
        }

        fn leaf(&self, index: u64) -> Hash {
            self.levels[0][index as usize]
        }

        fn complete_subtree(&self, level: u32, index: u64) -> Option<Hash> {
            self.levels
                .get(level as usize)
                .and_then(|l| l.get(index as usize))
                .copied()
        }
    }

    #[test]
    fn memoized_source_agrees_with_plain_leaves() {
        let hasher = TreeHasher::BLAKE3;
        let leaves: Vec<Hash> = (0..37u32).map(|i| hasher.leaf_hash(&i.to_le_bytes())).collect();
        let memo = Memoized::new(&hasher, &leaves);
        let plain = ProofBuilder::new(hasher, &leaves);
        let fast = ProofBuilder::new(hasher, &memo);

        for size in 0..=leaves.len() as u64 {
            assert_eq!(plain.root(size).unwrap(), fast.root(size).unwrap());
            for index in 0..size {
                assert_eq!(
                    plain.inclusion_proof(index, size).unwrap(),
                    fast.inclusion_proof(index, size).unwrap()
                );
            }
            for old in 0..=size {
                assert_eq!(
                    plain.consistency_proof(old, size).unwrap(),
                    fast.consistency_proof(old, size).unwrap()
                );
            }
        }
    }

    #[test]
    fn proof_lengths_match_shape_predictions() {
        let hasher = TreeHasher::SHA256;
        let leaves: Vec<Hash> = (0..20u8).map(|i| hasher.leaf_hash(&[i])).collect();
        let builder = ProofBuilder::new(hasher, &leaves);
        for size in 1..=20u64 {
            for index in 0..size {
                let proof = builder.inclusion_proof(index, size).unwrap();
                assert_eq!(proof.hashes.len(), shape::inclusion_proof_len(index, size));
            }
            for old in 0..=size {
                let proof = builder.consistency_proof(old, size).unwrap();
                assert_eq!(proof.hashes.len(), shape::consistency_proof_len(old, size));
            }
        }
    }
}
