use std::sync::RwLock;

use tracing::debug;
use vl_crypto::{
    ConsistencyProof, InclusionProof, NodeSource, ProofBuilder, ProofError, TreeHasher,
};
use vl_store::HashStore;
use vl_types::Hash;

use crate::error::{LedgerError, LedgerResult};

/// Leaf hashes plus the roots of every complete subtree, stored level by level.
///
/// Level 0 holds the leaves. `levels[h][i]` is the root of the aligned
/// subtree covering leaves `[i << h, (i + 1) << h)`, present once all of its
/// leaves have arrived. Entries are only ever pushed, never rewritten.
#[derive(Debug, Default)]
struct Levels {
    levels: Vec<Vec<Hash>>,
}

impl Levels {
    fn len(&self) -> u64 {
        self.levels.first().map_or(0, |leaves| leaves.len() as u64)
    }

    fn push(&mut self, hasher: &TreeHasher, leaf: Hash) {
        if self.levels.is_empty() {
            self.levels.push(Vec::new());
        }
        self.levels[0].push(leaf);

        // Each odd position closes a pair and completes its parent.
        let mut level = 0;
        let mut index = self.levels[0].len() - 1;
        while index % 2 == 1 {
            let row = &self.levels[level];
            let parent = hasher.node_hash(&row[index - 1], &row[index]);
            level += 1;
            if self.levels.len() == level {
                self.levels.push(Vec::new());
            }
            self.levels[level].push(parent);
            index /= 2;
        }
    }
}

impl NodeSource for Levels {
    fn leaf_count(&self) -> u64 {
        self.len()
    }

    fn leaf(&self, index: u64) -> Hash {
        self.levels[0][index as usize]
    }

    fn complete_subtree(&self, level: u32, index: u64) -> Option<Hash> {
        self.levels
            .get(level as usize)
            .and_then(|row| row.get(index as usize))
            .copied()
    }
}

/// Append-only Merkle accumulator.
///
/// Computes the root for any historical size and builds proofs in
/// O(log n) hash operations using its memoized complete subtrees.
/// Readers share the lock; an append holds it exclusively for the whole
/// store-then-record step, so readers see either the old size or the new one.
#[derive(Debug)]
pub struct MerkleAccumulator {
    hasher: TreeHasher,
    state: RwLock<Levels>,
}

impl MerkleAccumulator {
    pub fn new(hasher: TreeHasher) -> Self {
        Self {
            hasher,
            state: RwLock::new(Levels::default()),
        }
    }

    /// Rebuild an accumulator from previously stored leaf hashes.
    pub fn from_leaves(hasher: TreeHasher, leaves: impl IntoIterator<Item = Hash>) -> Self {
        let mut levels = Levels::default();
        for leaf in leaves {
            levels.push(&hasher, leaf);
        }
        Self {
            hasher,
            state: RwLock::new(levels),
        }
    }

    pub fn hasher(&self) -> &TreeHasher {
        &self.hasher
    }

    /// Number of leaves recorded.
    pub fn size(&self) -> LedgerResult<u64> {
        Ok(self.read()?.len())
    }

    /// Persist `leaf` to `store`, then record it.
    ///
    /// Returns `(index, new_size, new_root)`. If the store fails nothing is
    /// recorded and the size is unchanged. If the store assigns an index
    /// other than the current size the append is refused as an integrity
    /// violation.
    pub fn append<S: HashStore + ?Sized>(
        &self,
        leaf: Hash,
        store: &S,
    ) -> LedgerResult<(u64, u64, Hash)> {
        let mut state = self.state.write().map_err(|_| LedgerError::poisoned())?;
        let expected = state.len();

        let assigned = store.append(&leaf)?;
        if assigned != expected {
            return Err(LedgerError::integrity(
                expected,
                format!("store assigned index {assigned}"),
            ));
        }

        state.push(&self.hasher, leaf);
        let size = expected + 1;
        let root = ProofBuilder::new(self.hasher, &*state).subtree_root(0, size);
        debug!(index = expected, size, root = %root.short_hex(), "leaf recorded");
        Ok((expected, size, root))
    }

    /// Root of the tree over the first `size` leaves.
    pub fn root_at(&self, size: u64) -> LedgerResult<Hash> {
        let state = self.read()?;
        Ok(ProofBuilder::new(self.hasher, &*state).root(size)?)
    }

    /// Current size and root, read under one lock acquisition.
    pub fn head(&self) -> LedgerResult<(u64, Hash)> {
        let state = self.read()?;
        let size = state.len();
        let root = ProofBuilder::new(self.hasher, &*state).root(size)?;
        Ok((size, root))
    }

    /// Leaf hashes in `[lo, hi)`.
    pub fn leaves_in_range(&self, lo: u64, hi: u64) -> LedgerResult<Vec<Hash>> {
        let state = self.read()?;
        let available = state.len();
        if lo > hi {
            return Err(ProofError::InvertedSizes {
                size1: lo,
                size2: hi,
            }
            .into());
        }
        if hi > available {
            return Err(ProofError::SizeOutOfRange {
                size: hi,
                available,
            }
            .into());
        }
        Ok(state.levels.first().map_or_else(Vec::new, |leaves| {
            leaves[lo as usize..hi as usize].to_vec()
        }))
    }

    /// Leaf hash at `index` and its audit path in the tree of `size` leaves.
    pub fn inclusion_proof(&self, index: u64, size: u64) -> LedgerResult<(Hash, InclusionProof)> {
        let state = self.read()?;
        let proof = ProofBuilder::new(self.hasher, &*state).inclusion_proof(index, size)?;
        Ok((state.leaf(index), proof))
    }

    pub fn consistency_proof(&self, size1: u64, size2: u64) -> LedgerResult<ConsistencyProof> {
        let state = self.read()?;
        Ok(ProofBuilder::new(self.hasher, &*state).consistency_proof(size1, size2)?)
    }

    /// Compare every recorded leaf with what `store` returns for it.
    ///
    /// Holds the shared lock throughout, so no append can interleave.
    /// Returns the audited size.
    pub fn audit<S: HashStore + ?Sized>(&self, store: &S) -> LedgerResult<u64> {
        let state = self.read()?;
        let size = state.len();

        let stored_size = store.size()?;
        if stored_size != size {
            return Err(LedgerError::integrity(
                size,
                format!("store holds {stored_size} hashes, accumulator holds {size}"),
            ));
        }

        const CHUNK: u64 = 4096;
        let mut lo = 0;
        while lo < size {
            let hi = (lo + CHUNK).min(size);
            let stored = store.read_range(lo, hi)?;
            if stored.len() as u64 != hi - lo {
                return Err(LedgerError::integrity(
                    lo + stored.len() as u64,
                    "store is missing a recorded hash",
                ));
            }
            for (index, hash) in (lo..hi).zip(stored) {
                let recorded = state.leaf(index);
                if hash != recorded {
                    return Err(LedgerError::integrity(
                        index,
                        format!(
                            "store holds {}, accumulator recorded {}",
                            hash.short_hex(),
                            recorded.short_hex()
                        ),
                    ));
                }
            }
            lo = hi;
        }
        Ok(size)
    }

    fn read(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, Levels>> {
        self.state.read().map_err(|_| LedgerError::poisoned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vl_crypto::shape;
    use vl_store::InMemoryHashStore;

    fn leaves(hasher: &TreeHasher, n: u64) -> Vec<Hash> {
        (0..n)
            .map(|i| hasher.leaf_hash(format!("entry-{i}").as_bytes()))
            .collect()
    }

    #[test]
    fn levels_memoize_exactly_the_complete_subtrees() {
        let hasher = TreeHasher::SHA256;
        let mut levels = Levels::default();
        for leaf in leaves(&hasher, 13) {
            levels.push(&hasher, leaf);
        }
        // 13 leaves: 6 pairs, 3 quads, 1 octet.
        let widths: Vec<usize> = levels.levels.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![13, 6, 3, 1]);

        let plain = levels.levels[0].clone();
        let builder = ProofBuilder::new(hasher, &plain);
        for (level, row) in levels.levels.iter().enumerate() {
            for (index, hash) in row.iter().enumerate() {
                let lo = (index as u64) << level;
                let hi = lo + (1u64 << level);
                assert!(shape::is_complete(lo, hi));
                assert_eq!(*hash, builder.subtree_root(lo, hi));
            }
        }
    }

    #[test]
    fn memoized_roots_match_plain_recursion() {
        let hasher = TreeHasher::BLAKE3;
        let all = leaves(&hasher, 40);
        let acc = MerkleAccumulator::from_leaves(hasher, all.clone());
        let builder = ProofBuilder::new(hasher, &all);
        for size in 0..=40 {
            assert_eq!(acc.root_at(size).unwrap(), builder.root(size).unwrap());
        }
    }

    #[test]
    fn append_returns_index_size_and_root() {
        let hasher = TreeHasher::SHA256;
        let acc = MerkleAccumulator::new(hasher);
        let store = InMemoryHashStore::new();

        let mut previous = acc.root_at(0).unwrap();
        assert_eq!(previous, hasher.empty_root());
        for i in 0..5u64 {
            let leaf = hasher.leaf_hash(&[i as u8]);
            let (index, size, root) = acc.append(leaf, &store).unwrap();
            assert_eq!(index, i);
            assert_eq!(size, i + 1);
            assert_eq!(root, acc.root_at(size).unwrap());
            assert_ne!(root, previous);
            previous = root;
        }
        assert_eq!(store.size().unwrap(), 5);
        assert_eq!(acc.head().unwrap(), (5, previous));
    }

    #[test]
    fn unexpected_store_index_is_an_integrity_error() {
        let hasher = TreeHasher::SHA256;
        let acc = MerkleAccumulator::new(hasher);
        let store = InMemoryHashStore::from_hashes(vec![Hash::zero()]);

        let err = acc.append(hasher.leaf_hash(b"x"), &store).unwrap_err();
        assert!(matches!(err, LedgerError::Integrity(_)));
        assert_eq!(acc.size().unwrap(), 0);
    }

    #[test]
    fn range_checks() {
        let hasher = TreeHasher::SHA256;
        let acc = MerkleAccumulator::from_leaves(hasher, leaves(&hasher, 3));

        assert!(acc.root_at(4).unwrap_err().is_out_of_range());
        assert!(acc.leaves_in_range(2, 1).unwrap_err().is_out_of_range());
        assert!(acc.leaves_in_range(0, 4).unwrap_err().is_out_of_range());
        assert!(acc.inclusion_proof(5, 3).unwrap_err().is_out_of_range());
        assert!(acc.consistency_proof(3, 2).unwrap_err().is_out_of_range());

        assert_eq!(acc.leaves_in_range(1, 3).unwrap().len(), 2);
        assert!(acc.leaves_in_range(3, 3).unwrap().is_empty());
    }

    #[test]
    fn audit_detects_divergence() {
        let hasher = TreeHasher::SHA256;
        let all = leaves(&hasher, 6);
        let acc = MerkleAccumulator::from_leaves(hasher, all.clone());

        assert_eq!(acc.audit(&InMemoryHashStore::from_hashes(all.clone())).unwrap(), 6);

        let mut altered = all.clone();
        altered[4] = altered[4].with_bit_flipped(0);
        let err = acc.audit(&InMemoryHashStore::from_hashes(altered)).unwrap_err();
        assert!(err.to_string().contains("index 4"));

        let short = InMemoryHashStore::from_hashes(all[..5].to_vec());
        assert!(matches!(acc.audit(&short), Err(LedgerError::Integrity(_))));
    }
}
