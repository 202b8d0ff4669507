use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vl_crypto::{ConsistencyProof, InclusionProof, ProofVerifier, TreeHasher};
use vl_store::{FileHashStore, HashStore, InMemoryHashStore, StoreError};
use vl_types::{DigestAlgorithm, Hash, TreeHead};

use crate::accumulator::MerkleAccumulator;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::{LedgerReader, LedgerWriter};

/// Result of a successful append.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReceipt {
    /// Index assigned to the entry.
    pub index: u64,
    /// Tree size after the append.
    pub size: u64,
    /// Root of the tree at `size`.
    pub root: Hash,
}

/// Verifiable append-only ledger over a [`HashStore`].
///
/// Entries are hashed into leaves, persisted to the store, and recorded in
/// a [`MerkleAccumulator`]. Appends are serialized by the accumulator's
/// lock; roots, proofs, and leaf reads run concurrently. Verification
/// methods never touch ledger state.
pub struct Ledger<S: HashStore = InMemoryHashStore> {
    store: S,
    accumulator: MerkleAccumulator,
    verifier: ProofVerifier,
}

impl Ledger<InMemoryHashStore> {
    /// Empty ledger backed by memory only.
    pub fn in_memory(algorithm: DigestAlgorithm) -> Self {
        let hasher = TreeHasher::new(algorithm);
        Self {
            store: InMemoryHashStore::with_algorithm(algorithm),
            accumulator: MerkleAccumulator::new(hasher),
            verifier: ProofVerifier::new(hasher),
        }
    }
}

impl Ledger<FileHashStore> {
    /// Open the file-backed ledger described by `config`.
    ///
    /// Relative store paths resolve against `base`.
    pub fn open_file(config: &LedgerConfig, base: &Path) -> LedgerResult<Self> {
        let path = config.store_path(base);
        let store = FileHashStore::open(&path, config.algorithm, config.store.sync_mode)
            .map_err(|err| match err {
                StoreError::AlgorithmMismatch { expected, found } => LedgerError::Integrity(
                    format!("store holds {found} hashes, configured digest is {expected}"),
                ),
                other => other.into(),
            })?;
        Self::open(store, config.algorithm)
    }
}

impl<S: HashStore> Ledger<S> {
    /// Open a ledger over `store`, replaying every stored leaf hash.
    ///
    /// Fails with an integrity error if the store records a different
    /// digest than `algorithm`.
    pub fn open(store: S, algorithm: DigestAlgorithm) -> LedgerResult<Self> {
        if let Some(found) = store.algorithm() {
            if found != algorithm {
                return Err(LedgerError::Integrity(format!(
                    "store holds {found} hashes, configured digest is {algorithm}"
                )));
            }
        }

        let size = store.size()?;
        let leaves = store.read_range(0, size)?;
        if leaves.len() as u64 != size {
            return Err(LedgerError::integrity(
                leaves.len() as u64,
                format!("store reports {size} hashes but returned {}", leaves.len()),
            ));
        }

        let hasher = TreeHasher::new(algorithm);
        let accumulator = MerkleAccumulator::from_leaves(hasher, leaves);
        info!(size, %algorithm, "ledger opened");
        Ok(Self {
            store,
            accumulator,
            verifier: ProofVerifier::new(hasher),
        })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.accumulator.hasher().algorithm()
    }

    pub fn hasher(&self) -> &TreeHasher {
        self.accumulator.hasher()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hash, persist, and record one entry.
    pub fn append(&self, entry: &[u8]) -> LedgerResult<AppendReceipt> {
        let leaf = self.hasher().leaf_hash(entry);
        let (index, size, root) = self.accumulator.append(leaf, &self.store)?;
        debug!(index, bytes = entry.len(), "entry appended");
        Ok(AppendReceipt { index, size, root })
    }

    /// Number of entries committed.
    pub fn size(&self) -> LedgerResult<u64> {
        self.accumulator.size()
    }

    /// Root of the tree at any size up to the current one.
    pub fn root(&self, size: u64) -> LedgerResult<Hash> {
        self.accumulator.root_at(size)
    }

    pub fn current_root(&self) -> LedgerResult<Hash> {
        Ok(self.accumulator.head()?.1)
    }

    /// Current size and root, tagged with the digest.
    pub fn tree_head(&self) -> LedgerResult<TreeHead> {
        let (size, root) = self.accumulator.head()?;
        Ok(TreeHead::new(self.algorithm(), size, root))
    }

    pub fn tree_head_at(&self, size: u64) -> LedgerResult<TreeHead> {
        let root = self.accumulator.root_at(size)?;
        Ok(TreeHead::new(self.algorithm(), size, root))
    }

    /// Leaf hashes in `[lo, hi)`.
    pub fn leaves(&self, lo: u64, hi: u64) -> LedgerResult<Vec<Hash>> {
        self.accumulator.leaves_in_range(lo, hi)
    }

    /// Leaf hash at `index` together with its inclusion proof at `size`.
    pub fn inclusion_proof(&self, index: u64, size: u64) -> LedgerResult<(Hash, InclusionProof)> {
        self.accumulator.inclusion_proof(index, size)
    }

    pub fn consistency_proof(&self, size1: u64, size2: u64) -> LedgerResult<ConsistencyProof> {
        self.accumulator.consistency_proof(size1, size2)
    }

    /// Check an inclusion proof against a trusted root.
    pub fn verify_inclusion(
        &self,
        entry: &[u8],
        index: u64,
        size: u64,
        proof: &[Hash],
        trusted_root: &Hash,
    ) -> LedgerResult<bool> {
        Ok(self
            .verifier
            .verify_inclusion(entry, index, size, proof, trusted_root)?)
    }

    /// Check a consistency proof between two trusted roots.
    pub fn verify_consistency(
        &self,
        size1: u64,
        size2: u64,
        root1: &Hash,
        root2: &Hash,
        proof: &[Hash],
    ) -> LedgerResult<bool> {
        Ok(self
            .verifier
            .verify_consistency(size1, size2, root1, root2, proof)?)
    }

    /// Re-read every stored hash and compare it with the recorded leaf.
    ///
    /// Returns the audited tree head. The first disagreement is an
    /// integrity error.
    pub fn audit(&self) -> LedgerResult<TreeHead> {
        match self.accumulator.audit(&self.store) {
            Ok(size) => {
                let head = self.tree_head_at(size)?;
                info!(size, root = %head.root.short_hex(), "audit passed");
                Ok(head)
            }
            Err(err) => {
                warn!(error = %err, "audit failed");
                Err(err)
            }
        }
    }

    /// Flush the store to durable storage.
    pub fn sync(&self) -> LedgerResult<()> {
        Ok(self.store.sync()?)
    }
}

impl<S: HashStore> LedgerWriter for Ledger<S> {
    fn append(&self, entry: &[u8]) -> LedgerResult<AppendReceipt> {
        Ledger::append(self, entry)
    }
}

impl<S: HashStore> LedgerReader for Ledger<S> {
    fn size(&self) -> LedgerResult<u64> {
        Ledger::size(self)
    }

    fn root(&self, size: u64) -> LedgerResult<Hash> {
        Ledger::root(self, size)
    }

    fn tree_head(&self) -> LedgerResult<TreeHead> {
        Ledger::tree_head(self)
    }

    fn inclusion_proof(&self, index: u64, size: u64) -> LedgerResult<(Hash, InclusionProof)> {
        Ledger::inclusion_proof(self, index, size)
    }

    fn consistency_proof(&self, size1: u64, size2: u64) -> LedgerResult<ConsistencyProof> {
        Ledger::consistency_proof(self, size1, size2)
    }

    fn leaves(&self, lo: u64, hi: u64) -> LedgerResult<Vec<Hash>> {
        Ledger::leaves(self, lo, hi)
    }
}
