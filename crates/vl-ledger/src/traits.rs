use vl_crypto::{ConsistencyProof, InclusionProof};
use vl_types::{Hash, TreeHead};

use crate::error::LedgerResult;
use crate::ledger::AppendReceipt;

/// Write boundary for ledger append operations.
pub trait LedgerWriter: Send + Sync {
    fn append(&self, entry: &[u8]) -> LedgerResult<AppendReceipt>;
}

/// Read boundary for ledger queries and proof requests.
pub trait LedgerReader: Send + Sync {
    fn size(&self) -> LedgerResult<u64>;

    fn root(&self, size: u64) -> LedgerResult<Hash>;

    fn tree_head(&self) -> LedgerResult<TreeHead>;

    fn inclusion_proof(&self, index: u64, size: u64) -> LedgerResult<(Hash, InclusionProof)>;

    fn consistency_proof(&self, size1: u64, size2: u64) -> LedgerResult<ConsistencyProof>;

    fn leaves(&self, lo: u64, hi: u64) -> LedgerResult<Vec<Hash>>;
}
