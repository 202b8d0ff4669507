use vl_types::{DigestAlgorithm, Hash};

use crate::error::StoreResult;

/// Ordered, append-only store of leaf hashes.
///
/// This is the only persistence surface the ledger depends on.
/// All implementations must satisfy these invariants:
/// - `append` is durable once it returns and assigns consecutive indices
///   starting at zero.
/// - A failed `append` leaves `size()` unchanged.
/// - Stored hashes are never rewritten or removed.
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait HashStore: Send + Sync {
    /// Append one hash and return the index it was assigned.
    fn append(&self, hash: &Hash) -> StoreResult<u64>;

    /// Read the hash at `index`.
    ///
    /// Returns `Ok(None)` if `index >= size()`.
    fn read(&self, index: u64) -> StoreResult<Option<Hash>>;

    /// Number of hashes stored.
    fn size(&self) -> StoreResult<u64>;

    /// Digest the stored hashes were produced with, if the store records it.
    fn algorithm(&self) -> Option<DigestAlgorithm> {
        None
    }

    /// Read the hashes in `[lo, hi)`.
    ///
    /// Default implementation calls `read()` per index and stops at the
    /// first missing one. Backends may override for fewer round-trips.
    fn read_range(&self, lo: u64, hi: u64) -> StoreResult<Vec<Hash>> {
        let mut out = Vec::with_capacity(hi.saturating_sub(lo) as usize);
        for index in lo..hi {
            match self.read(index)? {
                Some(hash) => out.push(hash),
                None => break,
            }
        }
        Ok(out)
    }

    /// Flush buffered data to durable storage.
    fn sync(&self) -> StoreResult<()> {
        Ok(())
    }
}
