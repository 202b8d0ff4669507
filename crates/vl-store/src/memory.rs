use std::sync::RwLock;

use vl_types::{DigestAlgorithm, Hash};

use crate::error::{StoreError, StoreResult};
use crate::traits::HashStore;

/// `Vec`-backed hash store for tests, demos, and embedding.
#[derive(Debug, Default)]
pub struct InMemoryHashStore {
    algorithm: Option<DigestAlgorithm>,
    hashes: RwLock<Vec<Hash>>,
}

impl InMemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports which digest its hashes were produced with.
    pub fn with_algorithm(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm: Some(algorithm),
            hashes: RwLock::new(Vec::new()),
        }
    }

    /// Seed a store with existing hashes.
    pub fn from_hashes(hashes: Vec<Hash>) -> Self {
        Self {
            algorithm: None,
            hashes: RwLock::new(hashes),
        }
    }
}

impl HashStore for InMemoryHashStore {
    fn append(&self, hash: &Hash) -> StoreResult<u64> {
        let mut hashes = self.hashes.write().map_err(|_| StoreError::Poisoned)?;
        hashes.push(*hash);
        Ok(hashes.len() as u64 - 1)
    }

    fn read(&self, index: u64) -> StoreResult<Option<Hash>> {
        let hashes = self.hashes.read().map_err(|_| StoreError::Poisoned)?;
        Ok(hashes.get(index as usize).copied())
    }

    fn size(&self) -> StoreResult<u64> {
        let hashes = self.hashes.read().map_err(|_| StoreError::Poisoned)?;
        Ok(hashes.len() as u64)
    }

    fn algorithm(&self) -> Option<DigestAlgorithm> {
        self.algorithm
    }

    fn read_range(&self, lo: u64, hi: u64) -> StoreResult<Vec<Hash>> {
        let hashes = self.hashes.read().map_err(|_| StoreError::Poisoned)?;
        let end = (hi as usize).min(hashes.len());
        let start = (lo as usize).min(end);
        Ok(hashes[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(seed: u8) -> Hash {
        Hash::from_bytes([seed; 32])
    }

    #[test]
    fn append_assigns_consecutive_indices() {
        let store = InMemoryHashStore::new();
        assert_eq!(store.append(&h(1)).unwrap(), 0);
        assert_eq!(store.append(&h(2)).unwrap(), 1);
        assert_eq!(store.append(&h(3)).unwrap(), 2);
        assert_eq!(store.size().unwrap(), 3);
    }

    #[test]
    fn read_returns_none_past_end() {
        let store = InMemoryHashStore::from_hashes(vec![h(1)]);
        assert_eq!(store.read(0).unwrap(), Some(h(1)));
        assert_eq!(store.read(1).unwrap(), None);
    }

    #[test]
    fn read_range_clamps_to_size() {
        let store = InMemoryHashStore::from_hashes(vec![h(1), h(2), h(3)]);
        assert_eq!(store.read_range(1, 3).unwrap(), vec![h(2), h(3)]);
        assert_eq!(store.read_range(2, 10).unwrap(), vec![h(3)]);
        assert!(store.read_range(5, 10).unwrap().is_empty());
    }

    #[test]
    fn algorithm_is_reported_when_set() {
        assert_eq!(InMemoryHashStore::new().algorithm(), None);
        assert_eq!(
            InMemoryHashStore::with_algorithm(DigestAlgorithm::Blake3).algorithm(),
            Some(DigestAlgorithm::Blake3)
        );
    }
}
