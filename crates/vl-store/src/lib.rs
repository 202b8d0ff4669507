//! Persistence backends for the verifiable ledger.
//!
//! The ledger depends only on the [`HashStore`] trait: an ordered,
//! append-only sequence of 32-byte leaf hashes. Entries themselves are never
//! stored here.
//!
//! Two backends are provided:
//! - [`InMemoryHashStore`] for tests and embedding.
//! - [`FileHashStore`], a fixed-stride append-only file with per-record
//!   CRC32 checksums and torn-tail recovery.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileHashStore, SyncMode};
pub use memory::InMemoryHashStore;
pub use traits::HashStore;
