//! Verifiable append-only ledger.
//!
//! This crate ties the proof engine to storage. It provides:
//! - `MerkleAccumulator`: the append-only leaf sequence with memoized
//!   complete subtrees, giving roots for any historical size
//! - `Ledger`: append, roots, tree heads, inclusion and consistency proofs,
//!   verification, recovery, and audit over any `HashStore`
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `LedgerConfig`, the TOML configuration used by the CLI

pub mod accumulator;
pub mod config;
pub mod error;
pub mod ledger;
pub mod traits;

pub use accumulator::MerkleAccumulator;
pub use config::{LedgerConfig, StoreConfig, CONFIG_FILE};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{AppendReceipt, Ledger};
pub use traits::{LedgerReader, LedgerWriter};
