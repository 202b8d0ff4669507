//! Foundation types for the verifiable ledger.
//!
//! Every other `vl-*` crate depends on `vl-types`.
//!
//! # Key Types
//!
//! - [`Hash`]: fixed-width tree hash (leaf, node or root)
//! - [`DigestAlgorithm`]: the digest a tree is built with
//! - [`TreeHead`]: a root bound to its size and digest

pub mod digest;
pub mod error;
pub mod hash;
pub mod tree_head;

pub use digest::DigestAlgorithm;
pub use error::TypeError;
pub use hash::{Hash, HASH_LEN};
pub use tree_head::TreeHead;
