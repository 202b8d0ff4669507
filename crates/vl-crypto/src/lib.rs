//! Tree hashing and proof engine for the verifiable ledger.
//!
//! Provides domain-separated leaf/node hashing, the tree-shape arithmetic
//! that fixes the canonical tree for any size, proof construction over a
//! read-only leaf source, and a stateless verifier.
//!
//! All digests wrap established libraries (SHA-256 via `sha2`, BLAKE3 via
//! `blake3`). The tree layout is the RFC 6962 one, so SHA-256 trees are
//! interoperable with Certificate Transparency tooling.

pub mod builder;
pub mod error;
pub mod hasher;
pub mod proof;
pub mod shape;
pub mod verifier;

pub use builder::{NodeSource, ProofBuilder};
pub use error::{ProofError, ProofResult};
pub use hasher::{TreeHasher, LEAF_PREFIX, NODE_PREFIX};
pub use proof::{ConsistencyProof, InclusionProof};
pub use verifier::ProofVerifier;
