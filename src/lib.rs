//! # codemint
//!
//! Deduplicating short-code minting for formulation and batch tracking.
//!
//! An entity (an ingredient set, a weight recipe, a batch binding) is
//! identified by a canonical content hash of its members; the first
//! submission mints a compact two-letter code from a scoped atomic
//! counter, and every later identical submission resolves to the same
//! code. The crates divide as:
//!
//! - `codemint-core`: error type, domain types, storage traits
//! - `codemint-codec`: code formatting, canonical hashing, validation
//! - `codemint-alloc`: retrying compare-and-swap counter allocation
//! - `codemint-memstore`: in-memory backend for tests and single-process use
//! - `codemint-minter`: the deduplicating get-or-create front
//!
//! This facade re-exports the public surface of all of them.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use codemint::{DeduplicatingMinter, MemoryStore};
//!
//! # fn main() -> codemint::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let minter = DeduplicatingMinter::new(store.clone(), store);
//!
//! let first = minter.get_or_create_set(&["SKU_A", "SKU_B"], None)?;
//! assert!(first.created);
//!
//! // Same members, any order: same code, nothing minted.
//! let again = minter.get_or_create_set(&["SKU_B", "SKU_A"], None)?;
//! assert_eq!(again.code, first.code);
//! assert!(!again.created);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use codemint_alloc::{CodeAllocator, RetryConfig};
pub use codemint_codec::{
    code_to_int, hash_batches, hash_set, hash_weights, int_to_code, validate_weight_sum,
    AlphaCode, CanonicalEntity, Sku, ALPHA_CODE_SPAN, CANONICAL_DELIMITER,
};
pub use codemint_core::{
    ContentHash, Counter, CounterKey, CounterStore, DetailRow, EntityRecord, EntityRepository,
    Error, Result, Scope, WeightPercent,
};
pub use codemint_memstore::MemoryStore;
pub use codemint_minter::{counters, DeduplicatingMinter, MintConfig, MintOutcome};
