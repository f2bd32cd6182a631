//! Core types and traits for codemint
//!
//! This crate defines the foundational pieces used throughout the system:
//! - Scope: namespace qualifier partitioning counters and lookups
//! - ContentHash: canonical digest used as a content-derived natural key
//! - WeightPercent: exact two-decimal percentage value
//! - Counter / CounterKey: durable keyed-counter records
//! - EntityRecord / DetailRow: persisted shape of a minted entity
//! - Error: error type hierarchy
//! - Traits: collaborator definitions (CounterStore, EntityRepository)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use traits::{CounterStore, EntityRepository};
pub use types::{ContentHash, Counter, CounterKey, DetailRow, EntityRecord, Scope, WeightPercent};
