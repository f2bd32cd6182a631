//! Collaborator traits for counter and entity persistence
//!
//! These traits are the seam between the minting logic and the backing
//! store. Implementations must provide an atomic conditional write for
//! counters; everything above (allocator, minter) builds its correctness
//! on that single primitive, with no in-process synchronization.
//!
//! Thread safety: all methods must be safe to call concurrently from
//! multiple threads (requires Send + Sync).

use crate::error::Result;
use crate::types::{ContentHash, EntityRecord, Scope};

/// Durable keyed-counter persistence.
///
/// A counter is keyed by `(name, scope)`, created lazily with a
/// caller-supplied start value, and only ever advanced through
/// [`CounterStore::conditional_update_counter`].
pub trait CounterStore: Send + Sync {
    /// Current `next_value` for the counter, or `None` if it has never
    /// been used.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_counter(&self, name: &str, scope: &Scope) -> Result<Option<i64>>;

    /// Create the counter with `next_value = start_value` unless it
    /// already exists.
    ///
    /// Losing a creation race is not an error: callers re-read and proceed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn insert_counter_if_absent(&self, name: &str, scope: &Scope, start_value: i64) -> Result<()>;

    /// Atomically set `next_value = new_value` iff it still equals
    /// `expected`. Returns `true` iff exactly one record changed.
    ///
    /// This is the compare-and-swap primitive the whole allocation
    /// contract rests on; a `false` return signals a lost race, not a
    /// fault.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn conditional_update_counter(
        &self,
        name: &str,
        scope: &Scope,
        expected: i64,
        new_value: i64,
    ) -> Result<bool>;
}

/// Persistence for minted entities, looked up by canonical content hash.
pub trait EntityRepository: Send + Sync {
    /// Existing code minted for `(scope, hash)`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_code_by_hash(&self, scope: &Scope, hash: &ContentHash) -> Result<Option<String>>;

    /// Persist a newly minted entity (canonical row plus detail rows).
    ///
    /// Backends with a uniqueness constraint on `(scope, hash)` may treat
    /// an insert conflict as "someone already created the canonical row";
    /// the minter tolerates either behavior.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn insert_entity(&self, record: EntityRecord) -> Result<()>;
}
