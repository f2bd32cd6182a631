//! In-memory reference backend for codemint
//!
//! [`MemoryStore`] implements both collaborator traits over concurrent
//! maps. The conditional counter update holds the dashmap entry for the
//! duration of the compare-and-set, which gives the same atomicity the
//! production backend provides through its transactional
//! update-with-precondition.
//!
//! Entity inserts are first-writer-wins on `(scope, hash)`: a concurrent
//! duplicate mint collapses to the row that landed first, which is the
//! uniqueness hardening the durable backends are encouraged (but not
//! required) to provide.
//!
//! Suitable for tests and single-process deployments; nothing here is
//! durable.

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::Utc;
use codemint_core::{
    ContentHash, Counter, CounterKey, CounterStore, EntityRecord, EntityRepository, Result, Scope,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Concurrent in-memory counter store and entity repository.
#[derive(Debug, Default)]
pub struct MemoryStore {
    counters: DashMap<CounterKey, Counter>,
    entities: DashMap<(Scope, ContentHash), EntityRecord>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current `next_value` of a counter, for assertions in tests.
    pub fn counter_value(&self, name: &str, scope: &Scope) -> Option<i64> {
        self.counters
            .get(&CounterKey::new(name, scope.clone()))
            .map(|c| c.next_value)
    }

    /// Look up a minted entity by its code within a scope.
    pub fn entity_by_code(&self, scope: &Scope, code: &str) -> Option<EntityRecord> {
        self.entities
            .iter()
            .find(|entry| &entry.value().scope == scope && entry.value().code == code)
            .map(|entry| entry.value().clone())
    }

    /// Number of minted entities across all scopes.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl CounterStore for MemoryStore {
    fn get_counter(&self, name: &str, scope: &Scope) -> Result<Option<i64>> {
        Ok(self
            .counters
            .get(&CounterKey::new(name, scope.clone()))
            .map(|c| c.next_value))
    }

    fn insert_counter_if_absent(&self, name: &str, scope: &Scope, start_value: i64) -> Result<()> {
        self.counters
            .entry(CounterKey::new(name, scope.clone()))
            .or_insert_with(|| Counter::starting_at(start_value));
        Ok(())
    }

    fn conditional_update_counter(
        &self,
        name: &str,
        scope: &Scope,
        expected: i64,
        new_value: i64,
    ) -> Result<bool> {
        // The occupied entry holds its shard lock, making the
        // compare-and-set atomic with respect to every other caller.
        match self.counters.entry(CounterKey::new(name, scope.clone())) {
            Entry::Occupied(mut entry) if entry.get().next_value == expected => {
                let counter = entry.get_mut();
                counter.next_value = new_value;
                counter.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl EntityRepository for MemoryStore {
    fn get_code_by_hash(&self, scope: &Scope, hash: &ContentHash) -> Result<Option<String>> {
        Ok(self
            .entities
            .get(&(scope.clone(), hash.clone()))
            .map(|record| record.code.clone()))
    }

    fn insert_entity(&self, record: EntityRecord) -> Result<()> {
        self.entities
            .entry((record.scope.clone(), record.hash.clone()))
            .or_insert(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemint_core::DetailRow;

    fn record(scope: Scope, hash: ContentHash, code: &str) -> EntityRecord {
        EntityRecord {
            scope,
            hash,
            code: code.to_string(),
            details: vec![DetailRow {
                key: "SKU1".to_string(),
                value: None,
            }],
            created_by: Some("tester@example.com".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_counter_lifecycle() {
        let store = MemoryStore::new();
        let scope = Scope::global();

        assert_eq!(store.get_counter("c", &scope).unwrap(), None);
        store.insert_counter_if_absent("c", &scope, 5).unwrap();
        assert_eq!(store.get_counter("c", &scope).unwrap(), Some(5));

        assert!(store.conditional_update_counter("c", &scope, 5, 6).unwrap());
        assert_eq!(store.get_counter("c", &scope).unwrap(), Some(6));
    }

    #[test]
    fn test_conditional_update_rejects_stale_expectation() {
        let store = MemoryStore::new();
        let scope = Scope::global();
        store.insert_counter_if_absent("c", &scope, 0).unwrap();

        assert!(!store.conditional_update_counter("c", &scope, 9, 10).unwrap());
        assert_eq!(store.get_counter("c", &scope).unwrap(), Some(0));
    }

    #[test]
    fn test_conditional_update_on_missing_counter_is_false() {
        let store = MemoryStore::new();
        assert!(!store
            .conditional_update_counter("missing", &Scope::global(), 0, 1)
            .unwrap());
    }

    #[test]
    fn test_insert_if_absent_keeps_first_start_value() {
        let store = MemoryStore::new();
        let scope = Scope::global();
        store.insert_counter_if_absent("c", &scope, 1).unwrap();
        store.insert_counter_if_absent("c", &scope, 31).unwrap();
        assert_eq!(store.get_counter("c", &scope).unwrap(), Some(1));
    }

    #[test]
    fn test_entity_insert_and_hash_lookup() {
        let store = MemoryStore::new();
        let hash = ContentHash::from_digest([7u8; 32]);
        store
            .insert_entity(record(Scope::global(), hash.clone(), "AA"))
            .unwrap();

        assert_eq!(
            store.get_code_by_hash(&Scope::global(), &hash).unwrap(),
            Some("AA".to_string())
        );
        assert!(store
            .get_code_by_hash(&Scope::new("AB"), &hash)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_entity_insert_is_first_writer_wins() {
        let store = MemoryStore::new();
        let hash = ContentHash::from_digest([7u8; 32]);
        store
            .insert_entity(record(Scope::global(), hash.clone(), "AA"))
            .unwrap();
        store
            .insert_entity(record(Scope::global(), hash.clone(), "AB"))
            .unwrap();

        assert_eq!(
            store.get_code_by_hash(&Scope::global(), &hash).unwrap(),
            Some("AA".to_string())
        );
        assert_eq!(store.entity_count(), 1);
    }

    #[test]
    fn test_entity_by_code_helper() {
        let store = MemoryStore::new();
        let hash = ContentHash::from_digest([9u8; 32]);
        store
            .insert_entity(record(Scope::new("AB"), hash, "AC"))
            .unwrap();

        let found = store.entity_by_code(&Scope::new("AB"), "AC").unwrap();
        assert_eq!(found.details.len(), 1);
        assert!(store.entity_by_code(&Scope::global(), "AC").is_none());
    }
}
