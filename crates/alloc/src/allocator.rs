//! Unique integer allocation over a keyed-counter store
//!
//! ## Design
//!
//! Correctness rests entirely on the store's atomic conditional write:
//! read the counter, attempt `next_value: current -> current + 1` only if
//! it still equals `current`, and retry the whole cycle on a lost race.
//! No in-process lock, and no counter state is cached between calls, so
//! any number of independent processes can allocate against the same key.
//!
//! A lost CAS race and a transient storage fault both consume one attempt
//! of the bounded budget; exhausting it is a fatal
//! [`Error::AllocationFailed`]. The allocator never returns a value
//! without having durably advanced the counter, and never advances the
//! counter without returning the corresponding value.

use crate::retry::RetryConfig;
use codemint_core::{CounterStore, Error, Result, Scope};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Hands out unique, monotonically increasing integers from named,
/// scoped counters.
#[derive(Clone)]
pub struct CodeAllocator {
    store: Arc<dyn CounterStore>,
    retry: RetryConfig,
}

/// Outcome of one read/CAS cycle.
enum Attempt {
    /// CAS applied; the allocated value.
    Won(i64),
    /// CAS matched zero records; retry from the top.
    LostRace,
}

impl CodeAllocator {
    /// Allocator with the default retry budget.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self::with_retry(store, RetryConfig::default())
    }

    /// Allocator with an explicit retry configuration.
    pub fn with_retry(store: Arc<dyn CounterStore>, retry: RetryConfig) -> Self {
        CodeAllocator { store, retry }
    }

    /// Allocate the next value from `(counter_name, scope)`, creating the
    /// counter at `start_value` on first use.
    ///
    /// Concurrent callers on the same key always receive distinct values;
    /// serialized callers receive strictly increasing ones.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] once the retry budget is exhausted.
    pub fn allocate(&self, counter_name: &str, scope: &Scope, start_value: i64) -> Result<i64> {
        for attempt in 0..self.retry.max_attempts {
            self.pause_before(attempt);
            match self.try_claim(counter_name, scope, start_value, 1) {
                Ok(Attempt::Won(value)) => {
                    debug!(counter = counter_name, scope = %scope, value, "allocated counter value");
                    return Ok(value);
                }
                Ok(Attempt::LostRace) => {
                    debug!(counter = counter_name, scope = %scope, attempt, "lost counter race, retrying");
                }
                Err(err) => {
                    warn!(counter = counter_name, scope = %scope, attempt, error = %err, "counter update failed, retrying");
                }
            }
        }
        Err(self.exhausted(counter_name, scope))
    }

    /// Reserve `count` consecutive values in one logical step, returning
    /// the first. The caller owns `V, V+1, ..., V+count-1` exclusively.
    ///
    /// A lost race at any step discards the whole attempt and restarts
    /// from the top, so the returned range is always contiguous.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] for `count == 0` or a count beyond the
    /// `i64` counter domain, [`Error::AllocationFailed`] once the retry
    /// budget is exhausted.
    pub fn allocate_range(
        &self,
        counter_name: &str,
        scope: &Scope,
        start_value: i64,
        count: u64,
    ) -> Result<i64> {
        if count == 0 {
            return Err(Error::InvalidOperation(
                "range count must be at least 1".to_string(),
            ));
        }
        let count = i64::try_from(count).map_err(|_| {
            Error::InvalidOperation(format!("range count {count} exceeds the counter domain"))
        })?;
        for attempt in 0..self.retry.max_attempts {
            self.pause_before(attempt);
            match self.try_claim(counter_name, scope, start_value, count) {
                Ok(Attempt::Won(first)) => {
                    debug!(counter = counter_name, scope = %scope, first, count, "reserved counter range");
                    return Ok(first);
                }
                Ok(Attempt::LostRace) => {
                    debug!(counter = counter_name, scope = %scope, attempt, count, "lost range race, retrying");
                }
                Err(err) => {
                    warn!(counter = counter_name, scope = %scope, attempt, error = %err, "range update failed, retrying");
                }
            }
        }
        Err(self.exhausted(counter_name, scope))
    }

    /// Raise the counter so its next issued value is at least `floor`,
    /// creating it at `floor` on first use. Never lowers the counter.
    ///
    /// Used after importing records that carry explicit sequence values,
    /// so the counter cannot re-issue them.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] once the retry budget is exhausted.
    pub fn ensure_at_least(&self, counter_name: &str, scope: &Scope, floor: i64) -> Result<()> {
        for attempt in 0..self.retry.max_attempts {
            self.pause_before(attempt);
            match self.try_raise(counter_name, scope, floor) {
                Ok(Attempt::Won(value)) => {
                    debug!(counter = counter_name, scope = %scope, floor, value, "counter floor ensured");
                    return Ok(());
                }
                Ok(Attempt::LostRace) => {
                    debug!(counter = counter_name, scope = %scope, attempt, floor, "lost floor race, retrying");
                }
                Err(err) => {
                    warn!(counter = counter_name, scope = %scope, attempt, error = %err, "floor update failed, retrying");
                }
            }
        }
        Err(self.exhausted(counter_name, scope))
    }

    /// One full read/CAS cycle claiming `count` values.
    fn try_claim(
        &self,
        counter_name: &str,
        scope: &Scope,
        start_value: i64,
        count: i64,
    ) -> Result<Attempt> {
        let current = self.read_or_create(counter_name, scope, start_value)?;

        let end = current.checked_add(count).ok_or(Error::OutOfRange {
            value: current,
            max: i64::MAX,
        })?;

        // Claim the first value.
        if !self
            .store
            .conditional_update_counter(counter_name, scope, current, current + 1)?
        {
            return Ok(Attempt::LostRace);
        }

        // Extend the claim to the rest of the range. On a lost race the
        // whole attempt is discarded; the already-claimed first value
        // becomes a gap, never a duplicate.
        if count > 1
            && !self
                .store
                .conditional_update_counter(counter_name, scope, current + 1, end)?
        {
            return Ok(Attempt::LostRace);
        }

        Ok(Attempt::Won(current))
    }

    /// One read/CAS cycle raising the counter to `floor`.
    fn try_raise(&self, counter_name: &str, scope: &Scope, floor: i64) -> Result<Attempt> {
        let current = self.read_or_create(counter_name, scope, floor)?;
        if current >= floor {
            return Ok(Attempt::Won(current));
        }
        if self
            .store
            .conditional_update_counter(counter_name, scope, current, floor)?
        {
            Ok(Attempt::Won(floor))
        } else {
            Ok(Attempt::LostRace)
        }
    }

    fn read_or_create(&self, counter_name: &str, scope: &Scope, start_value: i64) -> Result<i64> {
        match self.store.get_counter(counter_name, scope)? {
            Some(value) => Ok(value),
            None => {
                // First use: create lazily. Losing the creation race is
                // fine; the re-read observes whichever writer won.
                self.store
                    .insert_counter_if_absent(counter_name, scope, start_value)?;
                self.store
                    .get_counter(counter_name, scope)?
                    .ok_or_else(|| {
                        Error::storage(format!(
                            "counter '{counter_name}' missing immediately after creation"
                        ))
                    })
            }
        }
    }

    fn pause_before(&self, attempt: u32) {
        let delay = self.retry.delay_before(attempt);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    fn exhausted(&self, counter_name: &str, scope: &Scope) -> Error {
        Error::AllocationFailed {
            counter: counter_name.to_string(),
            scope: scope.to_string(),
            attempts: self.retry.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemint_core::CounterStore;
    use codemint_memstore::MemoryStore;
    use parking_lot::Mutex;

    fn allocator(store: Arc<MemoryStore>) -> CodeAllocator {
        // No backoff in unit tests
        CodeAllocator::with_retry(
            store,
            RetryConfig::default().with_base_delay_ms(0),
        )
    }

    #[test]
    fn test_serial_allocation_is_monotonic_from_start() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);
        let scope = Scope::global();

        for expected in 5..10 {
            assert_eq!(alloc.allocate("set_code", &scope, 5).unwrap(), expected);
        }
    }

    #[test]
    fn test_start_value_only_applies_on_first_use() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);
        let scope = Scope::global();

        assert_eq!(alloc.allocate("c", &scope, 3).unwrap(), 3);
        // A different start value later is ignored; the counter exists.
        assert_eq!(alloc.allocate("c", &scope, 100).unwrap(), 4);
    }

    #[test]
    fn test_scopes_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);

        assert_eq!(alloc.allocate("weight_code", &Scope::new("AB"), 0).unwrap(), 0);
        assert_eq!(alloc.allocate("weight_code", &Scope::new("AC"), 0).unwrap(), 0);
        assert_eq!(alloc.allocate("weight_code", &Scope::new("AB"), 0).unwrap(), 1);
    }

    #[test]
    fn test_range_is_contiguous_and_advances_counter() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);
        let scope = Scope::global();

        assert_eq!(alloc.allocate_range("bag_id", &scope, 0, 4).unwrap(), 0);
        // The next single allocation starts right after the range.
        assert_eq!(alloc.allocate("bag_id", &scope, 0).unwrap(), 4);
    }

    #[test]
    fn test_range_of_one_behaves_like_single() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);
        let scope = Scope::global();

        assert_eq!(alloc.allocate_range("c", &scope, 7, 1).unwrap(), 7);
        assert_eq!(alloc.allocate("c", &scope, 7).unwrap(), 8);
    }

    #[test]
    fn test_range_of_zero_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);
        assert!(matches!(
            alloc.allocate_range("c", &Scope::global(), 0, 0),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_range_count_beyond_counter_domain_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);
        let scope = Scope::global();

        assert!(matches!(
            alloc.allocate_range("bag_id", &scope, 0, u64::MAX),
            Err(Error::InvalidOperation(_))
        ));
        // Nothing was reserved; the next caller starts from scratch.
        assert_eq!(alloc.allocate("bag_id", &scope, 0).unwrap(), 0);
    }

    #[test]
    fn test_ensure_at_least_creates_and_raises() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);
        let scope = Scope::new("global");

        // Creates the counter at the floor on first use.
        alloc.ensure_at_least("ingredient_seq", &scope, 8).unwrap();
        assert_eq!(alloc.allocate("ingredient_seq", &scope, 1).unwrap(), 8);

        // Raises past the current value.
        alloc.ensure_at_least("ingredient_seq", &scope, 20).unwrap();
        assert_eq!(alloc.allocate("ingredient_seq", &scope, 1).unwrap(), 20);
    }

    #[test]
    fn test_ensure_at_least_never_lowers() {
        let store = Arc::new(MemoryStore::new());
        let alloc = allocator(store);
        let scope = Scope::global();

        for _ in 0..5 {
            alloc.allocate("c", &scope, 0).unwrap();
        }
        alloc.ensure_at_least("c", &scope, 2).unwrap();
        assert_eq!(alloc.allocate("c", &scope, 0).unwrap(), 5);
    }

    // ====================================================================
    // Contention and fault handling via instrumented stores
    // ====================================================================

    /// Store that interleaves a competing writer before the first
    /// `fail_count` conditional updates, forcing lost races.
    struct ContendedStore {
        inner: MemoryStore,
        remaining_interference: Mutex<u32>,
    }

    impl ContendedStore {
        fn new(fail_count: u32) -> Self {
            ContendedStore {
                inner: MemoryStore::new(),
                remaining_interference: Mutex::new(fail_count),
            }
        }
    }

    impl CounterStore for ContendedStore {
        fn get_counter(&self, name: &str, scope: &Scope) -> Result<Option<i64>> {
            self.inner.get_counter(name, scope)
        }

        fn insert_counter_if_absent(&self, name: &str, scope: &Scope, start: i64) -> Result<()> {
            self.inner.insert_counter_if_absent(name, scope, start)
        }

        fn conditional_update_counter(
            &self,
            name: &str,
            scope: &Scope,
            expected: i64,
            new_value: i64,
        ) -> Result<bool> {
            let mut remaining = self.remaining_interference.lock();
            if *remaining > 0 {
                *remaining -= 1;
                // A competing caller advanced the counter first.
                self.inner
                    .conditional_update_counter(name, scope, expected, expected + 1)?;
            }
            self.inner
                .conditional_update_counter(name, scope, expected, new_value)
        }
    }

    /// Store whose conditional update always fails with a storage error.
    struct BrokenStore {
        inner: MemoryStore,
    }

    impl CounterStore for BrokenStore {
        fn get_counter(&self, name: &str, scope: &Scope) -> Result<Option<i64>> {
            self.inner.get_counter(name, scope)
        }

        fn insert_counter_if_absent(&self, name: &str, scope: &Scope, start: i64) -> Result<()> {
            self.inner.insert_counter_if_absent(name, scope, start)
        }

        fn conditional_update_counter(&self, _: &str, _: &Scope, _: i64, _: i64) -> Result<bool> {
            Err(Error::storage("connection reset"))
        }
    }

    #[test]
    fn test_lost_races_are_retried_within_budget() {
        let store = Arc::new(ContendedStore::new(3));
        let alloc = CodeAllocator::with_retry(
            store.clone(),
            RetryConfig::default().with_base_delay_ms(0),
        );
        let scope = Scope::global();

        // Three interferences each steal one value; the fourth cycle wins.
        let value = alloc.allocate("c", &scope, 0).unwrap();
        assert_eq!(value, 3);
        assert_eq!(store.get_counter("c", &scope).unwrap(), Some(4));
    }

    #[test]
    fn test_budget_exhaustion_is_fatal() {
        let store = Arc::new(ContendedStore::new(u32::MAX));
        let alloc = CodeAllocator::with_retry(
            store,
            RetryConfig::default()
                .with_max_attempts(4)
                .with_base_delay_ms(0),
        );

        let err = alloc.allocate("c", &Scope::global(), 0).unwrap_err();
        match err {
            Error::AllocationFailed { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("expected AllocationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_storage_faults_consume_the_same_budget() {
        // A transient fault and a lost race are deliberately not
        // distinguished; both retry under one bounded budget.
        let store = Arc::new(BrokenStore {
            inner: MemoryStore::new(),
        });
        let alloc = CodeAllocator::with_retry(
            store,
            RetryConfig::default()
                .with_max_attempts(3)
                .with_base_delay_ms(0),
        );

        let err = alloc.allocate("c", &Scope::global(), 0).unwrap_err();
        assert!(err.is_allocation_failure());
    }

    /// Store that lets the first claim through but steals a value before
    /// the first range-extension update, tearing the range mid-flight.
    struct ExtensionContendedStore {
        inner: MemoryStore,
        fired: Mutex<bool>,
    }

    impl CounterStore for ExtensionContendedStore {
        fn get_counter(&self, name: &str, scope: &Scope) -> Result<Option<i64>> {
            self.inner.get_counter(name, scope)
        }

        fn insert_counter_if_absent(&self, name: &str, scope: &Scope, start: i64) -> Result<()> {
            self.inner.insert_counter_if_absent(name, scope, start)
        }

        fn conditional_update_counter(
            &self,
            name: &str,
            scope: &Scope,
            expected: i64,
            new_value: i64,
        ) -> Result<bool> {
            let mut fired = self.fired.lock();
            if new_value - expected > 1 && !*fired {
                *fired = true;
                self.inner
                    .conditional_update_counter(name, scope, expected, expected + 1)?;
            }
            self.inner
                .conditional_update_counter(name, scope, expected, new_value)
        }
    }

    #[test]
    fn test_range_discards_partial_claim_on_lost_race() {
        // The first attempt claims its first value, then loses the
        // extension CAS and restarts from the top. The retry must own a
        // fresh contiguous block; the torn value becomes a gap, never a
        // duplicate.
        let store = Arc::new(ExtensionContendedStore {
            inner: MemoryStore::new(),
            fired: Mutex::new(false),
        });
        let alloc = CodeAllocator::with_retry(
            store.clone(),
            RetryConfig::default().with_base_delay_ms(0),
        );
        let scope = Scope::global();

        let first = alloc.allocate_range("c", &scope, 0, 3).unwrap();
        // First attempt started at 0 and was torn; the retry owns 2..5.
        assert_eq!(first, 2);
        let next = alloc.allocate("c", &scope, 0).unwrap();
        assert_eq!(next, first + 3);
    }
}
