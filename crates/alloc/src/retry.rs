//! Allocation retry configuration
//!
//! The allocator's read/CAS cycle retries under a bounded budget with
//! exponential backoff between attempts. The cap is a deliberate fail-fast
//! safety valve under heavy contention; unbounded retry risks live-lock.

use std::time::Duration;

/// Configuration for the allocator's bounded retry loop.
///
/// # Example
/// ```ignore
/// let retry = RetryConfig::default()
///     .with_max_attempts(20)
///     .with_base_delay_ms(1)
///     .with_max_delay_ms(50);
/// let allocator = CodeAllocator::with_retry(store, retry);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts before giving up (must be at least 1)
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 2,
            max_delay_ms: 50,
        }
    }
}

impl RetryConfig {
    /// Create a RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base backoff delay
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the backoff delay ceiling
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Backoff before the given attempt (attempt 0 never waits).
    pub(crate) fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        // Cap the shift to prevent overflow
        let shift = (attempt - 1).min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}
