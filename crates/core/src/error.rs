//! Error types for code minting
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Two error classes matter to callers:
//! - `AllocationFailed` is fatal: the counter retry budget is exhausted and
//!   the caller should surface a service-unavailable condition, not retry.
//! - `OutOfRange` / `Malformed` are input errors: the caller handed a
//!   formatter or parser something it never should have.

use thiserror::Error;

/// Result type alias for minting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the minting subsystem
#[derive(Debug, Error)]
pub enum Error {
    /// Counter retry budget exhausted (lost CAS races and/or storage faults)
    #[error("failed to allocate counter '{counter}' (scope '{scope}') after {attempts} attempts")]
    AllocationFailed {
        /// Counter name that could not be advanced
        counter: String,
        /// Scope qualifier of the counter
        scope: String,
        /// Number of attempts consumed
        attempts: u32,
    },

    /// Value outside the representable code range
    #[error("code value {value} out of range [0, {max})")]
    OutOfRange {
        /// The offending value
        value: i64,
        /// Exclusive upper bound of the representable range
        max: i64,
    },

    /// Malformed code or identifier input
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Invalid operation or argument
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Storage collaborator error
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Construct a storage error from any displayable source
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// True if this error came from the storage collaborator
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    /// True if this error is the fatal allocation-budget case
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, Error::AllocationFailed { .. })
    }
}
