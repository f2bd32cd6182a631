//! Unique integer allocation for codemint
//!
//! [`CodeAllocator`] draws unique, monotonically increasing integers from
//! named, scoped counters behind a [`codemint_core::CounterStore`],
//! retrying a read/compare-and-swap cycle under the bounded budget of
//! [`RetryConfig`]. Supports single values and contiguous range
//! reservation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod allocator;
pub mod retry;

pub use allocator::CodeAllocator;
pub use retry::RetryConfig;
