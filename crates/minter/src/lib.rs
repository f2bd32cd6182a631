//! Deduplicated code minting for codemint
//!
//! Combines canonical hashing ([`codemint_codec`]), counter allocation
//! ([`codemint_alloc`]), and an entity repository into the get-or-create
//! operations the rest of the system calls.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod minter;

pub use config::MintConfig;
pub use minter::{counters, DeduplicatingMinter, MintOutcome};
