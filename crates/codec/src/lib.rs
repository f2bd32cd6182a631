//! Pure formatting and hashing for codemint
//!
//! Everything here is side-effect free:
//! - `alpha`: integer <-> two-letter code bijection (`AlphaCode`)
//! - `sku`: composite SKU formatting and parsing (`Sku`)
//! - `canonical`: order-independent content hashing (`CanonicalEntity`)
//! - `validate`: recipe payload validation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alpha;
pub mod canonical;
pub mod sku;
pub mod validate;

pub use alpha::{code_to_int, int_to_code, AlphaCode, ALPHA_CODE_SPAN};
pub use canonical::{
    hash_batches, hash_set, hash_weights, CanonicalEntity, CANONICAL_DELIMITER,
};
pub use sku::Sku;
pub use validate::validate_weight_sum;
