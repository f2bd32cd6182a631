//! Shared value types for the minting subsystem
//!
//! - `Scope`: namespace qualifier partitioning counters and entity lookups
//! - `ContentHash`: hex-encoded canonical digest used as a natural key
//! - `WeightPercent`: exact two-decimal percentage (integer hundredths)
//! - `CounterKey` / `Counter`: durable keyed-counter records
//! - `EntityRecord` / `DetailRow`: persisted shape of a minted entity

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace qualifier for counters and entity lookups.
///
/// Independent parents get independent numbering sequences: a weight code
/// counter scoped under set "AB" is unrelated to the one under set "AC".
/// The global scope is the empty string, matching the backing store's
/// `scope` column for unscoped counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// The unscoped (global) qualifier
    pub fn global() -> Self {
        Scope(String::new())
    }

    /// Scope under a single parent code
    pub fn new(qualifier: impl Into<String>) -> Self {
        Scope(qualifier.into())
    }

    /// Scope under multiple parent codes, space-joined
    /// (e.g. a batch variant is scoped under `"<set_code> <weight_code>"`)
    pub fn joined(parts: &[&str]) -> Self {
        Scope(parts.join(" "))
    }

    /// The raw qualifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the global scope
    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Scope(s.to_string())
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Scope(s)
    }
}

/// Hex-encoded SHA-256 digest of a canonicalized entity.
///
/// Stored as the content-derived natural key for deduplication; two entities
/// are dedup-equivalent iff their hashes are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Encode a raw 256-bit digest as lowercase hex
    pub fn from_digest(digest: [u8; 32]) -> Self {
        ContentHash(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// The hex string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = Error;

    /// Parse a stored hash value; 64 lowercase hex characters.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(Error::Malformed(format!(
                "content hash must be 64 lowercase hex characters, got '{s}'"
            )));
        }
        Ok(ContentHash(s.to_string()))
    }
}

/// A weight percentage with exactly two decimal places, stored as integer
/// hundredths so canonical rendering is stable across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightPercent(u32);

impl WeightPercent {
    /// Zero percent
    pub const ZERO: WeightPercent = WeightPercent(0);
    /// One hundred percent, the required recipe total
    pub const ONE_HUNDRED: WeightPercent = WeightPercent(10_000);

    /// Construct from integer hundredths of a percent (1234 => 12.34%)
    pub fn from_hundredths(hundredths: u32) -> Self {
        WeightPercent(hundredths)
    }

    /// Construct from a float percentage, rounding half-up to two decimals
    /// (12.345 => 12.35%). Rounding applies to the exact binary value of
    /// the input, not to the inexact product `percent * 100.0`.
    pub fn from_percent(percent: f64) -> Result<Self> {
        if !percent.is_finite() || percent < 0.0 {
            return Err(Error::InvalidOperation(format!(
                "weight percent must be a non-negative finite number, got {percent}"
            )));
        }
        u32::try_from(round_half_up_hundredths(percent))
            .map(WeightPercent)
            .map_err(|_| Error::InvalidOperation(format!("weight percent {percent} too large")))
    }

    /// Integer hundredths of a percent
    pub fn hundredths(&self) -> u32 {
        self.0
    }
}

/// Half-up rounding of `value * 100` on the exact binary value of `value`.
///
/// `(value * 100.0).round()` double-rounds: the multiply itself rounds to
/// the nearest representable double, which can carry a value across the
/// .005 tie before the half-up step (0.015_f64 is exactly 0.01499.., yet
/// `0.015 * 100.0 == 1.5`). Decomposing into mantissa and power-of-two
/// exponent keeps the arithmetic exact.
fn round_half_up_hundredths(value: f64) -> u64 {
    let bits = value.to_bits();
    let raw_exp = ((bits >> 52) & 0x7ff) as i32;
    let frac = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if raw_exp == 0 {
        (frac, -1074)
    } else {
        (frac | (1u64 << 52), raw_exp - 1075)
    };
    if mantissa == 0 {
        return 0;
    }
    if exp >= 0 {
        // 2^52 percent and beyond; the caller rejects it as too large.
        return u64::MAX;
    }
    // mantissa * 100 < 2^60, so anything scaled down by 2^61 or more is
    // under half a hundredth and rounds to zero.
    if exp <= -61 {
        return 0;
    }
    let scaled = u128::from(mantissa) * 100;
    let divisor = 1u128 << (-exp as u32);
    ((scaled + divisor / 2) / divisor) as u64
}

impl fmt::Display for WeightPercent {
    /// Renders with exactly two decimal places; this is the canonical form
    /// hashed for deduplication.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Key of a durable counter: (counter_name, scope)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterKey {
    /// Counter name (e.g. "set_code", "weight_code")
    pub name: String,
    /// Scope qualifier
    pub scope: Scope,
}

impl CounterKey {
    /// Build a counter key
    pub fn new(name: impl Into<String>, scope: Scope) -> Self {
        CounterKey {
            name: name.into(),
            scope,
        }
    }
}

/// A durable counter record.
///
/// `next_value` is non-decreasing for a given key and is only mutated
/// through the store's conditional update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    /// Next value to hand out
    pub next_value: i64,
    /// Last successful update
    pub updated_at: DateTime<Utc>,
}

impl Counter {
    /// A freshly created counter starting at `start_value`
    pub fn starting_at(start_value: i64) -> Self {
        Counter {
            next_value: start_value,
            updated_at: Utc::now(),
        }
    }
}

/// One persisted detail row of a minted entity: the member identifier plus
/// an optional rendered attribute (weight percentage, batch code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRow {
    /// Member identifier (e.g. a SKU)
    pub key: String,
    /// Rendered attribute, if the entity kind carries one
    pub value: Option<String>,
}

/// Persisted shape of a minted entity: the canonical row plus its details.
///
/// Once inserted, the `(scope, hash)` to `code` pairing is immutable;
/// resubmitting equivalent content must resolve to this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Scope the entity was minted under
    pub scope: Scope,
    /// Canonical content hash
    pub hash: ContentHash,
    /// The minted short code
    pub code: String,
    /// Member detail rows
    pub details: Vec<DetailRow>,
    /// Actor that submitted the entity, if known
    pub created_by: Option<String>,
    /// Insertion timestamp
    pub created_at: DateTime<Utc>,
}
