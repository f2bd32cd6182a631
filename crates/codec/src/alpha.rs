//! Two-letter alphabetic codes
//!
//! Bijection between integers in `[0, 676)` and two-character strings over
//! A-Z, where `v = 26 * first + second`. The 676-code ceiling is a closed
//! design constraint: scopes are chosen so no single counter ever needs
//! more than 676 issuances, and hitting the ceiling is a distinct,
//! reportable error rather than a wraparound.

use codemint_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of distinct two-letter codes (26 * 26)
pub const ALPHA_CODE_SPAN: i64 = 676;

/// A validated two-letter code over A-Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlphaCode([u8; 2]);

impl AlphaCode {
    /// Code for an integer in `[0, 676)`.
    pub fn from_value(value: i64) -> Result<Self> {
        if !(0..ALPHA_CODE_SPAN).contains(&value) {
            return Err(Error::OutOfRange {
                value,
                max: ALPHA_CODE_SPAN,
            });
        }
        let first = (value / 26) as u8;
        let second = (value % 26) as u8;
        Ok(AlphaCode([b'A' + first, b'A' + second]))
    }

    /// The integer this code encodes.
    pub fn value(&self) -> i64 {
        i64::from(self.0[0] - b'A') * 26 + i64::from(self.0[1] - b'A')
    }

    /// The two-character string form.
    pub fn as_str(&self) -> &str {
        // Invariant: both bytes are ASCII uppercase letters.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for AlphaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlphaCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        match bytes {
            [a @ b'A'..=b'Z', b @ b'A'..=b'Z'] => Ok(AlphaCode([*a, *b])),
            _ => Err(Error::Malformed(format!(
                "code must be exactly two uppercase letters, got '{s}'"
            ))),
        }
    }
}

impl TryFrom<String> for AlphaCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<AlphaCode> for String {
    fn from(code: AlphaCode) -> String {
        code.as_str().to_string()
    }
}

/// Format an integer in `[0, 676)` as a two-letter code.
pub fn int_to_code(value: i64) -> Result<String> {
    Ok(AlphaCode::from_value(value)?.to_string())
}

/// Parse a two-letter code back to its integer.
pub fn code_to_int(code: &str) -> Result<i64> {
    Ok(code.parse::<AlphaCode>()?.value())
}
