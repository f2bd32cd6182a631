//! Composite SKU identifiers
//!
//! A SKU combines a category marker, a zero-padded sequence number, and a
//! pack size, joined by underscores: `<category>_<seq:04>_<pack_size>`
//! (e.g. `1_0042_25`). Parsing also accepts the legacy compact form with
//! no separators (one category digit, four sequence digits, remaining pack
//! size digits, e.g. `1004225`).

use codemint_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed composite SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku {
    /// Ingredient category marker
    pub category_code: u32,
    /// Globally allocated sequence number
    pub seq: u32,
    /// Pack size value (unit tracked separately by the caller)
    pub pack_size_value: u32,
}

impl Sku {
    /// Build a SKU from its parts.
    pub fn new(category_code: u32, seq: u32, pack_size_value: u32) -> Self {
        Sku {
            category_code,
            seq,
            pack_size_value,
        }
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{:04}_{}",
            self.category_code, self.seq, self.pack_size_value
        )
    }
}

fn numeric_part(part: &str, what: &str, sku: &str) -> Result<u32> {
    part.parse::<u32>()
        .map_err(|_| Error::Malformed(format!("sku '{sku}' has non-numeric {what} '{part}'")))
}

impl FromStr for Sku {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.contains('_') {
            let parts: Vec<&str> = s.split('_').collect();
            if parts.len() != 3 {
                return Err(Error::Malformed(format!(
                    "sku '{s}' must be <category>_<seq>_<pack_size>"
                )));
            }
            return Ok(Sku {
                category_code: numeric_part(parts[0], "category", s)?,
                seq: numeric_part(parts[1], "sequence", s)?,
                pack_size_value: numeric_part(parts[2], "pack size", s)?,
            });
        }

        // Legacy compact form: 1 category digit, 4 sequence digits, rest
        // pack size.
        if !s.is_ascii() || s.len() < 6 {
            return Err(Error::Malformed(format!("sku '{s}' too short")));
        }
        Ok(Sku {
            category_code: numeric_part(&s[0..1], "category", s)?,
            seq: numeric_part(&s[1..5], "sequence", s)?,
            pack_size_value: numeric_part(&s[5..], "pack size", s)?,
        })
    }
}
