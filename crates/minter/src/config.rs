//! Minting configuration
//!
//! Starting values for the three deduplicated counters. Environment
//! overrides let a deployment resume above codes that already exist in
//! an older dataset.

use codemint_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the set-code starting value.
pub const ENV_START_SET: &str = "CODE_START_SET";
/// Environment variable overriding the weight-code starting value.
pub const ENV_START_WEIGHT: &str = "CODE_START_WEIGHT";
/// Environment variable overriding the batch-variant starting value.
pub const ENV_START_BATCH: &str = "CODE_START_BATCH";

/// Starting counter values for the deduplicating minter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintConfig {
    /// First value issued for set codes ("AB" when 1).
    pub start_set: i64,
    /// First value issued for weight codes within a set.
    pub start_weight: i64,
    /// First value issued for batch-variant codes within a recipe.
    pub start_batch: i64,
}

impl Default for MintConfig {
    fn default() -> Self {
        MintConfig {
            start_set: 1,
            start_weight: 1,
            start_batch: 1,
        }
    }
}

impl MintConfig {
    /// Build from the process environment, falling back to defaults for
    /// unset variables. A set-but-unparseable variable is an error, not a
    /// silent default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = MintConfig::default();
        Ok(MintConfig {
            start_set: parse_override(&get, ENV_START_SET, defaults.start_set)?,
            start_weight: parse_override(&get, ENV_START_WEIGHT, defaults.start_weight)?,
            start_batch: parse_override(&get, ENV_START_BATCH, defaults.start_batch)?,
        })
    }
}

fn parse_override(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: i64,
) -> Result<i64> {
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidOperation(format!("{name} must be an integer, got {raw:?}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = MintConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MintConfig::default());
        assert_eq!(config.start_set, 1);
    }

    #[test]
    fn test_overrides_apply_independently() {
        let config =
            MintConfig::from_lookup(lookup(&[(ENV_START_SET, "120"), (ENV_START_BATCH, "7")]))
                .unwrap();
        assert_eq!(config.start_set, 120);
        assert_eq!(config.start_weight, 1);
        assert_eq!(config.start_batch, 7);
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let config = MintConfig::from_lookup(lookup(&[(ENV_START_SET, " 42 ")])).unwrap();
        assert_eq!(config.start_set, 42);
    }

    #[test]
    fn test_garbage_override_is_an_error() {
        let err = MintConfig::from_lookup(lookup(&[(ENV_START_WEIGHT, "twelve")])).unwrap_err();
        assert!(err.to_string().contains(ENV_START_WEIGHT));
    }
}
