//! Input validation for recipe payloads

use codemint_core::{Error, Result, WeightPercent};

/// A weight-percentage recipe must total exactly 100.00 after rounding.
pub fn validate_weight_sum<S: AsRef<str>>(items: &[(S, WeightPercent)]) -> Result<()> {
    let total: u64 = items.iter().map(|(_, wt)| u64::from(wt.hundredths())).sum();
    if total != u64::from(WeightPercent::ONE_HUNDRED.hundredths()) {
        return Err(Error::InvalidOperation(format!(
            "weight percentages must sum to 100.00 after rounding, got {}.{:02}",
            total / 100,
            total % 100
        )));
    }
    Ok(())
}
