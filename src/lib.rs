//! Yield Forge - crop-planning yield formula recognition and validation
//!
//! Legacy crop-planning workbooks encode each crop's yield as a spreadsheet
//! formula. This library recognizes those formulas, turns them into
//! structured yield models, and checks every recovered model against the
//! workbook's own cached totals.
//!
//! # Pipeline
//!
//! - [`crate::core::normalizer`]: workbook formula text → canonical expression
//! - [`crate::core::matcher`]: canonical expression → [`YieldModel`]
//! - [`crate::core::evaluator`]: model + [`RowInputs`] → total yield
//! - [`validation`]: batch comparison against the cached totals
//!
//! # Example
//!
//! ```
//! use yield_forge::{recognize_and_evaluate, Recognition, RowInputs};
//!
//! let inputs = RowInputs {
//!     spacing: 6.0,
//!     rows: 4.0,
//!     bed_length: 50.0,
//!     harvests: 5.0,
//!     ..RowInputs::default()
//! };
//!
//! match recognize_and_evaluate("=PlantingsPerBed*3", &inputs)? {
//!     Recognition::Recognized { model, total, .. } => {
//!         assert_eq!(model.rate, 3.0);
//!         assert_eq!(total, 6000.0);
//!     }
//!     Recognition::Unmatched { raw } => panic!("not recognized: {raw}"),
//! }
//! # Ok::<(), yield_forge::YieldError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod source;
pub mod types;
pub mod validation;

pub use config::HarnessConfig;
pub use error::{YieldError, YieldResult};
pub use types::{RowInputs, RowRecord, YieldBasis, YieldModel, YieldPattern};
pub use validation::{ValidationHarness, ValidationReport, ValidationResult};

use serde::Serialize;
use std::sync::OnceLock;

/// Result of recognizing a single formula
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recognition {
    Recognized {
        model: YieldModel,
        /// Total-yield expression for the downstream planner
        target_formula: String,
        total: f64,
    },
    /// Empty cell or no known shape; the raw text is kept for follow-up
    Unmatched { raw: String },
}

/// Convert a legacy formula into a yield model and evaluate it for one row.
///
/// Fails only on a division by zero in the pattern-specific arithmetic.
pub fn recognize_and_evaluate(raw: &str, inputs: &RowInputs) -> YieldResult<Recognition> {
    let harness = default_harness()?;
    let Some((_, model)) = harness.recognize(raw) else {
        return Ok(Recognition::Unmatched {
            raw: raw.to_string(),
        });
    };
    let total = crate::core::evaluate(&model, inputs)?;
    Ok(Recognition::Recognized {
        target_formula: crate::core::target_formula(&model),
        model,
        total,
    })
}

/// Validate one formula against the workbook's total with the default 1% tolerance
pub fn validate_against_expected(
    raw: &str,
    inputs: &RowInputs,
    expected: f64,
) -> YieldResult<ValidationResult> {
    Ok(default_harness()?.validate(raw, inputs, expected))
}

/// Harness with the default settings, compiled once per process
fn default_harness() -> YieldResult<&'static ValidationHarness> {
    static HARNESS: OnceLock<ValidationHarness> = OnceLock::new();
    if let Some(harness) = HARNESS.get() {
        return Ok(harness);
    }
    let harness = ValidationHarness::new(HarnessConfig::default())?;
    Ok(HARNESS.get_or_init(|| harness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_harness_is_shared() {
        let first = default_harness().unwrap();
        let second = default_harness().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.config().tolerance_pct, config::DEFAULT_TOLERANCE_PCT);
    }
}
