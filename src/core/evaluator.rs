//! Yield evaluator - recompute a row total from a yield model
//!
//! Dispatches on the model's pattern tag. Most tags evaluate as
//! `base * rate`; the weekly, daily, seed and lettuce shapes carry their own
//! arithmetic.

use crate::error::{YieldError, YieldResult};
use crate::types::{RowInputs, YieldBasis, YieldModel, YieldPattern};

/// Reference bed length for the per-100-feet basis
pub const STANDARD_BED_LENGTH: f64 = 100.0;

/// Compute the total yield of one row.
///
/// Fails with [`YieldError::DivisionByZero`] when a SEEDS_BASED model meets a
/// zero safety factor or a LETTUCE_COMPLEX model meets zero harvests.
pub fn evaluate(model: &YieldModel, inputs: &RowInputs) -> YieldResult<f64> {
    let ppb = inputs.plantings_per_bed();
    let bed_units = inputs.bed_length / STANDARD_BED_LENGTH;

    let base = match model.pattern {
        YieldPattern::PpbWeeklyRate => ppb * model.rate * (inputs.days_between_harvest / 7.0),
        YieldPattern::PpbDbhDirect => ppb * model.rate * inputs.days_between_harvest,
        YieldPattern::AreaDbhScaled => bed_units * model.rate * inputs.days_between_harvest,
        YieldPattern::SeedsBased => {
            if inputs.safety_factor == 0.0 {
                return Err(YieldError::division_by_zero("safetyFactor"));
            }
            inputs.seeds * model.rate / inputs.safety_factor
        }
        YieldPattern::LettuceComplex => {
            if inputs.harvests == 0.0 {
                return Err(YieldError::division_by_zero("harvests"));
            }
            let first_harvest = model.extra.unwrap_or(0.0);
            // Units per harvest first, then back to the row total
            let uph = (first_harvest + (inputs.harvests - 1.0) * model.rate * ppb) / inputs.harvests;
            uph * inputs.harvests
        }
        _ => match model.basis {
            YieldBasis::PerPlant => ppb * model.rate,
            YieldBasis::Per100Feet => bed_units * model.rate,
        },
    };

    if model.harvest_multiplies {
        Ok(base * inputs.harvests)
    } else {
        Ok(base)
    }
}
