//! Target formula emission
//!
//! Renders a [`YieldModel`] as a total-yield expression the downstream planner
//! stores and re-parses. Identifiers are limited to [`VOCABULARY`]; operators
//! to `+ - * / ( )`.

use crate::types::{YieldBasis, YieldModel, YieldPattern};

/// Identifiers a persisted target formula may reference
pub const VOCABULARY: [&str; 6] = [
    "plantingsPerBed",
    "bedFeet",
    "harvests",
    "daysBetweenHarvest",
    "seeds",
    "safetyFactor",
];

/// Shortest decimal that round-trips to the same f64
fn literal(value: f64) -> String {
    format!("{}", value)
}

/// Build the total-yield formula for a model
pub fn target_formula(model: &YieldModel) -> String {
    let r = literal(model.rate);

    let base = match model.pattern {
        YieldPattern::PpbWeeklyRate => {
            format!("plantingsPerBed * {} * (daysBetweenHarvest / 7)", r)
        }
        YieldPattern::PpbDbhDirect => format!("plantingsPerBed * {} * daysBetweenHarvest", r),
        YieldPattern::AreaDbhScaled => {
            format!("(bedFeet / 100) * {} * daysBetweenHarvest", r)
        }
        YieldPattern::SeedsBased => format!("seeds * {} / safetyFactor", r),
        YieldPattern::LettuceComplex => {
            let first = literal(model.extra.unwrap_or(0.0));
            format!("{} + (harvests - 1) * {} * plantingsPerBed", first, r)
        }
        _ => match model.basis {
            YieldBasis::PerPlant if model.rate == 1.0 => "plantingsPerBed".to_string(),
            YieldBasis::PerPlant => format!("plantingsPerBed * {}", r),
            YieldBasis::Per100Feet => format!("(bedFeet / 100) * {}", r),
        },
    };

    match (model.harvest_multiplies, base.contains(" + ")) {
        (true, true) => format!("({}) * harvests", base),
        (true, false) => format!("{} * harvests", base),
        (false, _) => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::evaluator::evaluate;
    use crate::core::expression::tokenizer::{tokenize, Token};
    use crate::core::expression::{evaluate_formula, Variables};
    use crate::types::RowInputs;

    fn model(basis: YieldBasis, rate: f64, multiplies: bool, pattern: YieldPattern) -> YieldModel {
        YieldModel::new(basis, rate, multiplies, pattern)
    }

    #[test]
    fn test_per_plant_formulas() {
        assert_eq!(
            target_formula(&model(YieldBasis::PerPlant, 3.0, true, YieldPattern::PpbMult)),
            "plantingsPerBed * 3 * harvests"
        );
        assert_eq!(
            target_formula(&model(YieldBasis::PerPlant, 3.0, false, YieldPattern::PpbMultDivH)),
            "plantingsPerBed * 3"
        );
        assert_eq!(
            target_formula(&model(YieldBasis::PerPlant, 1.0, true, YieldPattern::PpbDirect)),
            "plantingsPerBed * harvests"
        );
        assert_eq!(
            target_formula(&model(YieldBasis::PerPlant, 0.125, false, YieldPattern::PpbDivDivH)),
            "plantingsPerBed * 0.125"
        );
    }

    #[test]
    fn test_area_formulas() {
        assert_eq!(
            target_formula(&model(YieldBasis::Per100Feet, 120.0, true, YieldPattern::Area)),
            "(bedFeet / 100) * 120 * harvests"
        );
        assert_eq!(
            target_formula(&model(YieldBasis::Per100Feet, 120.0, false, YieldPattern::AreaDivH)),
            "(bedFeet / 100) * 120"
        );
    }

    #[test]
    fn test_special_formulas() {
        assert_eq!(
            target_formula(&model(YieldBasis::PerPlant, 0.5, true, YieldPattern::PpbWeeklyRate)),
            "plantingsPerBed * 0.5 * (daysBetweenHarvest / 7) * harvests"
        );
        assert_eq!(
            target_formula(&model(YieldBasis::PerPlant, 0.0625, true, YieldPattern::SeedsBased)),
            "seeds * 0.0625 / safetyFactor * harvests"
        );
        assert_eq!(
            target_formula(
                &model(YieldBasis::PerPlant, 0.25, false, YieldPattern::LettuceComplex)
                    .with_extra(0.5)
            ),
            "0.5 + (harvests - 1) * 0.25 * plantingsPerBed"
        );
    }

    #[test]
    fn test_formulas_use_only_vocabulary() {
        for pattern in YieldPattern::ALL {
            for basis in [YieldBasis::PerPlant, YieldBasis::Per100Feet] {
                let formula = target_formula(&model(basis, 2.5, true, pattern).with_extra(1.0));
                for token in tokenize(&formula).unwrap() {
                    if let Token::Identifier(name) = token {
                        assert!(VOCABULARY.contains(&name.as_str()), "{formula}: {name}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_interpreted_formula_equals_evaluator() {
        let rows = [
            RowInputs {
                spacing: 6.0,
                rows: 4.0,
                bed_length: 50.0,
                harvests: 5.0,
                days_between_harvest: 7.0,
                seeds: 880.0,
                safety_factor: 1.1,
            },
            RowInputs {
                spacing: 9.0,
                rows: 3.0,
                bed_length: 100.0,
                harvests: 12.0,
                days_between_harvest: 3.0,
                seeds: 0.0,
                safety_factor: 1.0,
            },
        ];
        let rates = [1.0, 3.0, 1.0 / 3.0, 500.0 / 42.0, 0.0625];

        for inputs in &rows {
            for pattern in YieldPattern::ALL {
                for basis in [YieldBasis::PerPlant, YieldBasis::Per100Feet] {
                    for multiplies in [true, false] {
                        for rate in rates {
                            let m = model(basis, rate, multiplies, pattern).with_extra(0.5);
                            let formula = target_formula(&m);
                            let interpreted =
                                evaluate_formula(&formula, &Variables::from(inputs)).unwrap();
                            let direct = evaluate(&m, inputs).unwrap();
                            assert!(
                                (interpreted - direct).abs() <= 1e-9 * direct.abs().max(1.0),
                                "{formula}: {interpreted} vs {direct}"
                            );
                        }
                    }
                }
            }
        }
    }
}
