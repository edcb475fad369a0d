//! Scoped arithmetic interpreter for target yield formulas
//!
//! Target formulas are the strings persisted for the downstream planner, e.g.
//! `plantingsPerBed * 0.25 * harvests`. The language is `+ - * / ( )`, decimal
//! literals and the identifiers in [`VOCABULARY`](crate::core::target_formula::VOCABULARY).

pub mod evaluator;
pub mod parser;
pub mod tokenizer;

pub use evaluator::{EvalError, Variables};
pub use parser::Expr;

use crate::error::{YieldError, YieldResult};

/// Parse a target formula into an AST
pub fn parse_formula(formula: &str) -> YieldResult<Expr> {
    let tokens = tokenizer::tokenize(formula).map_err(|e| YieldError::Parse(e.to_string()))?;
    parser::parse(tokens).map_err(|e| YieldError::Parse(e.to_string()))
}

/// Parse and evaluate a target formula against row variables
pub fn evaluate_formula(formula: &str, vars: &Variables) -> YieldResult<f64> {
    let expr = parse_formula(formula)?;
    evaluator::evaluate(&expr, vars).map_err(|e| match e {
        EvalError::DivisionByZero => YieldError::division_by_zero(format!("divisor in '{}'", formula)),
        other => YieldError::Eval(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Variables {
        Variables {
            plantings_per_bed: 400.0,
            bed_feet: 50.0,
            harvests: 5.0,
            days_between_harvest: 7.0,
            seeds: 0.0,
            safety_factor: 0.0,
        }
    }

    #[test]
    fn test_evaluate_formula() {
        assert_eq!(
            evaluate_formula("plantingsPerBed * 3", &vars()).unwrap(),
            1200.0
        );
    }

    #[test]
    fn test_errors_map_to_crate_errors() {
        assert!(matches!(
            evaluate_formula("plantingsPerBed *", &vars()),
            Err(YieldError::Parse(_))
        ));
        assert!(matches!(
            evaluate_formula("plantingsPerBed $ 2", &vars()),
            Err(YieldError::Parse(_))
        ));
        assert!(matches!(
            evaluate_formula("spacing * 2", &vars()),
            Err(YieldError::Eval(_))
        ));
        assert!(matches!(
            evaluate_formula("seeds / safetyFactor", &vars()),
            Err(YieldError::DivisionByZero { .. })
        ));
    }
}
