//! Evaluator for target yield formulas
//!
//! Resolves identifiers against a fixed set of row variables. Nothing else is
//! reachable from a formula.

use super::parser::Expr;
use crate::types::RowInputs;

/// Values for the target-formula vocabulary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variables {
    pub plantings_per_bed: f64,
    pub bed_feet: f64,
    pub harvests: f64,
    pub days_between_harvest: f64,
    pub seeds: f64,
    pub safety_factor: f64,
}

impl Variables {
    /// Look up a vocabulary identifier
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "plantingsPerBed" => Some(self.plantings_per_bed),
            "bedFeet" => Some(self.bed_feet),
            "harvests" => Some(self.harvests),
            "daysBetweenHarvest" => Some(self.days_between_harvest),
            "seeds" => Some(self.seeds),
            "safetyFactor" => Some(self.safety_factor),
            _ => None,
        }
    }
}

impl From<&RowInputs> for Variables {
    fn from(inputs: &RowInputs) -> Self {
        Self {
            plantings_per_bed: inputs.plantings_per_bed(),
            bed_feet: inputs.bed_length,
            harvests: inputs.harvests,
            days_between_harvest: inputs.days_between_harvest,
            seeds: inputs.seeds,
            safety_factor: inputs.safety_factor,
        }
    }
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    UnknownVariable(String),
    UnknownOperator(char),
    DivisionByZero,
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnknownVariable(name) => write!(f, "Unknown variable: {}", name),
            EvalError::UnknownOperator(op) => write!(f, "Unknown operator: {}", op),
            EvalError::DivisionByZero => write!(f, "Division by zero"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluate an expression against the row variables
pub fn evaluate(expr: &Expr, vars: &Variables) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(name) => vars
            .get(name)
            .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
        Expr::Negate(operand) => Ok(-evaluate(operand, vars)?),
        Expr::BinaryOp { op, left, right } => {
            let l = evaluate(left, vars)?;
            let r = evaluate(right, vars)?;
            match op {
                '+' => Ok(l + r),
                '-' => Ok(l - r),
                '*' => Ok(l * r),
                '/' if r == 0.0 => Err(EvalError::DivisionByZero),
                '/' => Ok(l / r),
                other => Err(EvalError::UnknownOperator(*other)),
            }
        }
    }
}
