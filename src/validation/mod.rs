//! Validation harness
//!
//! Runs normalize → match → evaluate for each row and compares the recomputed
//! total with the workbook's cached value. Every row gets a classification;
//! a failing row never stops the batch.

pub mod report;

pub use report::{ModelRecord, PatternCount, RecognizedRow, RowIssue, ShimEntry, ValidationReport};

use crate::config::HarnessConfig;
use crate::core::evaluator::evaluate;
use crate::core::matcher::{PatternMatcher, Template};
use crate::core::normalizer::FormulaNormalizer;
use crate::core::target_formula::target_formula;
use crate::error::YieldResult;
use crate::types::{RowInputs, RowRecord, YieldModel};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Outcome of validating one formula
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    /// Recomputed total is within tolerance
    Matched { model: YieldModel, total: f64 },
    /// No formula, or no template fired
    Unmatched { raw: String },
    /// Template fired but the totals disagree
    Mismatched {
        model: YieldModel,
        computed: f64,
        expected: f64,
        error_pct: f64,
    },
    /// Template fired but the inputs cannot be evaluated (e.g. zero safety factor)
    Errored {
        raw: String,
        model: YieldModel,
        message: String,
    },
}

impl ValidationResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, ValidationResult::Matched { .. })
    }
}

/// Slack on the tolerance comparison so totals exactly at the limit are not
/// failed by float rounding
pub const TOLERANCE_EPSILON: f64 = 1e-9;

/// Relative error of `computed` against `expected`, in percent.
///
/// Zero when both are zero; infinite when only `expected` is zero so the row
/// always fails.
pub fn error_pct(computed: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        if computed == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else if !computed.is_finite() {
        f64::INFINITY
    } else {
        (computed - expected).abs() / expected.abs() * 100.0
    }
}

/// Normalizer, matcher and settings for a validation run
pub struct ValidationHarness {
    normalizer: FormulaNormalizer,
    matcher: PatternMatcher,
    config: HarnessConfig,
}

impl ValidationHarness {
    pub fn new(config: HarnessConfig) -> YieldResult<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: FormulaNormalizer::new()?,
            matcher: PatternMatcher::new()?,
            config,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &FormulaNormalizer {
        &self.normalizer
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Normalize and match a raw formula
    pub fn recognize(&self, raw: &str) -> Option<(&Template, YieldModel)> {
        let expr = self.normalizer.normalize(raw)?;
        self.matcher.match_with_template(&expr)
    }

    /// Validate one formula against the workbook's total
    pub fn validate(&self, raw: &str, inputs: &RowInputs, expected: f64) -> ValidationResult {
        match self.recognize(raw) {
            Some((_, model)) => self.check(raw, model, inputs, expected),
            None => ValidationResult::Unmatched {
                raw: raw.to_string(),
            },
        }
    }

    fn check(
        &self,
        raw: &str,
        model: YieldModel,
        inputs: &RowInputs,
        expected: f64,
    ) -> ValidationResult {
        let computed = match evaluate(&model, inputs) {
            Ok(total) => total,
            Err(e) => {
                return ValidationResult::Errored {
                    raw: raw.to_string(),
                    model,
                    message: e.to_string(),
                }
            }
        };

        let error_pct = error_pct(computed, expected);
        if error_pct > self.config.tolerance_pct + TOLERANCE_EPSILON {
            ValidationResult::Mismatched {
                model,
                computed,
                expected,
                error_pct,
            }
        } else {
            ValidationResult::Matched {
                model,
                total: computed,
            }
        }
    }

    /// Classify every record and assemble the aggregate report
    pub fn run(&self, records: &[RowRecord]) -> ValidationReport {
        let mut report = ValidationReport::new(self.config.tolerance_pct);

        for record in records {
            let Some(raw) = record.formula.as_deref().filter(|f| !f.trim().is_empty()) else {
                debug!(row = record.row, crop = %record.crop, "no formula");
                report.empty += 1;
                continue;
            };

            let Some((template, model)) = self.recognize(raw) else {
                debug!(row = record.row, raw, "unmatched");
                report.unmatched.push(RowIssue::unmatched(record, raw));
                continue;
            };

            // Rows without a cached total or with blank spacing/rows/harvests
            // are recognized but not checked
            let expected = record
                .expected_total
                .filter(|e| e.is_finite() && record.inputs.is_complete());
            let Some(expected) = expected else {
                debug!(row = record.row, pattern = %model.pattern, "matched, not validated");
                let total = evaluate(&model, &record.inputs).ok();
                report
                    .recognized
                    .push(RecognizedRow::new(record, template.name(), model, total, false));
                continue;
            };

            match self.check(raw, model, &record.inputs, expected) {
                ValidationResult::Matched { model, total } => {
                    debug!(row = record.row, pattern = %model.pattern, total, "validated");
                    report
                        .recognized
                        .push(RecognizedRow::new(record, template.name(), model, Some(total), true));
                }
                ValidationResult::Mismatched {
                    model,
                    computed,
                    expected,
                    error_pct,
                } => {
                    warn!(
                        row = record.row,
                        crop = %record.crop,
                        pattern = %model.pattern,
                        computed,
                        expected,
                        error_pct,
                        "total mismatch"
                    );
                    report
                        .mismatched
                        .push(RowIssue::mismatched(record, raw, &model, computed, expected, error_pct));
                }
                ValidationResult::Errored { model, message, .. } => {
                    warn!(row = record.row, crop = %record.crop, %message, "evaluation failed");
                    report
                        .errored
                        .push(RowIssue::errored(record, raw, &model, message));
                }
                ValidationResult::Unmatched { .. } => {
                    report.unmatched.push(RowIssue::unmatched(record, raw));
                }
            }
        }

        report.finish();
        info!(
            rows = report.total_rows(),
            matched = report.recognized.len(),
            unmatched = report.unmatched.len(),
            mismatched = report.mismatched.len(),
            errored = report.errored.len(),
            "validation complete"
        );
        report
    }

    /// Target formula for a recognized raw formula
    pub fn target_formula(&self, raw: &str) -> Option<String> {
        self.recognize(raw).map(|(_, model)| target_formula(&model))
    }
}
