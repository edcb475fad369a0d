//! Aggregate validation report and its exports

use crate::core::target_formula::target_formula;
use crate::error::YieldResult;
use crate::types::{RowRecord, YieldBasis, YieldModel, YieldPattern};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::Path;

/// Width of the raw formula excerpt in text output
const FORMULA_EXCERPT: usize = 70;

/// A row whose formula was recognized
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedRow {
    pub row: usize,
    pub crop: String,
    pub product: Option<String>,
    pub identifier: Option<String>,
    pub template: &'static str,
    pub model: YieldModel,
    pub target_formula: String,
    /// Recomputed total, when the inputs allow it
    pub total: Option<f64>,
    /// Whether the total was checked against the workbook
    pub validated: bool,
}

impl RecognizedRow {
    pub(crate) fn new(
        record: &RowRecord,
        template: &'static str,
        model: YieldModel,
        total: Option<f64>,
        validated: bool,
    ) -> Self {
        Self {
            row: record.row,
            crop: record.crop.clone(),
            product: record.product.clone(),
            identifier: record.identifier.clone(),
            template,
            target_formula: target_formula(&model),
            model,
            total,
            validated,
        }
    }
}

/// A row that needs manual follow-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Formula text exactly as read from the workbook
    pub formula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<YieldPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<f64>,
    /// `null` in JSON when infinite (expected total of zero)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RowIssue {
    fn base(record: &RowRecord, raw: &str) -> Self {
        Self {
            row: record.row,
            label: record.label(),
            identifier: record.identifier.clone(),
            formula: raw.to_string(),
            pattern: None,
            computed: None,
            expected: None,
            error_pct: None,
            message: None,
        }
    }

    pub(crate) fn unmatched(record: &RowRecord, raw: &str) -> Self {
        Self::base(record, raw)
    }

    pub(crate) fn mismatched(
        record: &RowRecord,
        raw: &str,
        model: &YieldModel,
        computed: f64,
        expected: f64,
        error_pct: f64,
    ) -> Self {
        Self {
            pattern: Some(model.pattern),
            computed: Some(computed),
            expected: Some(expected),
            error_pct: Some(error_pct),
            ..Self::base(record, raw)
        }
    }

    pub(crate) fn errored(record: &RowRecord, raw: &str, model: &YieldModel, message: String) -> Self {
        Self {
            pattern: Some(model.pattern),
            message: Some(message),
            ..Self::base(record, raw)
        }
    }
}

/// Number of matched rows carrying one pattern tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCount {
    pub pattern: YieldPattern,
    pub count: usize,
}

/// Yield-model record consumed by the crop config build
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub row: usize,
    pub crop: String,
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub yield_basis: YieldBasis,
    pub yield_rate: f64,
    pub harvest_multiplies: bool,
    /// Only present for tags the basis/rate pair cannot express
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_pattern: Option<YieldPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_extra: Option<f64>,
}

impl From<&RecognizedRow> for ModelRecord {
    fn from(row: &RecognizedRow) -> Self {
        let model = &row.model;
        let yield_extra = match model.pattern {
            YieldPattern::LettuceComplex => model.extra.filter(|e| *e != 0.0),
            _ => None,
        };
        Self {
            row: row.row,
            crop: row.crop.clone(),
            product: row.product.clone(),
            identifier: row.identifier.clone(),
            yield_basis: model.basis,
            yield_rate: round6(model.rate),
            harvest_multiplies: model.harvest_multiplies,
            yield_pattern: model
                .pattern
                .needs_special_evaluation()
                .then_some(model.pattern),
            yield_extra,
        }
    }
}

/// Entry of the identifier → formula shim map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShimEntry {
    pub yield_formula: String,
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Outcome of a validation run
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    pub tolerance_pct: f64,
    /// Rows with no formula
    pub empty: usize,
    /// Matched rows (validated or not), in input order
    pub recognized: Vec<RecognizedRow>,
    pub unmatched: Vec<RowIssue>,
    pub mismatched: Vec<RowIssue>,
    pub errored: Vec<RowIssue>,
    /// Matched rows per pattern, most frequent first
    pub patterns: Vec<PatternCount>,
}

impl ValidationReport {
    pub(crate) fn new(tolerance_pct: f64) -> Self {
        Self {
            generated_at: Utc::now(),
            tolerance_pct,
            empty: 0,
            recognized: Vec::new(),
            unmatched: Vec::new(),
            mismatched: Vec::new(),
            errored: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Tally the pattern distribution
    pub(crate) fn finish(&mut self) {
        let mut counts: HashMap<YieldPattern, usize> = HashMap::new();
        for row in &self.recognized {
            *counts.entry(row.model.pattern).or_default() += 1;
        }
        let mut patterns: Vec<PatternCount> = counts
            .into_iter()
            .map(|(pattern, count)| PatternCount { pattern, count })
            .collect();
        patterns.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.pattern.as_str().cmp(b.pattern.as_str()))
        });
        self.patterns = patterns;
    }

    pub fn total_rows(&self) -> usize {
        self.empty
            + self.recognized.len()
            + self.unmatched.len()
            + self.mismatched.len()
            + self.errored.len()
    }

    pub fn validated(&self) -> usize {
        self.recognized.iter().filter(|r| r.validated).count()
    }

    pub fn unvalidated(&self) -> usize {
        self.recognized.len() - self.validated()
    }

    /// No mismatched or errored rows
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty() && self.errored.is_empty()
    }

    /// Clean and every formula recognized
    pub fn is_complete(&self) -> bool {
        self.is_clean() && self.unmatched.is_empty()
    }

    pub fn to_json(&self) -> YieldResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> YieldResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Yield-model records for every matched row
    pub fn model_records(&self) -> Vec<ModelRecord> {
        self.recognized.iter().map(ModelRecord::from).collect()
    }

    /// identifier → `{ yieldFormula }` for matched rows that carry an identifier
    pub fn shim_map(&self) -> BTreeMap<String, ShimEntry> {
        self.recognized
            .iter()
            .filter_map(|row| {
                let id = row.identifier.as_ref().filter(|id| !id.is_empty())?;
                Some((
                    id.clone(),
                    ShimEntry {
                        yield_formula: row.target_formula.clone(),
                    },
                ))
            })
            .collect()
    }

    /// Terminal rendering
    pub fn render_text(&self, verbose: bool) -> String {
        let mut out = String::new();
        let total = self.total_rows();
        let pct = |n: usize| {
            if total == 0 {
                0.0
            } else {
                100.0 * n as f64 / total as f64
            }
        };

        let _ = writeln!(out, "{}", "📊 Validation Results".bold().green());
        let _ = writeln!(out, "   Rows:        {}", total);
        let _ = writeln!(
            out,
            "   Validated:   {} ({:.1}%)",
            self.validated(),
            pct(self.validated())
        );
        let _ = writeln!(
            out,
            "   Unvalidated: {} ({:.1}%)",
            self.unvalidated(),
            pct(self.unvalidated())
        );
        let _ = writeln!(out, "   Empty:       {} ({:.1}%)", self.empty, pct(self.empty));
        let _ = writeln!(
            out,
            "   Unmatched:   {} ({:.1}%)",
            self.unmatched.len().to_string().yellow(),
            pct(self.unmatched.len())
        );
        let _ = writeln!(
            out,
            "   Mismatched:  {} ({:.1}%)",
            self.mismatched.len().to_string().red(),
            pct(self.mismatched.len())
        );
        let _ = writeln!(
            out,
            "   Errored:     {} ({:.1}%)",
            self.errored.len().to_string().red(),
            pct(self.errored.len())
        );

        if !self.patterns.is_empty() {
            let _ = writeln!(out, "\n{}", "Pattern distribution:".bold().cyan());
            for PatternCount { pattern, count } in &self.patterns {
                let _ = writeln!(out, "   {:<18} {}", pattern.as_str(), count);
            }
        }

        if !self.unmatched.is_empty() {
            let _ = writeln!(out, "\n{}", "⚠️  Unmatched formulas (need manual analysis):".bold().yellow());
            for issue in &self.unmatched {
                let _ = writeln!(out, "   Row {}: {}", issue.row, issue.label);
                let _ = writeln!(out, "      Formula: {}", excerpt(&issue.formula));
            }
        }

        if !self.mismatched.is_empty() {
            let _ = writeln!(out, "\n{}", "❌ Mismatched totals:".bold().red());
            for issue in &self.mismatched {
                let _ = writeln!(out, "   Row {}: {}", issue.row, issue.label);
                if let Some(pattern) = issue.pattern {
                    let _ = writeln!(out, "      Pattern:  {}", pattern);
                }
                let _ = writeln!(out, "      Formula:  {}", excerpt(&issue.formula));
                if let (Some(expected), Some(computed), Some(error_pct)) =
                    (issue.expected, issue.computed, issue.error_pct)
                {
                    let _ = writeln!(
                        out,
                        "      Expected: {:.2}, Got: {:.2} ({:.1}% error)",
                        expected, computed, error_pct
                    );
                }
            }
        }

        if !self.errored.is_empty() {
            let _ = writeln!(out, "\n{}", "❌ Evaluation errors:".bold().red());
            for issue in &self.errored {
                let _ = writeln!(out, "   Row {}: {}", issue.row, issue.label);
                let _ = writeln!(out, "      Formula: {}", excerpt(&issue.formula));
                if let Some(message) = &issue.message {
                    let _ = writeln!(out, "      Error:   {}", message);
                }
            }
        }

        if verbose && !self.recognized.is_empty() {
            let _ = writeln!(out, "\n{}", "✅ Recognized formulas:".bold().green());
            for row in &self.recognized {
                let status = if row.validated { "validated" } else { "not validated" };
                let _ = writeln!(
                    out,
                    "   Row {}: {} [{}] {} ({})",
                    row.row,
                    row.crop,
                    row.model.pattern,
                    row.target_formula.bright_blue(),
                    status
                );
            }
        }

        out
    }
}

fn excerpt(formula: &str) -> String {
    if formula.chars().count() <= FORMULA_EXCERPT {
        formula.to_string()
    } else {
        let head: String = formula.chars().take(FORMULA_EXCERPT).collect();
        format!("{}…", head)
    }
}
