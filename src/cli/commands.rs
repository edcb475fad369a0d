use crate::config::HarnessConfig;
use crate::core::evaluator::evaluate;
use crate::core::matcher::PatternMatcher;
use crate::core::target_formula::{target_formula, VOCABULARY};
use crate::error::{YieldError, YieldResult};
use crate::source::{FileRowSource, RowSource};
use crate::types::RowInputs;
use crate::validation::{ValidationHarness, ValidationReport};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Output document for the export command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Yield-model records (yieldBasis, yieldRate, ...)
    Models,
    /// identifier → { yieldFormula } map
    Shim,
}

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Config file (if any) with the command-line tolerance applied on top
fn load_config(config: Option<&Path>, tolerance: Option<f64>) -> YieldResult<HarnessConfig> {
    let config = match config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    match tolerance {
        Some(pct) => config.with_tolerance(pct),
        None => Ok(config),
    }
}

fn run_batch(rows: &Path, config: HarnessConfig) -> YieldResult<ValidationReport> {
    let source = FileRowSource::new(rows, config.defaults.clone());
    let records = source.records()?;
    let harness = ValidationHarness::new(config)?;
    Ok(harness.run(&records))
}

/// Execute the recognize command
pub fn recognize(formula: String, inputs: RowInputs) -> YieldResult<()> {
    println!("{}", "🔎 Yield Forge - Recognize".bold().green());
    println!("   Formula: {}\n", formula);

    let harness = ValidationHarness::new(HarnessConfig::default())?;

    let Some(normalized) = harness.normalizer().normalize(&formula) else {
        println!("{}", "⚠️  Not a formula (expected leading '=')".yellow());
        return Err(YieldError::Validation("formula not recognized".to_string()));
    };
    println!("   Normalized: {}", normalized.cyan());

    let Some((template, model)) = harness.matcher().match_with_template(&normalized) else {
        println!("\n{}", "⚠️  No template matched - needs manual analysis".bold().yellow());
        return Err(YieldError::Validation("formula not recognized".to_string()));
    };

    println!("   Template:   {}", template.name().bright_blue());
    println!("\n{}", "✅ Yield Model:".bold().green());
    println!("   Pattern:            {}", model.pattern.as_str().bold());
    println!("   Basis:              {}", model.basis);
    println!("   Rate:               {}", format_number(model.rate));
    println!("   Harvest multiplies: {}", model.harvest_multiplies);
    if let Some(extra) = model.extra {
        println!("   First harvest:      {}", format_number(extra));
    }
    println!("   Target formula:     {}", target_formula(&model).bright_blue());

    if inputs.is_complete() {
        let total = evaluate(&model, &inputs)?;
        println!("\n   Plantings per bed:  {}", format_number(inputs.plantings_per_bed()));
        println!("   Total yield:        {}", format_number(total).bold().green());
    } else {
        println!(
            "\n{}",
            "💡 Pass --spacing, --rows and --harvests to compute a total".yellow()
        );
    }

    Ok(())
}

/// Execute the validate command
pub fn validate(
    rows: PathBuf,
    config: Option<PathBuf>,
    tolerance: Option<f64>,
    json: Option<PathBuf>,
    strict: bool,
    verbose: bool,
) -> YieldResult<()> {
    println!("{}", "✅ Yield Forge - Validating yield formulas".bold().green());
    println!("   Rows: {}", rows.display());

    let config = load_config(config.as_deref(), tolerance)?;
    println!("   Tolerance: {}%\n", format_number(config.tolerance_pct));

    let report = run_batch(&rows, config)?;
    print!("{}", report.render_text(verbose));

    if let Some(path) = json {
        report.write_json(&path)?;
        println!("\n   Report written to {}", path.display());
    }

    println!();
    if !report.is_clean() {
        println!(
            "{}",
            format!(
                "❌ {} mismatched, {} errored",
                report.mismatched.len(),
                report.errored.len()
            )
            .bold()
            .red()
        );
        return Err(YieldError::Validation(
            "recomputed totals do not match the workbook".to_string(),
        ));
    }
    if strict && !report.is_complete() {
        println!(
            "{}",
            format!("❌ {} unmatched formulas (--strict)", report.unmatched.len())
                .bold()
                .red()
        );
        return Err(YieldError::Validation(
            "unmatched formulas in strict mode".to_string(),
        ));
    }

    println!("{}", "✅ All recognized formulas reproduce the workbook totals!".bold().green());
    Ok(())
}

/// Execute the export command
pub fn export(
    rows: PathBuf,
    output: PathBuf,
    format: ExportFormat,
    config: Option<PathBuf>,
) -> YieldResult<()> {
    println!("{}", "🔥 Yield Forge - Export".bold().green());
    println!("   Rows:   {}", rows.display());
    println!("   Output: {}\n", output.display());

    let config = load_config(config.as_deref(), None)?;
    let report = run_batch(&rows, config)?;

    let (json, count) = match format {
        ExportFormat::Models => {
            let records = report.model_records();
            (serde_json::to_string_pretty(&records)?, records.len())
        }
        ExportFormat::Shim => {
            let shim = report.shim_map();
            (serde_json::to_string_pretty(&shim)?, shim.len())
        }
    };
    fs::write(&output, json)?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   {} configs written", count);
    if !report.unmatched.is_empty() || !report.is_clean() {
        println!(
            "{}",
            format!(
                "⚠️  Skipped {} unmatched, {} mismatched, {} errored rows",
                report.unmatched.len(),
                report.mismatched.len(),
                report.errored.len()
            )
            .yellow()
        );
    }

    Ok(())
}

/// Execute the patterns command
pub fn patterns() -> YieldResult<()> {
    println!("{}", "📋 Recognized formula shapes (match order)".bold().green());
    println!();
    let matcher = PatternMatcher::new()?;
    for template in matcher.templates() {
        println!(
            "   {:<26} {:<16} {}",
            template.name().bright_blue(),
            template.pattern().as_str(),
            template.shape()
        );
    }
    println!("\n   Target formula identifiers: {}", VOCABULARY.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(6000.0), "6000");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn test_load_config_tolerance_override() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"tolerance_pct: 2.0\n").unwrap();

        let config = load_config(Some(file.path()), None).unwrap();
        assert_eq!(config.tolerance_pct, 2.0);

        let config = load_config(Some(file.path()), Some(0.5)).unwrap();
        assert_eq!(config.tolerance_pct, 0.5);

        assert!(load_config(None, Some(-3.0)).is_err());
    }
}
