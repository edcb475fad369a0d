//! Row sources
//!
//! The workbook itself is read elsewhere; rows arrive here as a YAML or JSON
//! list of crop configurations:
//!
//! ```yaml
//! - row: 12
//!   crop: Lettuce
//!   product: Heads
//!   identifier: lettuce-heads
//!   formula: "=[@[Plantings Per Bed]]*3"
//!   spacing: 6
//!   rows: 4
//!   bed_length: 50
//!   harvests: 5
//!   expected_total: 6000
//! ```

use crate::config::RowDefaults;
use crate::error::YieldResult;
use crate::types::{RowInputs, RowRecord};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Supplies the rows of one validation run
pub trait RowSource {
    fn records(&self) -> YieldResult<Vec<RowRecord>>;
}

/// One row as written in a rows file; blank inputs are allowed
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowEntry {
    #[serde(default)]
    pub row: Option<usize>,
    pub crop: String,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub spacing: Option<f64>,
    #[serde(default)]
    pub rows: Option<f64>,
    #[serde(default)]
    pub bed_length: Option<f64>,
    #[serde(default)]
    pub harvests: Option<f64>,
    #[serde(default)]
    pub days_between_harvest: Option<f64>,
    #[serde(default)]
    pub seeds: Option<f64>,
    #[serde(default)]
    pub safety_factor: Option<f64>,
    #[serde(default)]
    pub expected_total: Option<f64>,
}

impl RowEntry {
    /// Resolve blanks against the defaults.
    ///
    /// Days between harvest and safety factor also fall back when zero, as the
    /// workbook leaves them at 0 for crops that do not use them.
    pub fn into_record(self, index: usize, defaults: &RowDefaults) -> RowRecord {
        let nonzero = |v: Option<f64>| v.filter(|v| *v != 0.0);
        let inputs = RowInputs {
            spacing: self.spacing.unwrap_or(0.0),
            rows: self.rows.unwrap_or(0.0),
            bed_length: self.bed_length.unwrap_or(defaults.bed_length),
            harvests: self.harvests.unwrap_or(0.0),
            days_between_harvest: nonzero(self.days_between_harvest)
                .unwrap_or(defaults.days_between_harvest),
            seeds: self.seeds.unwrap_or(defaults.seeds),
            safety_factor: nonzero(self.safety_factor).unwrap_or(defaults.safety_factor),
        };
        RowRecord {
            row: self.row.unwrap_or(index + 1),
            crop: self.crop,
            product: self.product,
            identifier: self.identifier,
            formula: self.formula,
            inputs,
            expected_total: self.expected_total,
        }
    }
}

/// Rows file on disk; `.json` is read as JSON, anything else as YAML
pub struct FileRowSource {
    path: PathBuf,
    defaults: RowDefaults,
}

impl FileRowSource {
    pub fn new(path: impl Into<PathBuf>, defaults: RowDefaults) -> Self {
        Self {
            path: path.into(),
            defaults,
        }
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }
}

impl RowSource for FileRowSource {
    fn records(&self) -> YieldResult<Vec<RowRecord>> {
        let content = std::fs::read_to_string(&self.path)?;
        let entries: Vec<RowEntry> = if self.is_json() {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        debug!(path = %self.path.display(), rows = entries.len(), "loaded rows");
        // Rows without a crop name are spacer lines in the workbook
        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                if entry.crop.trim().is_empty() {
                    debug!(index = i, "skipping row without a crop name");
                    None
                } else {
                    Some(entry.into_record(i, &self.defaults))
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::YieldError;
    use std::io::Write;
    use tempfile::Builder;

    fn rows_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_yaml_rows_with_defaults() {
        let file = rows_file(
            ".yaml",
            r#"
- crop: Lettuce
  formula: "=PlantingsPerBed*3"
  spacing: 6
  rows: 4
  harvests: 5
  expected_total: 6000
- row: 40
  crop: Garlic
  days_between_harvest: 0
"#,
        );
        let records = FileRowSource::new(file.path(), RowDefaults::default())
            .records()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row, 1);
        assert_eq!(records[0].inputs.bed_length, 50.0);
        assert_eq!(records[0].inputs.plantings_per_bed(), 400.0);
        assert_eq!(records[0].expected_total, Some(6000.0));

        assert_eq!(records[1].row, 40);
        assert_eq!(records[1].formula, None);
        assert_eq!(records[1].inputs.days_between_harvest, 7.0);
        assert_eq!(records[1].inputs.safety_factor, 1.0);
        assert!(!records[1].inputs.is_complete());
    }

    #[test]
    fn test_json_rows() {
        let file = rows_file(
            ".json",
            r#"[{"crop": "Kale", "identifier": "kale-1", "formula": "=PlantingsPerBed/4", "bed_length": 100}]"#,
        );
        let records = FileRowSource::new(file.path(), RowDefaults::default())
            .records()
            .unwrap();
        assert_eq!(records[0].identifier.as_deref(), Some("kale-1"));
        assert_eq!(records[0].inputs.bed_length, 100.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let file = rows_file(".yaml", "- crop: Kale\n  spcing: 6\n");
        assert!(matches!(
            FileRowSource::new(file.path(), RowDefaults::default()).records(),
            Err(YieldError::Yaml(_))
        ));
    }

    #[test]
    fn test_blank_crop_skipped() {
        let file = rows_file(
            ".yaml",
            r#"
- crop: Kale
  formula: "=PlantingsPerBed*3"
- crop: ''
- crop: "  "
- crop: Chard
"#,
        );
        let records = FileRowSource::new(file.path(), RowDefaults::default())
            .records()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].crop, "Kale");
        assert_eq!(records[1].crop, "Chard");
        assert_eq!(records[1].row, 4);
    }

    #[test]
    fn test_missing_file() {
        let source = FileRowSource::new("/nonexistent/rows.yaml", RowDefaults::default());
        assert!(matches!(source.records(), Err(YieldError::Io(_))));
    }
}
