//! Validation harness configuration
//!
//! Loaded from YAML:
//!
//! ```yaml
//! tolerance_pct: 1.0
//! defaults:
//!   bed_length: 50
//!   days_between_harvest: 7
//!   safety_factor: 1
//!   seeds: 0
//! ```

use crate::error::{YieldError, YieldResult};
use crate::types::RowInputs;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative error (percent) above which a recomputed total is a mismatch
pub const DEFAULT_TOLERANCE_PCT: f64 = 1.0;

/// Harness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// A row is mismatched when its error percentage is strictly greater
    pub tolerance_pct: f64,
    pub defaults: RowDefaults,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tolerance_pct: DEFAULT_TOLERANCE_PCT,
            defaults: RowDefaults::default(),
        }
    }
}

/// Values used when a row leaves an input blank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowDefaults {
    pub bed_length: f64,
    pub days_between_harvest: f64,
    pub safety_factor: f64,
    pub seeds: f64,
}

impl Default for RowDefaults {
    fn default() -> Self {
        let inputs = RowInputs::default();
        Self {
            bed_length: inputs.bed_length,
            days_between_harvest: inputs.days_between_harvest,
            safety_factor: inputs.safety_factor,
            seeds: inputs.seeds,
        }
    }
}

impl HarnessConfig {
    /// Read and validate a YAML config file
    pub fn load(path: &Path) -> YieldResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HarnessConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the tolerance, re-checking it
    pub fn with_tolerance(mut self, tolerance_pct: f64) -> YieldResult<Self> {
        self.tolerance_pct = tolerance_pct;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> YieldResult<()> {
        if !self.tolerance_pct.is_finite() || self.tolerance_pct < 0.0 {
            return Err(YieldError::Config(format!(
                "tolerance_pct must be a non-negative number, got {}",
                self.tolerance_pct
            )));
        }
        if self.defaults.bed_length.is_nan() || self.defaults.bed_length <= 0.0 {
            return Err(YieldError::Config(format!(
                "defaults.bed_length must be positive, got {}",
                self.defaults.bed_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.tolerance_pct, 1.0);
        assert_eq!(config.defaults.bed_length, 50.0);
        assert_eq!(config.defaults.days_between_harvest, 7.0);
        assert_eq!(config.defaults.safety_factor, 1.0);
        assert_eq!(config.defaults.seeds, 0.0);
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config("tolerance_pct: 2.5\ndefaults:\n  bed_length: 100\n");
        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.tolerance_pct, 2.5);
        assert_eq!(config.defaults.bed_length, 100.0);
        assert_eq!(config.defaults.days_between_harvest, 7.0);
    }

    #[test]
    fn test_load_rejects_negative_tolerance() {
        let file = write_config("tolerance_pct: -1\n");
        let err = HarnessConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, YieldError::Config(_)));
    }

    #[test]
    fn test_load_rejects_zero_bed_length() {
        let file = write_config("defaults:\n  bed_length: 0\n");
        assert!(matches!(
            HarnessConfig::load(file.path()),
            Err(YieldError::Config(_))
        ));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let file = write_config("tolerance_pct: [oops\n");
        assert!(matches!(
            HarnessConfig::load(file.path()),
            Err(YieldError::Yaml(_))
        ));
    }

    #[test]
    fn test_with_tolerance() {
        let config = HarnessConfig::default().with_tolerance(0.5).unwrap();
        assert_eq!(config.tolerance_pct, 0.5);
        assert!(HarnessConfig::default().with_tolerance(f64::NAN).is_err());
    }
}
