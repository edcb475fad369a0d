use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Yield Model
//==============================================================================

/// The quantity a yield rate multiplies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YieldBasis {
    /// Rate applies to each plant in the bed (plantings per bed)
    #[serde(rename = "per-plant")]
    PerPlant,
    /// Rate applies to each 100 feet of bed
    #[serde(rename = "per-100ft")]
    Per100Feet,
}

impl YieldBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            YieldBasis::PerPlant => "per-plant",
            YieldBasis::Per100Feet => "per-100ft",
        }
    }
}

impl fmt::Display for YieldBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag of the formula shape that produced a model.
///
/// The tag decides which evaluation branch applies; most tags evaluate through
/// the plain basis/rate path, a few need their own arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YieldPattern {
    PpbDirect,
    PpbMult,
    PpbDiv,
    PpbMultDivH,
    PpbDivDivH,
    PpbWeeklyRate,
    PpbDbhDirect,
    Area,
    AreaDivH,
    AreaDbhScaled,
    BedLengthDivH,
    SeedsBased,
    LettuceComplex,
}

impl YieldPattern {
    pub const ALL: [YieldPattern; 13] = [
        YieldPattern::PpbDirect,
        YieldPattern::PpbMult,
        YieldPattern::PpbDiv,
        YieldPattern::PpbMultDivH,
        YieldPattern::PpbDivDivH,
        YieldPattern::PpbWeeklyRate,
        YieldPattern::PpbDbhDirect,
        YieldPattern::Area,
        YieldPattern::AreaDivH,
        YieldPattern::AreaDbhScaled,
        YieldPattern::BedLengthDivH,
        YieldPattern::SeedsBased,
        YieldPattern::LettuceComplex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            YieldPattern::PpbDirect => "PPB_DIRECT",
            YieldPattern::PpbMult => "PPB_MULT",
            YieldPattern::PpbDiv => "PPB_DIV",
            YieldPattern::PpbMultDivH => "PPB_MULT_DIV_H",
            YieldPattern::PpbDivDivH => "PPB_DIV_DIV_H",
            YieldPattern::PpbWeeklyRate => "PPB_WEEKLY_RATE",
            YieldPattern::PpbDbhDirect => "PPB_DBH_DIRECT",
            YieldPattern::Area => "AREA",
            YieldPattern::AreaDivH => "AREA_DIV_H",
            YieldPattern::AreaDbhScaled => "AREA_DBH_SCALED",
            YieldPattern::BedLengthDivH => "BED_LENGTH_DIV_H",
            YieldPattern::SeedsBased => "SEEDS_BASED",
            YieldPattern::LettuceComplex => "LETTUCE_COMPLEX",
        }
    }

    /// Patterns the downstream crop config must carry explicitly because the
    /// basis/rate pair alone does not describe how to evaluate them
    pub fn needs_special_evaluation(&self) -> bool {
        matches!(
            self,
            YieldPattern::PpbWeeklyRate
                | YieldPattern::PpbDbhDirect
                | YieldPattern::AreaDbhScaled
                | YieldPattern::SeedsBased
                | YieldPattern::LettuceComplex
        )
    }
}

impl fmt::Display for YieldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured yield rule recovered from a workbook formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldModel {
    pub basis: YieldBasis,
    pub rate: f64,
    /// True when the matched formula is a per-harvest amount that must be
    /// multiplied by the harvest count to get the row total
    pub harvest_multiplies: bool,
    pub pattern: YieldPattern,
    /// First-harvest yield (lettuce only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<f64>,
}

impl YieldModel {
    pub fn new(
        basis: YieldBasis,
        rate: f64,
        harvest_multiplies: bool,
        pattern: YieldPattern,
    ) -> Self {
        Self {
            basis,
            rate,
            harvest_multiplies,
            pattern,
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: f64) -> Self {
        self.extra = Some(extra);
        self
    }
}

//==============================================================================
// Row Inputs
//==============================================================================

/// Per-row numeric context read from the workbook
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowInputs {
    /// In-row spacing in inches
    pub spacing: f64,
    pub rows: f64,
    /// Bed length in feet
    pub bed_length: f64,
    pub harvests: f64,
    pub days_between_harvest: f64,
    pub seeds: f64,
    pub safety_factor: f64,
}

impl Default for RowInputs {
    fn default() -> Self {
        Self {
            spacing: 0.0,
            rows: 0.0,
            bed_length: 50.0,
            harvests: 1.0,
            days_between_harvest: 7.0,
            seeds: 0.0,
            safety_factor: 1.0,
        }
    }
}

impl RowInputs {
    /// Plants in one bed: (12 / spacing) * rows * bed length.
    ///
    /// Zero when spacing or rows is not positive.
    pub fn plantings_per_bed(&self) -> f64 {
        if self.spacing <= 0.0 || self.rows <= 0.0 {
            return 0.0;
        }
        (12.0 / self.spacing) * self.rows * self.bed_length
    }

    /// Whether the row carries enough data to recompute a total
    pub fn is_complete(&self) -> bool {
        self.spacing > 0.0 && self.rows > 0.0 && self.harvests > 0.0
    }
}

//==============================================================================
// Workbook Rows
//==============================================================================

/// One crop configuration row handed over by a row source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    /// Workbook row number (for follow-up)
    pub row: usize,
    pub crop: String,
    pub product: Option<String>,
    pub identifier: Option<String>,
    /// Raw "Units Per Harvest" formula text
    pub formula: Option<String>,
    pub inputs: RowInputs,
    /// The workbook's cached total yield for the row
    pub expected_total: Option<f64>,
}

impl RowRecord {
    /// Short label used in reports: "Crop (Product)"
    pub fn label(&self) -> String {
        match &self.product {
            Some(product) if !product.is_empty() => format!("{} ({})", self.crop, product),
            _ => self.crop.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plantings_per_bed() {
        let inputs = RowInputs {
            spacing: 6.0,
            rows: 4.0,
            bed_length: 50.0,
            ..RowInputs::default()
        };
        assert_eq!(inputs.plantings_per_bed(), 400.0);
    }

    #[test]
    fn test_plantings_per_bed_degenerate() {
        let no_spacing = RowInputs {
            spacing: 0.0,
            rows: 4.0,
            ..RowInputs::default()
        };
        assert_eq!(no_spacing.plantings_per_bed(), 0.0);

        let negative_rows = RowInputs {
            spacing: 12.0,
            rows: -1.0,
            ..RowInputs::default()
        };
        assert_eq!(negative_rows.plantings_per_bed(), 0.0);
    }

    #[test]
    fn test_pattern_serializes_as_tag() {
        let json = serde_json::to_string(&YieldPattern::PpbMultDivH).unwrap();
        assert_eq!(json, "\"PPB_MULT_DIV_H\"");
        for pattern in YieldPattern::ALL {
            let json = serde_json::to_string(&pattern).unwrap();
            assert_eq!(json, format!("\"{}\"", pattern.as_str()));
        }
    }

    #[test]
    fn test_model_serializes_camel_case() {
        let model = YieldModel::new(YieldBasis::PerPlant, 0.25, false, YieldPattern::LettuceComplex)
            .with_extra(0.5);
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["basis"], "per-plant");
        assert_eq!(json["harvestMultiplies"], false);
        assert_eq!(json["pattern"], "LETTUCE_COMPLEX");
        assert_eq!(json["extra"], 0.5);
    }

    #[test]
    fn test_special_evaluation_patterns() {
        assert!(YieldPattern::SeedsBased.needs_special_evaluation());
        assert!(YieldPattern::LettuceComplex.needs_special_evaluation());
        assert!(!YieldPattern::PpbMult.needs_special_evaluation());
        assert!(!YieldPattern::AreaDivH.needs_special_evaluation());
    }

    #[test]
    fn test_row_label() {
        let record = RowRecord {
            row: 3,
            crop: "Lettuce".to_string(),
            product: Some("Heads".to_string()),
            identifier: None,
            formula: None,
            inputs: RowInputs::default(),
            expected_total: None,
        };
        assert_eq!(record.label(), "Lettuce (Heads)");
    }
}
