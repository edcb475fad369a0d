//! Formula normalization - workbook formula text → canonical variable form
//!
//! Converts `=Crops[[#This Row],[Plantings Per Bed]]*3/Crops[[#This Row],[Harvests]]`
//! into `plantingsPerBed*3/harvests`, the form the pattern matcher works on.

use crate::error::{YieldError, YieldResult};
use regex::{Captures, Regex};

/// Workbook column display names and the canonical identifier each becomes.
///
/// Both the spaced header spelling and the compact named-range spelling are
/// listed. "Standard Bed Length" is the 100 ft reference length and is
/// inlined as a literal.
pub const COLUMN_NAMES: &[(&str, &str)] = &[
    ("Plantings Per Bed", "plantingsPerBed"),
    ("PlantingsPerBed", "plantingsPerBed"),
    ("Days Between Harvest", "daysBetweenHarvest"),
    ("DaysBetweenHarvest", "daysBetweenHarvest"),
    ("Standard Bed Length", "100"),
    ("StandardBedLength", "100"),
    ("Bed Length", "bedFeet"),
    ("BedLength", "bedFeet"),
    ("Harvests", "harvests"),
    ("Seeds Per Bed", "seeds"),
    ("SeedsPerBed", "seeds"),
    ("Safety Factor", "safetyFactor"),
    ("SafetyFactor", "safetyFactor"),
];

/// Normalizes raw workbook formulas into canonical variable expressions
pub struct FormulaNormalizer {
    /// `Table[[#This Row],` and `Table[@` prefixes of structured references
    structured_ref: Regex,
    /// Alternation of every display name, longest first
    column_names: Regex,
    columns: Vec<(String, String)>,
}

impl FormulaNormalizer {
    /// Create a normalizer for the standard crop-chart vocabulary
    pub fn new() -> YieldResult<Self> {
        Self::with_columns(COLUMN_NAMES.iter().map(|(d, c)| (d.to_string(), c.to_string())))
    }

    /// Create a normalizer for a custom display-name → identifier vocabulary
    pub fn with_columns<I>(columns: I) -> YieldResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let structured_ref = Regex::new(r"(?:[A-Za-z_][A-Za-z0-9_.]*)?\[(?:\[(?i:#this row)\],\s*|@)")
            .map_err(|e| pattern_error("structured reference", e))?;

        let mut columns: Vec<(String, String)> = columns.into_iter().collect();
        // A name that is a substring of a longer one must lose to it
        columns.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let alternation = columns
            .iter()
            .map(|(display, _)| regex::escape(display))
            .collect::<Vec<_>>()
            .join("|");
        let column_names =
            Regex::new(&format!("(?:{})", alternation)).map_err(|e| pattern_error("column names", e))?;

        Ok(Self {
            structured_ref,
            column_names,
            columns,
        })
    }

    /// Normalize a raw formula.
    ///
    /// Returns `None` when the cell is empty or does not hold a formula.
    ///
    /// Example:
    /// - Input: `=Crops[[#This Row],[Plantings Per Bed]]/2`
    /// - Output: `plantingsPerBed/2`
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let body = raw.trim_start().strip_prefix('=')?;

        // 1. Unwrap structured references down to bare display names
        let unwrapped = self.structured_ref.replace_all(body, "");
        let unwrapped: String = unwrapped.chars().filter(|c| *c != '[' && *c != ']').collect();

        // 2. Single left-to-right pass, longest display name wins at each position
        let substituted = self
            .column_names
            .replace_all(&unwrapped, |caps: &Captures| self.canonical(&caps[0]).to_string());

        // 3. Whitespace carries no meaning once names are single tokens
        let normalized: String = substituted.chars().filter(|c| !c.is_whitespace()).collect();

        if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        }
    }

    fn canonical<'a>(&'a self, display: &'a str) -> &'a str {
        self.columns
            .iter()
            .find(|(name, _)| name == display)
            .map(|(_, canonical)| canonical.as_str())
            .unwrap_or(display)
    }
}

fn pattern_error(template: &str, e: regex::Error) -> YieldError {
    YieldError::Pattern {
        template: template.to_string(),
        message: e.to_string(),
    }
}
