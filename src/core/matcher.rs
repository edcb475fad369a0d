//! Pattern matcher - canonical expression → structured yield model
//!
//! The workbook encodes per-crop yield behavior in many algebraically
//! equivalent formulas that differ only in their literals. Each template
//! below describes one algebraic shape with numeric slots (`{n}`); a match
//! extracts the literals and folds them into a single rate.
//!
//! Templates are tried in table order and the first one that matches the
//! whole expression wins. Within a family, shapes ending in `/harvests`
//! (the formula already yields the row total) come before their per-harvest
//! counterparts.

use crate::error::{YieldError, YieldResult};
use crate::types::YieldBasis::{Per100Feet as AREA, PerPlant as PLANT};
use crate::types::YieldPattern as P;
use crate::types::{YieldBasis, YieldModel, YieldPattern};
use regex::Regex;
use tracing::debug;

/// Placeholder for a numeric literal in a template shape
const SLOT: &str = "{n}";

/// Decimal literal: `12`, `12.`, `12.5`, `.5`
const NUMBER: &str = r"(\d+(?:\.\d*)?|\.\d+)";

/// Folds the extracted literals into `(rate, extra)`
type RateRule = fn(&[f64]) -> (f64, Option<f64>);

/// Static description of one formula shape
pub struct TemplateSpec {
    pub name: &'static str,
    pub shape: &'static str,
    pub pattern: YieldPattern,
    pub basis: YieldBasis,
    pub harvest_multiplies: bool,
    rule: RateRule,
}

const fn spec(
    name: &'static str,
    shape: &'static str,
    pattern: YieldPattern,
    basis: YieldBasis,
    harvest_multiplies: bool,
    rule: RateRule,
) -> TemplateSpec {
    TemplateSpec {
        name,
        shape,
        pattern,
        basis,
        harvest_multiplies,
        rule,
    }
}

fn unit(_: &[f64]) -> (f64, Option<f64>) {
    (1.0, None)
}

fn first(n: &[f64]) -> (f64, Option<f64>) {
    (n[0], None)
}

fn reciprocal(n: &[f64]) -> (f64, Option<f64>) {
    (1.0 / n.iter().product::<f64>(), None)
}

fn product(n: &[f64]) -> (f64, Option<f64>) {
    (n.iter().product(), None)
}

fn quotient(n: &[f64]) -> (f64, Option<f64>) {
    (n[0] / n[1], None)
}

fn inverted_quotient(n: &[f64]) -> (f64, Option<f64>) {
    (n[1] / n[0], None)
}

fn product_over_last(n: &[f64]) -> (f64, Option<f64>) {
    (n[0] * n[1] / n[2], None)
}

fn fraction_times(n: &[f64]) -> (f64, Option<f64>) {
    (n[0] / n[1] * n[2], None)
}

fn hundred_times_product(n: &[f64]) -> (f64, Option<f64>) {
    (100.0 * n.iter().product::<f64>(), None)
}

fn hundred(_: &[f64]) -> (f64, Option<f64>) {
    (100.0, None)
}

fn sunchoke(n: &[f64]) -> (f64, Option<f64>) {
    (n[0] / n[1] * n[2] * n[3], None)
}

fn scaled_over_divisor(n: &[f64]) -> (f64, Option<f64>) {
    let scale = n.get(2).copied().unwrap_or(1.0);
    (n[0] * scale / n[1], None)
}

fn lettuce(n: &[f64]) -> (f64, Option<f64>) {
    (n[1], Some(n[0]))
}

/// Every recognized shape, in match order
pub static TEMPLATES: &[TemplateSpec] = &[
    // Per-plant, formula already yields the row total
    spec("ppb_mult_div_h", "plantingsPerBed*{n}/harvests", P::PpbMultDivH, PLANT, false, first),
    spec("ppb_div_div_h", "plantingsPerBed/{n}/harvests", P::PpbDivDivH, PLANT, false, reciprocal),
    spec("ppb_div_h", "plantingsPerBed/harvests", P::PpbDivDivH, PLANT, false, unit),
    spec("ppb_inverse_harvests", "1/harvests*plantingsPerBed", P::PpbDivDivH, PLANT, false, unit),
    spec("ppb_div_h_mult", "plantingsPerBed/harvests*{n}", P::PpbMultDivH, PLANT, false, first),
    spec("ppb_mult_mult_div_h", "plantingsPerBed*{n}*{n}/harvests", P::PpbMultDivH, PLANT, false, product),
    spec("ppb_mult3_div_h", "plantingsPerBed*{n}*{n}*{n}/harvests", P::PpbMultDivH, PLANT, false, product),
    spec("ppb_mult_mult_div_div_h", "plantingsPerBed*{n}*{n}/{n}/harvests", P::PpbMultDivH, PLANT, false, product_over_last),
    spec("ppb_mult_div_div_h", "plantingsPerBed*{n}/{n}/harvests", P::PpbMultDivH, PLANT, false, quotient),
    spec("ppb_div_mult_div_h", "plantingsPerBed/{n}*{n}/harvests", P::PpbMultDivH, PLANT, false, inverted_quotient),
    spec("ppb_div2_div_h", "plantingsPerBed/{n}/{n}/harvests", P::PpbDivDivH, PLANT, false, reciprocal),
    spec("ppb_div3_div_h", "plantingsPerBed/{n}/{n}/{n}/harvests", P::PpbDivDivH, PLANT, false, reciprocal),
    // Per-plant, per harvest
    spec("ppb_direct", "plantingsPerBed", P::PpbDirect, PLANT, true, unit),
    spec("ppb_mult", "plantingsPerBed*{n}", P::PpbMult, PLANT, true, first),
    spec("ppb_div", "plantingsPerBed/{n}", P::PpbDiv, PLANT, true, reciprocal),
    spec("ppb_mult_fraction", "plantingsPerBed*({n}/{n})", P::PpbMult, PLANT, true, quotient),
    spec("ppb_mult_fraction_mult", "plantingsPerBed*({n}/{n})*{n}", P::PpbMult, PLANT, true, fraction_times),
    spec("ppb_mult_div", "plantingsPerBed*{n}/{n}", P::PpbMult, PLANT, true, quotient),
    spec("ppb_div_mult", "plantingsPerBed/{n}*{n}", P::PpbMult, PLANT, true, inverted_quotient),
    spec("ppb_div2", "plantingsPerBed/{n}/{n}", P::PpbDiv, PLANT, true, reciprocal),
    spec("ppb_div3", "plantingsPerBed/{n}/{n}/{n}", P::PpbDiv, PLANT, true, reciprocal),
    // Weekly and daily production rates
    spec("ppb_weekly_rate", "plantingsPerBed*{n}*daysBetweenHarvest/7", P::PpbWeeklyRate, PLANT, true, first),
    spec("ppb_weekly_unit", "plantingsPerBed*daysBetweenHarvest/7", P::PpbWeeklyRate, PLANT, true, unit),
    spec("ppb_weekly_rate_grouped", "plantingsPerBed*{n}*(daysBetweenHarvest/7)", P::PpbWeeklyRate, PLANT, true, first),
    spec("ppb_dbh_direct", "plantingsPerBed*{n}*daysBetweenHarvest", P::PpbDbhDirect, PLANT, true, first),
    // Area based, days-between-harvest scaled (tomatoes)
    spec("area_dbh_scaled_mult", "{n}*bedFeet/100*(harvests*daysBetweenHarvest)/{n}/harvests*{n}", P::AreaDbhScaled, AREA, true, scaled_over_divisor),
    spec("area_dbh_scaled", "{n}*bedFeet/100*(harvests*daysBetweenHarvest)/{n}/harvests", P::AreaDbhScaled, AREA, true, scaled_over_divisor),
    // Area based
    spec("area_sunchoke", "{n}*bedFeet/100/{n}*{n}*{n}/harvests", P::AreaDivH, AREA, false, sunchoke),
    spec("area_div_h", "{n}*bedFeet/100/harvests", P::AreaDivH, AREA, false, first),
    spec("area", "{n}*bedFeet/100", P::Area, AREA, true, first),
    spec("bed_length_div_h", "bedFeet/harvests", P::BedLengthDivH, AREA, false, hundred),
    spec("bed_length_mult_div_h", "bedFeet*{n}/harvests", P::BedLengthDivH, AREA, false, hundred_times_product),
    spec("bed_length_mult2_div_h", "{n}*{n}*bedFeet/harvests", P::BedLengthDivH, AREA, false, hundred_times_product),
    // Seed count stands in for plant count (shallots)
    spec("seeds_based", "1/{n}*seeds/safetyFactor", P::SeedsBased, PLANT, true, reciprocal),
    // Fixed first harvest, per-plant rate afterwards
    spec("lettuce_complex", "({n}+(harvests-1)*{n}*plantingsPerBed)/harvests", P::LettuceComplex, PLANT, false, lettuce),
];

/// A compiled template
pub struct Template {
    spec: &'static TemplateSpec,
    regex: Regex,
}

impl Template {
    /// Compile a template shape into an anchored regex
    pub fn compile(spec: &'static TemplateSpec) -> YieldResult<Self> {
        let body = spec
            .shape
            .split(SLOT)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(NUMBER);
        let regex = Regex::new(&format!("^{}$", body)).map_err(|e| YieldError::Pattern {
            template: spec.name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { spec, regex })
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn shape(&self) -> &'static str {
        self.spec.shape
    }

    pub fn pattern(&self) -> YieldPattern {
        self.spec.pattern
    }

    /// Match the whole expression against this shape.
    ///
    /// A rate that comes out infinite or NaN (a zero divisor literal) is not a
    /// usable rule, so the template does not match.
    pub fn try_match(&self, expr: &str) -> Option<YieldModel> {
        let caps = self.regex.captures(expr)?;
        let literals = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .ok()?;

        let (rate, extra) = (self.spec.rule)(&literals);
        if !rate.is_finite() || extra.is_some_and(|e| !e.is_finite()) {
            debug!(template = self.spec.name, expr, "rate is not finite, skipping");
            return None;
        }

        let model = YieldModel::new(
            self.spec.basis,
            rate,
            self.spec.harvest_multiplies,
            self.spec.pattern,
        );
        Some(match extra {
            Some(extra) => model.with_extra(extra),
            None => model,
        })
    }
}

/// Ordered template cascade
pub struct PatternMatcher {
    templates: Vec<Template>,
}

impl PatternMatcher {
    /// Compile the standard template table
    pub fn new() -> YieldResult<Self> {
        Self::from_specs(TEMPLATES)
    }

    /// Compile a custom ordered template table
    pub fn from_specs(specs: &'static [TemplateSpec]) -> YieldResult<Self> {
        let templates = specs
            .iter()
            .map(Template::compile)
            .collect::<YieldResult<Vec<_>>>()?;
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Return the model for the first template matching the whole expression
    pub fn match_expr(&self, expr: &str) -> Option<YieldModel> {
        self.match_with_template(expr).map(|(_, model)| model)
    }

    /// Like [`match_expr`](Self::match_expr), also naming the template that fired
    pub fn match_with_template(&self, expr: &str) -> Option<(&Template, YieldModel)> {
        let found = self
            .templates
            .iter()
            .find_map(|t| t.try_match(expr).map(|model| (t, model)));

        match &found {
            Some((template, model)) => {
                debug!(expr, template = template.name(), pattern = %model.pattern, rate = model.rate, "template matched")
            }
            None => debug!(expr, "no template matched"),
        }
        found
    }
}
