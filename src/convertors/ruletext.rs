//! The line-based text format for spacing rules.
//!
//! One rule per line, seven comma-separated fields:
//!
//! ```text
//! # script,category,subcategory,case,factor,reference,filter
//! *,Letter,*,upper,1.25,H,*
//! *,Number,Decimal Digit,minor,0.8,one.dnom,.dnom
//! ```
//!
//! `*` stands for "any" (subcategory, case) or "none" (reference, filter).
//! Lines starting with `#` are comments.
use std::{path::Path, sync::LazyLock};

use regex::Regex;

use crate::{
    rules::{Case, GlyphCategory, RuleId, RuleTable, SpacingRule, Subcategory},
    Font, SpacingError,
};

#[allow(clippy::unwrap_used)]
static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<script>[^,]*),(?P<category>[^,]*),(?P<subcategory>[^,]*),(?P<case>[^,]*),(?P<factor>[^,]*),(?P<reference>[^,]*),(?P<filter>[^,]*)$",
    )
    .unwrap()
});

// Shorter lines cannot hold a rule
const MIN_RULE_LENGTH: usize = 11;

/// The outcome of reading a rule file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub rules: RuleTable,
    /// Rules dropped for an unknown category or reference glyph
    pub ignored: usize,
    /// Reference glyphs which are not in the font, in order of appearance
    pub missing_references: Vec<String>,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        if self.missing_references.is_empty() && self.ignored == 0 {
            "No invalid rules detected.".to_string()
        } else {
            format!(
                "{} rules ignored. The following reference glyphs were not found in the font: {}",
                self.ignored,
                self.missing_references.join(", ")
            )
        }
    }
}

fn none_if_star(field: &str) -> Option<&str> {
    match field.trim() {
        "" | "*" => None,
        other => Some(other),
    }
}

/// Parse rule text, keeping only rules whose reference glyph passes `has_glyph`
pub fn parse(text: &str, has_glyph: impl Fn(&str) -> bool) -> Result<ImportReport, SpacingError> {
    let mut report = ImportReport::default();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim_end();
        if line.starts_with('#') || line.len() < MIN_RULE_LENGTH {
            continue;
        }
        let fields = RULE_LINE
            .captures(line)
            .ok_or_else(|| SpacingError::RuleParse {
                line: line_number,
                reason: "expected seven comma-separated fields".to_string(),
            })?;

        let Ok(category) = fields["category"].trim().parse::<GlyphCategory>() else {
            log::warn!(
                "Ignoring rule on line {} with unknown category: {}",
                line_number,
                &fields["category"]
            );
            report.ignored += 1;
            continue;
        };
        let case = Case::from_token(fields["case"].trim()).ok_or_else(|| SpacingError::RuleParse {
            line: line_number,
            reason: format!("unknown case {:?}", &fields["case"]),
        })?;
        let factor = match fields["factor"].trim().parse::<f64>() {
            Ok(factor) if factor.is_finite() && factor > 0.0 => factor,
            _ => {
                log::warn!(
                    "Rule on line {} has a bad factor {:?}; using 1.0",
                    line_number,
                    &fields["factor"]
                );
                1.0
            }
        };

        let mut rule = SpacingRule::new(Subcategory::new(fields["subcategory"].trim()), case, factor);
        if let Some(reference) = none_if_star(&fields["reference"]) {
            if !has_glyph(reference) {
                log::warn!("Ignoring rule with missing reference glyph: {}", reference);
                if !report.missing_references.iter().any(|r| r == reference) {
                    report.missing_references.push(reference.to_string());
                }
                report.ignored += 1;
                continue;
            }
            rule = rule.with_reference(reference);
        }
        if let Some(filter) = none_if_star(&fields["filter"]) {
            rule = rule.with_filter(filter);
        }
        report
            .rules
            .insert_with_id(category, RuleId::generate(), rule);
    }
    if report.ignored > 0 {
        log::warn!("{}", report.summary());
    }
    Ok(report)
}

/// Read a rule file, checking reference glyphs against `font`
pub fn load(path: impl AsRef<Path>, font: &Font) -> Result<ImportReport, SpacingError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text, |name| font.glyphs.get(name).is_some())
}

/// Write a rule table in the text format
pub fn to_string(table: &RuleTable) -> String {
    let mut out = String::from("# script,category,subcategory,case,factor,reference,filter\n");
    for (category, _id, rule) in table.iter() {
        let subcategory = match &rule.subcategory {
            Subcategory::Any => "*",
            Subcategory::Named(name) => name.as_str(),
        };
        out.push_str(&format!(
            "*,{},{},{},{},{},{}\n",
            category,
            subcategory,
            rule.case.token(),
            rule.factor,
            rule.reference_glyph.as_deref().unwrap_or("*"),
            rule.filter.as_deref().unwrap_or("*"),
        ));
    }
    out
}

pub fn save(table: &RuleTable, path: impl AsRef<Path>) -> Result<(), SpacingError> {
    std::fs::write(path, to_string(table))?;
    Ok(())
}
