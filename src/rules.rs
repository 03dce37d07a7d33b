//! Spacing rules and the precedence used to pick one for a glyph.
use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::SpacingError;

/// Glyph categories which spacing rules are grouped under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlyphCategory {
    Letter,
    Number,
    Separator,
    Punctuation,
    Symbol,
    Mark,
}

impl GlyphCategory {
    /// All categories, in the order rule files list them
    pub const ALL: [GlyphCategory; 6] = [
        GlyphCategory::Letter,
        GlyphCategory::Number,
        GlyphCategory::Separator,
        GlyphCategory::Punctuation,
        GlyphCategory::Symbol,
        GlyphCategory::Mark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlyphCategory::Letter => "Letter",
            GlyphCategory::Number => "Number",
            GlyphCategory::Separator => "Separator",
            GlyphCategory::Punctuation => "Punctuation",
            GlyphCategory::Symbol => "Symbol",
            GlyphCategory::Mark => "Mark",
        }
    }
}

impl fmt::Display for GlyphCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlyphCategory {
    type Err = SpacingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GlyphCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| SpacingError::General(format!("Unknown glyph category: {s}")))
    }
}

/// Letter case, as used both by glyphs and by rules.
///
/// On a rule, `Any` is a wildcard. On a glyph, `Any` means the glyph has no
/// case, and only matches rules with an `Any` case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Case {
    #[default]
    Any,
    Upper,
    Lower,
    SmallCaps,
    Minor,
    Other,
}

impl Case {
    const TOKENS: [(&'static str, Case); 6] = [
        ("*", Case::Any),
        ("upper", Case::Upper),
        ("lower", Case::Lower),
        ("smallCaps", Case::SmallCaps),
        ("minor", Case::Minor),
        ("Other", Case::Other),
    ];

    /// The token used for this case in rule files
    pub fn token(&self) -> &'static str {
        Case::TOKENS
            .iter()
            .find(|(_, case)| case == self)
            .map(|(token, _)| *token)
            .unwrap_or("*")
    }

    /// Parse a rule file case token
    pub fn from_token(token: &str) -> Option<Case> {
        Case::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, case)| *case)
    }
}

/// The subcategory a rule applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subcategory {
    #[default]
    Any,
    Named(SmolStr),
}

impl Subcategory {
    pub fn new(name: &str) -> Self {
        match name {
            "" | "*" | "Any" => Subcategory::Any,
            other => Subcategory::Named(other.into()),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Subcategory::Any)
    }
}

/// An opaque rule identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub SmolStr);

impl RuleId {
    /// A fresh random identifier
    pub fn generate() -> Self {
        RuleId(uuid::Uuid::new_v4().simple().to_string().into())
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        RuleId(s.into())
    }
}

/// A spacing exception for a class of glyphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingRule {
    #[serde(default)]
    pub subcategory: Subcategory,
    #[serde(default)]
    pub case: Case,
    /// Multiplier on the target white area; always positive
    pub factor: f64,
    /// Glyph whose height defines the reference zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_glyph: Option<SmolStr>,
    /// Only glyphs whose name contains this string are matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<SmolStr>,
}

impl SpacingRule {
    pub fn new(subcategory: Subcategory, case: Case, factor: f64) -> Self {
        SpacingRule {
            subcategory,
            case,
            factor,
            reference_glyph: None,
            filter: None,
        }
    }

    pub fn with_reference(mut self, glyph: impl Into<SmolStr>) -> Self {
        self.reference_glyph = Some(glyph.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<SmolStr>) -> Self {
        self.filter = Some(filter.into()).filter(|f: &SmolStr| !f.is_empty());
        self
    }
}

/// Per-master replacement factors, keyed by rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleOverrides(pub IndexMap<RuleId, f64>);

impl RuleOverrides {
    pub fn get(&self, id: &RuleId) -> Option<f64> {
        self.0.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How a glyph is classified for rule matching
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphClass {
    pub name: SmolStr,
    pub category: Option<GlyphCategory>,
    pub subcategory: Option<SmolStr>,
    pub case: Case,
}

/// The rule picked for a glyph, with any master override already applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    pub id: RuleId,
    pub factor: f64,
    pub reference_glyph: Option<SmolStr>,
}

#[derive(Clone, Copy)]
enum FilterMatch {
    Present,
    Absent,
}

#[derive(Clone, Copy)]
struct Tier {
    exact_subcategory: bool,
    exact_case: bool,
    filter: FilterMatch,
}

impl Tier {
    const fn new(exact_subcategory: bool, exact_case: bool, filter: FilterMatch) -> Self {
        Tier {
            exact_subcategory,
            exact_case,
            filter,
        }
    }

    fn matches(&self, rule: &SpacingRule, glyph: &GlyphClass) -> bool {
        let subcategory = match (&rule.subcategory, self.exact_subcategory) {
            (Subcategory::Named(name), true) => glyph.subcategory.as_ref() == Some(name),
            (Subcategory::Any, false) => true,
            _ => false,
        };
        let case = if self.exact_case {
            rule.case == glyph.case
        } else {
            rule.case == Case::Any
        };
        let filter = match (self.filter, &rule.filter) {
            (FilterMatch::Present, Some(filter)) => glyph.name.contains(filter.as_str()),
            (FilterMatch::Absent, None) => true,
            _ => false,
        };
        subcategory && case && filter
    }
}

// Most specific first; the first tier with a match decides.
const TIERS: [Tier; 8] = [
    Tier::new(true, true, FilterMatch::Present),
    Tier::new(true, true, FilterMatch::Absent),
    Tier::new(true, false, FilterMatch::Present),
    Tier::new(true, false, FilterMatch::Absent),
    Tier::new(false, true, FilterMatch::Present),
    Tier::new(false, true, FilterMatch::Absent),
    Tier::new(false, false, FilterMatch::Present),
    Tier::new(false, false, FilterMatch::Absent),
];

/// Spacing rules of a font, grouped by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable(pub IndexMap<GlyphCategory, IndexMap<RuleId, SpacingRule>>);

impl RuleTable {
    pub fn new() -> Self {
        RuleTable::default()
    }

    /// Add a rule under a fresh identifier
    pub fn insert(&mut self, category: GlyphCategory, rule: SpacingRule) -> RuleId {
        let id = RuleId::generate();
        self.insert_with_id(category, id.clone(), rule);
        id
    }

    pub fn insert_with_id(&mut self, category: GlyphCategory, id: RuleId, rule: SpacingRule) {
        self.0.entry(category).or_default().insert(id, rule);
    }

    pub fn get(&self, id: &RuleId) -> Option<&SpacingRule> {
        self.0.values().find_map(|rules| rules.get(id))
    }

    pub fn remove(&mut self, id: &RuleId) -> Option<SpacingRule> {
        self.0
            .values_mut()
            .find_map(|rules| rules.shift_remove(id))
    }

    pub fn category(&self, category: GlyphCategory) -> impl Iterator<Item = (&RuleId, &SpacingRule)> {
        self.0.get(&category).into_iter().flat_map(|rules| rules.iter())
    }

    /// All rules with their category, categories in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (GlyphCategory, &RuleId, &SpacingRule)> {
        GlyphCategory::ALL.into_iter().flat_map(move |category| {
            self.category(category)
                .map(move |(id, rule)| (category, id, rule))
        })
    }

    pub fn len(&self) -> usize {
        self.0.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stock rule set
    pub fn default_profile() -> Self {
        let mut table = RuleTable::new();
        let letter = GlyphCategory::Letter;
        let number = GlyphCategory::Number;
        let digit = || Subcategory::new("Decimal Digit");
        table.insert(
            letter,
            SpacingRule::new(Subcategory::Any, Case::Upper, 1.25).with_reference("H"),
        );
        table.insert(
            letter,
            SpacingRule::new(Subcategory::Any, Case::Lower, 1.0).with_reference("x"),
        );
        table.insert(
            letter,
            SpacingRule::new(Subcategory::Any, Case::SmallCaps, 1.2).with_reference("h.sc"),
        );
        table.insert(
            number,
            SpacingRule::new(digit(), Case::Upper, 1.25).with_reference("H"),
        );
        table.insert(
            number,
            SpacingRule::new(digit(), Case::Lower, 1.25).with_reference("x"),
        );
        table.insert(
            number,
            SpacingRule::new(digit(), Case::Minor, 0.8)
                .with_reference("one.dnom")
                .with_filter(".dnom"),
        );
        table
    }
}

/// Find the rule which applies to a glyph.
///
/// Rules are tried from the most to the least specific: exact subcategory
/// with exact case, exact subcategory with wildcard case, wildcard
/// subcategory with exact case, then both wildcards. Within each, rules whose
/// filter appears in the glyph name beat rules without a filter. Ties within a tier go to the earliest rule in the table. A master
/// override replaces the factor of the rule it names.
pub fn find_rule(
    table: &RuleTable,
    glyph: &GlyphClass,
    overrides: &RuleOverrides,
) -> Option<ResolvedRule> {
    let category = glyph.category?;
    let (id, rule) = TIERS.iter().find_map(|tier| {
        table
            .category(category)
            .find(|(_, rule)| tier.matches(rule, glyph))
    })?;
    let factor = match overrides.get(id) {
        Some(factor) => {
            log::debug!(
                "Rule {} factor {} overridden by master: {}",
                id,
                rule.factor,
                factor
            );
            factor
        }
        None => rule.factor,
    };
    Some(ResolvedRule {
        id: id.clone(),
        factor,
        reference_glyph: rule.reference_glyph.clone(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn glyph(name: &str, subcategory: Option<&str>, case: Case) -> GlyphClass {
        GlyphClass {
            name: name.into(),
            category: Some(GlyphCategory::Letter),
            subcategory: subcategory.map(Into::into),
            case,
        }
    }

    fn cascade() -> (RuleTable, Vec<RuleId>) {
        let mut table = RuleTable::new();
        let letter = GlyphCategory::Letter;
        let lowercase = || Subcategory::new("Lowercase");
        // Inserted least specific first so table order never decides
        let ids = vec![
            table.insert(letter, SpacingRule::new(Subcategory::Any, Case::Any, 6.0)),
            table.insert(
                letter,
                SpacingRule::new(Subcategory::Any, Case::Any, 5.0).with_filter(".sc"),
            ),
            table.insert(letter, SpacingRule::new(Subcategory::Any, Case::Lower, 4.0)),
            table.insert(
                letter,
                SpacingRule::new(Subcategory::Any, Case::Lower, 3.0).with_filter(".alt"),
            ),
            table.insert(letter, SpacingRule::new(lowercase(), Case::Lower, 2.0)),
            table.insert(
                letter,
                SpacingRule::new(lowercase(), Case::Lower, 1.0).with_filter(".ss01"),
            ),
        ];
        (table, ids)
    }

    #[rstest]
    #[case(glyph("a.ss01", Some("Lowercase"), Case::Lower), 1.0)]
    #[case(glyph("a", Some("Lowercase"), Case::Lower), 2.0)]
    #[case(glyph("a.alt", Some("Lowercase"), Case::Lower), 2.0)]
    #[case(glyph("a.alt", Some("Other"), Case::Lower), 3.0)]
    #[case(glyph("a.ss01", None, Case::Lower), 4.0)]
    #[case(glyph("h.sc", Some("Lowercase"), Case::SmallCaps), 5.0)]
    #[case(glyph("A", Some("Uppercase"), Case::Upper), 6.0)]
    fn test_tiers(#[case] query: GlyphClass, #[case] factor: f64) {
        let (table, _) = cascade();
        let rule = find_rule(&table, &query, &RuleOverrides::default()).unwrap();
        assert_eq!(rule.factor, factor);
    }

    #[test]
    fn test_specific_rule_beats_fallback() {
        let mut table = RuleTable::new();
        let first = table.insert(
            GlyphCategory::Letter,
            SpacingRule::new(Subcategory::new("Lowercase"), Case::Lower, 1.0),
        );
        table.insert(
            GlyphCategory::Letter,
            SpacingRule::new(Subcategory::Any, Case::Any, 1.25),
        );
        let rule = find_rule(
            &table,
            &glyph("x", Some("Lowercase"), Case::Lower),
            &RuleOverrides::default(),
        )
        .unwrap();
        assert_eq!(rule.id, first);
        assert_eq!(rule.factor, 1.0);
    }

    #[test]
    fn test_exact_subcategory_with_any_case() {
        let (mut table, _) = cascade();
        let any_case = table.insert(
            GlyphCategory::Letter,
            SpacingRule::new(Subcategory::new("Lowercase"), Case::Any, 1.5),
        );
        let overrides = RuleOverrides::default();
        let rule = find_rule(&table, &glyph("b", Some("Lowercase"), Case::Lower), &overrides);
        assert_eq!(rule.unwrap().id, any_case);
        // An exact case under the same subcategory still wins
        let rule = find_rule(&table, &glyph("a", Some("Lowercase"), Case::Lower), &overrides);
        assert_eq!(rule.unwrap().factor, 2.0);
        // Beats the wildcard subcategory rules, filtered or not
        let rule = find_rule(&table, &glyph("h.sc", Some("Lowercase"), Case::SmallCaps), &overrides);
        assert_eq!(rule.unwrap().id, any_case);
    }

    #[test]
    fn test_tie_goes_to_first_rule() {
        let mut table = RuleTable::new();
        let first = table.insert(
            GlyphCategory::Letter,
            SpacingRule::new(Subcategory::Any, Case::Any, 1.1),
        );
        table.insert(
            GlyphCategory::Letter,
            SpacingRule::new(Subcategory::Any, Case::Any, 1.2),
        );
        let rule = find_rule(&table, &glyph("a", None, Case::Lower), &RuleOverrides::default())
            .unwrap();
        assert_eq!(rule.id, first);
    }

    #[test]
    fn test_no_match() {
        let (table, _) = cascade();
        let mut query = glyph("one", Some("Decimal Digit"), Case::Any);
        query.category = Some(GlyphCategory::Number);
        assert_eq!(find_rule(&table, &query, &RuleOverrides::default()), None);
        query.category = None;
        assert_eq!(find_rule(&table, &query, &RuleOverrides::default()), None);
    }

    #[test]
    fn test_master_override() {
        let (table, ids) = cascade();
        let mut overrides = RuleOverrides::default();
        overrides.0.insert(ids[4].clone(), 1.5);
        let query = glyph("a", Some("Lowercase"), Case::Lower);
        let rule = find_rule(&table, &query, &overrides).unwrap();
        assert_eq!(rule.factor, 1.5);
        // The table itself is untouched
        assert_eq!(table.get(&ids[4]).unwrap().factor, 2.0);
    }

    #[rstest]
    #[case("*", Case::Any)]
    #[case("upper", Case::Upper)]
    #[case("lower", Case::Lower)]
    #[case("smallCaps", Case::SmallCaps)]
    #[case("minor", Case::Minor)]
    #[case("Other", Case::Other)]
    fn test_case_tokens(#[case] token: &str, #[case] case: Case) {
        assert_eq!(Case::from_token(token), Some(case));
        assert_eq!(case.token(), token);
    }

    #[test]
    fn test_default_profile() {
        let table = RuleTable::default_profile();
        assert_eq!(table.len(), 6);
        let query = GlyphClass {
            name: "one.dnom".into(),
            category: Some(GlyphCategory::Number),
            subcategory: Some("Decimal Digit".into()),
            case: Case::Minor,
        };
        let rule = find_rule(&table, &query, &RuleOverrides::default()).unwrap();
        assert_eq!(rule.factor, 0.8);
        assert_eq!(rule.reference_glyph.as_deref(), Some("one.dnom"));
    }

    #[test]
    fn test_remove() {
        let (mut table, ids) = cascade();
        assert!(table.remove(&ids[0]).is_some());
        assert_eq!(table.len(), 5);
        assert!(table.get(&ids[0]).is_none());
    }

    #[test]
    fn test_table_serde_roundtrip() {
        let table = RuleTable::default_profile();
        let serialized = serde_json::to_string(&table).unwrap();
        let deserialized: RuleTable = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, table);
    }
}
