//! # Letterspacer
//!
//! Letterspacer sets the sidebearings of glyphs so that the white space beside
//! each glyph matches a proportional target area, the method of the HT
//! Letterspacer tool.
//!
//! ## How spacing works
//!
//! For each glyph and master, the outline is sampled with horizontal rays to
//! find its left and right margins. The part of the margins inside a
//! *reference zone* (the height of a reference glyph such as `x` or `H`, plus
//! overshoot) is clamped to a maximum depth, smoothed at 45° and closed into a
//! polygon. The sidebearing is whatever makes the area of that polygon plus
//! the sidebearing strip match the target area.
//!
//! Which reference glyph and which area factor a glyph gets is decided by a
//! [`RuleTable`]: rules match on category, subcategory, case and a name
//! filter, most specific first.
//!
//! ## Using the engine
//!
//! [`compute_sidebearings`] is a pure function over any [`Outline`], so it can
//! be used with other font data models. For fonts in this crate's own JSON
//! model, [`Spacer`] resolves rules and references, and the
//! [`filters::AutoSpace`] filter spaces a whole font and writes the results
//! back:
//!
//! ```no_run
//! # use letterspacer::{load, SpacingError, filters::{AutoSpace, FontFilter}};
//! # fn main() -> Result<(), SpacingError> {
//! let mut font = load("MyFont.json")?;
//! AutoSpace::all().apply(&mut font)?;
//! font.save("MyFont-spaced.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Rule files
//!
//! Rules can be exchanged as plain text, one rule per line; see
//! [`convertors::ruletext`].
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod common;
pub mod convertors;
mod counter;
mod engine;
mod error;
pub mod filters;
mod font;
pub mod geometry;
mod glyph;
mod layer;
mod margins;
mod master;
mod params;
pub mod rules;
mod shape;

pub use crate::{
    common::{Node, NodeType},
    counter::{diagonize, shape_counters, CounterPolygons},
    engine::{
        average_width, compute_sidebearings, CurrentMetrics, GlyphSpacingRequest, Reference,
        Sidebearings, Sides, SkipReason, Spacer, SpacingOutcome,
    },
    error::SpacingError,
    font::Font,
    geometry::{Contours, Outline},
    glyph::{Glyph, GlyphList},
    layer::Layer,
    margins::{build_margins, extremes, MarginProfile, MarginSample, ReferenceZone},
    master::{CustomParameters, Master},
    params::MasterParameters,
    rules::{
        find_rule, Case, GlyphCategory, GlyphClass, RuleId, RuleOverrides, RuleTable,
        SpacingRule, Subcategory,
    },
    shape::{Component, Path, Shape},
};
pub use kurbo::{Point, Rect};
use std::path::PathBuf;

/// Load a font from a JSON file
pub fn load(filename: impl Into<PathBuf>) -> Result<Font, SpacingError> {
    let pb = filename.into();
    let mut font: Font = match pb.extension() {
        Some(ext) if ext == "json" => {
            let buffered = std::io::BufReader::new(std::fs::File::open(&pb)?);
            serde_json::from_reader(buffered)?
        }
        _ => return Err(SpacingError::UnknownFileType { path: pb }),
    };
    font.source = Some(pb);
    Ok(font)
}
