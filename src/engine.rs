//! The spacing engine: from an outline and a reference zone to new sidebearings.
//!
//! [`compute_sidebearings`] is a pure function of its request and never
//! touches a font. [`Spacer`] gathers requests from a [`Font`]: it resolves
//! the rule and reference glyph of each glyph and decomposes components.
use std::{fmt, str::FromStr};

use kurbo::Point;

use crate::{
    counter::shape_counters,
    geometry::{deslant, polygon_area, Outline},
    margins::{build_margins, extremes, ReferenceZone},
    params::MasterParameters,
    rules::find_rule,
    Font, Master, SpacingError,
};

/// Glyphs whose name contains this are left for manual spacing
const MANUAL_ONLY: &str = "fraction";

/// Which sidebearings a spacing run may change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sides {
    Left,
    Right,
    #[default]
    Both,
}

impl Sides {
    pub fn left(&self) -> bool {
        matches!(self, Sides::Left | Sides::Both)
    }

    pub fn right(&self) -> bool {
        matches!(self, Sides::Right | Sides::Both)
    }
}

impl FromStr for Sides {
    type Err = SpacingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Sides::Left),
            "right" => Ok(Sides::Right),
            "both" => Ok(Sides::Both),
            _ => Err(SpacingError::General(format!(
                "Sides must be left, right or both, not {s}"
            ))),
        }
    }
}

/// The metrics a layer has before spacing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentMetrics {
    pub lsb: f64,
    pub rsb: f64,
    pub width: f64,
}

/// The glyph whose height defines the reference zone
#[derive(Clone, Copy)]
pub struct Reference<'a> {
    pub name: &'a str,
    pub outline: &'a dyn Outline,
}

/// Everything needed to space one glyph in one master
#[derive(Clone, Copy)]
pub struct GlyphSpacingRequest<'a> {
    pub name: &'a str,
    /// The decomposed outline
    pub outline: &'a dyn Outline,
    pub current: CurrentMetrics,
    /// The host drives the width by automatic alignment
    pub width_aligned: bool,
    pub left_linked: bool,
    pub right_linked: bool,
    pub tabular: bool,
    /// Fixed width for tabular glyphs; the current width if unset
    pub tabular_width: Option<f64>,
    pub sides: Sides,
    /// `None` measures against the glyph itself
    pub reference: Option<Reference<'a>>,
    pub params: MasterParameters,
    pub factor: f64,
}

impl<'a> GlyphSpacingRequest<'a> {
    /// A request with factor 1, no reference glyph and nothing linked
    pub fn new(
        name: &'a str,
        outline: &'a dyn Outline,
        current: CurrentMetrics,
        params: MasterParameters,
    ) -> Self {
        GlyphSpacingRequest {
            name,
            outline,
            current,
            width_aligned: false,
            left_linked: false,
            right_linked: false,
            tabular: false,
            tabular_width: None,
            sides: Sides::Both,
            reference: None,
            params,
            factor: 1.0,
        }
    }
}

/// New metrics for a glyph
#[derive(Debug, Clone, PartialEq)]
pub struct Sidebearings {
    pub left: f64,
    pub right: f64,
    /// Set when a tabular glyph was fitted to its width
    pub width: Option<f64>,
    /// Name of the glyph the reference zone was taken from
    pub reference: String,
    pub warnings: Vec<String>,
}

/// Why a glyph was left alone
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    EmptyLayer {
        glyph: String,
    },
    NoLayer {
        glyph: String,
        master: String,
    },
    AlignedWidth {
        glyph: String,
    },
    MetricKeys {
        glyph: String,
    },
    ManualOnly {
        glyph: String,
    },
    NoZoneMeasurement {
        glyph: String,
        reference: String,
        zone: ReferenceZone,
    },
    FlatReferenceZone {
        glyph: String,
        reference: String,
    },
    InvalidParameters {
        glyph: String,
        reason: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyLayer { glyph } => write!(f, "No paths in glyph {glyph}"),
            SkipReason::NoLayer { glyph, master } => {
                write!(f, "Glyph {glyph} has no layer for master {master}")
            }
            SkipReason::AlignedWidth { glyph } => write!(
                f,
                "Glyph ({glyph}) has automatic alignment. Spacing not set."
            ),
            SkipReason::MetricKeys { glyph } => {
                write!(f, "Glyph ({glyph}) has metric keys. Spacing not set.")
            }
            SkipReason::ManualOnly { glyph } => write!(
                f,
                "Glyph ({glyph}) should be checked and done manually."
            ),
            SkipReason::NoZoneMeasurement {
                glyph,
                reference,
                zone,
            } => write!(
                f,
                "The outlines of {glyph} are outside the reference zone {}..{}. No match with {reference}",
                zone.min, zone.max
            ),
            SkipReason::FlatReferenceZone { glyph, reference } => write!(
                f,
                "The reference zone of {reference} has no height. Glyph {glyph} cannot be spaced"
            ),
            SkipReason::InvalidParameters { glyph, reason } => {
                write!(f, "Glyph {glyph} not spaced: {reason}")
            }
        }
    }
}

/// The result of spacing one glyph
#[derive(Debug, Clone, PartialEq)]
pub enum SpacingOutcome {
    Spaced(Sidebearings),
    Skipped(SkipReason),
}

impl SpacingOutcome {
    pub fn sidebearings(&self) -> Option<&Sidebearings> {
        match self {
            SpacingOutcome::Spaced(sb) => Some(sb),
            SpacingOutcome::Skipped(_) => None,
        }
    }
}

/// Compute new sidebearings for one glyph.
///
/// Glyphs which should not or cannot be spaced give
/// [`SpacingOutcome::Skipped`]; an `Err` means the input broke an invariant
/// the engine relies on.
pub fn compute_sidebearings(
    request: &GlyphSpacingRequest,
) -> Result<SpacingOutcome, SpacingError> {
    let glyph = request.name.to_string();
    let skip = |reason| Ok(SpacingOutcome::Skipped(reason));

    let Some(bounds) = request.outline.bounds() else {
        return skip(SkipReason::EmptyLayer { glyph });
    };
    if request.width_aligned {
        return skip(SkipReason::AlignedWidth { glyph });
    }
    if request.left_linked && request.right_linked {
        return skip(SkipReason::MetricKeys { glyph });
    }
    if request.name.contains(MANUAL_ONLY) {
        return skip(SkipReason::ManualOnly { glyph });
    }
    let params = &request.params;
    if let Err(e) = params.validate() {
        return skip(SkipReason::InvalidParameters {
            glyph,
            reason: e.to_string(),
        });
    }
    if !(request.factor.is_finite() && request.factor > 0.0) {
        return skip(SkipReason::InvalidParameters {
            glyph,
            reason: format!("rule factor must be positive, got {}", request.factor),
        });
    }

    let mut warnings = vec![];
    let (reference_name, reference_bounds) = match request.reference {
        Some(reference) => match reference.outline.bounds() {
            Some(ref_bounds) => (reference.name, ref_bounds),
            None => {
                let warning = format!(
                    "The reference glyph declared ({}) doesn't have contours. Glyph ({}) was spaced based on its own vertical range.",
                    reference.name, request.name
                );
                log::warn!("{}", warning);
                warnings.push(warning);
                (request.name, bounds)
            }
        },
        None => (request.name, bounds),
    };

    let zone = ReferenceZone::from_bounds(reference_bounds, params.overshoot_units());
    if zone.height() <= 0.0 {
        return skip(SkipReason::FlatReferenceZone {
            glyph,
            reference: reference_name.to_string(),
        });
    }
    log::debug!(
        "{}: reference {} zone {}..{} factor {}",
        request.name,
        reference_name,
        zone.min,
        zone.max,
        request.factor
    );

    let Some(profile) = build_margins(
        request.outline,
        bounds.min_y(),
        bounds.max_y(),
        params.italic_angle,
        zone,
        params.frequency,
    )?
    else {
        return skip(SkipReason::NoZoneMeasurement {
            glyph,
            reference: reference_name.to_string(),
            zone,
        });
    };

    let zoned = profile.restrict(zone);
    let mut full = (profile.left_points(), profile.right_points());
    let mut in_zone = (zoned.left_points(), zoned.right_points());
    if params.italic_angle != 0.0 {
        let pivot = params.x_height / 2.0;
        let upright = |points: &[Point]| deslant(points, params.italic_angle, pivot);
        full = (upright(&full.0), upright(&full.1));
        in_zone = (upright(&in_zone.0), upright(&in_zone.1));
    }

    let (full_left, full_right) = extremes(&full.0, &full.1)
        .ok_or_else(|| SpacingError::General(format!("{}: empty margin profile", request.name)))?;
    let (zone_left, zone_right) = extremes(&in_zone.0, &in_zone.1).ok_or_else(|| {
        SpacingError::General(format!("{}: empty reference zone profile", request.name))
    })?;

    let polygons = shape_counters(
        &in_zone.0,
        &in_zone.1,
        zone_left,
        zone_right,
        params.depth_units(),
        zone,
        params.frequency,
    );
    let left_area = polygon_area(&polygons.left);
    let right_area = polygon_area(&polygons.right);
    log::debug!(
        "{}: extremes {:?}/{:?} in zone, {:?}/{:?} overall; areas {} / {}",
        request.name,
        zone_left,
        zone_right,
        full_left,
        full_right,
        left_area,
        right_area
    );

    // Target white area for the zone, scaled to the em and the rule's factor
    let upm_scale = (params.units_per_em / 1000.0).powi(2);
    let target_area =
        zone.height() * params.area * upm_scale * request.factor * 100.0 / params.x_height;
    let sidebearing = |area: f64| (target_area - area) / zone.height();

    let distance_left = (zone_left.x - full_left.x).ceil();
    let distance_right = (full_right.x - zone_right.x).ceil();
    let mut left = (sidebearing(left_area) - distance_left).ceil();
    let mut right = (sidebearing(right_area) - distance_right).ceil();
    let mut width = None;

    if request.tabular {
        let fixed = request.tabular_width.unwrap_or(request.current.width);
        let shape_width = full_right.x - full_left.x;
        let difference = (fixed - (shape_width + left + right)) / 2.0;
        left += difference;
        right += difference;
        width = Some(fixed);
        log::info!("{} is tabular and adjusted at width = {}", request.name, fixed);
    } else {
        if request.left_linked || !request.sides.left() {
            left = request.current.lsb;
        }
        if request.right_linked || !request.sides.right() {
            right = request.current.rsb;
        }
    }

    log::info!(
        "{}: reference {} factor {}: LSB {} RSB {}",
        request.name,
        reference_name,
        request.factor,
        left,
        right
    );
    Ok(SpacingOutcome::Spaced(Sidebearings {
        left,
        right,
        width,
        reference: reference_name.to_string(),
        warnings,
    }))
}

/// Rounded mean of some advance widths
pub fn average_width(widths: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = widths
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), w| (sum + w, count + 1));
    (count > 0).then(|| (sum / count as f64).round())
}

/// Spaces glyphs of one master of a font
pub struct Spacer<'a> {
    font: &'a Font,
    master: &'a Master,
    params: MasterParameters,
    sides: Sides,
    tabular_width: Option<f64>,
}

impl<'a> Spacer<'a> {
    pub fn new(font: &'a Font, master_id: &str) -> Result<Self, SpacingError> {
        let master = font
            .master(master_id)
            .ok_or_else(|| SpacingError::MasterNotFound {
                master: master_id.to_string(),
            })?;
        Ok(Spacer {
            font,
            master,
            params: master.parameters(font.upm),
            sides: Sides::Both,
            tabular_width: None,
        })
    }

    pub fn with_sides(mut self, sides: Sides) -> Self {
        self.sides = sides;
        self
    }

    pub fn with_tabular_width(mut self, width: Option<f64>) -> Self {
        self.tabular_width = width;
        self
    }

    pub fn params(&self) -> &MasterParameters {
        &self.params
    }

    /// Space a single glyph of this master
    pub fn space_glyph(&self, name: &str) -> Result<SpacingOutcome, SpacingError> {
        let glyph = self
            .font
            .glyphs
            .get(name)
            .ok_or_else(|| SpacingError::GlyphNotFound {
                glyph: name.to_string(),
            })?;
        let Some(layer) = glyph.get_layer(&self.master.id) else {
            return Ok(SpacingOutcome::Skipped(SkipReason::NoLayer {
                glyph: name.to_string(),
                master: self.master.id.clone(),
            }));
        };
        let decomposed = layer.decomposed(self.font);
        let outline = decomposed.contours()?;

        let rule = find_rule(&self.font.rules, &glyph.class(), &self.master.rule_overrides);
        let factor = rule.as_ref().map_or(1.0, |r| r.factor);
        let reference_name = rule
            .and_then(|r| r.reference_glyph)
            .filter(|r| r.as_str() != name);

        let mut warnings = vec![];
        let reference_outline = match &reference_name {
            Some(reference) => match self.font.master_layer_for(reference, &self.master.id) {
                Some(ref_layer) => Some(ref_layer.decomposed(self.font).contours()?),
                None => {
                    let warning = format!(
                        "The reference glyph declared ({}) doesn't exist. Glyph {} was spaced based on its own vertical range.",
                        reference, name
                    );
                    log::warn!("{}", warning);
                    warnings.push(warning);
                    None
                }
            },
            None => None,
        };

        let mut request = GlyphSpacingRequest::new(
            name,
            &outline,
            CurrentMetrics {
                lsb: decomposed.lsb()?,
                rsb: decomposed.rsb()?,
                width: layer.width,
            },
            self.params,
        );
        request.width_aligned = layer.auto_aligned;
        request.left_linked = glyph.left_metrics_key.is_some();
        request.right_linked = glyph.right_metrics_key.is_some();
        request.tabular = glyph.is_tabular();
        request.tabular_width = self.tabular_width;
        request.sides = self.sides;
        request.factor = factor;
        request.reference = match (&reference_name, &reference_outline) {
            (Some(reference), Some(outline)) => Some(Reference {
                name: reference.as_str(),
                outline,
            }),
            _ => None,
        };

        let mut outcome = compute_sidebearings(&request)?;
        if let SpacingOutcome::Spaced(sidebearings) = &mut outcome {
            warnings.append(&mut sidebearings.warnings);
            sidebearings.warnings = warnings;
        }
        Ok(outcome)
    }
}
