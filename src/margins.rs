//! Left and right margin profiles of an outline.
use kurbo::{Point, Rect};

use crate::{
    geometry::{margin_span, slant_offset, Outline},
    SpacingError,
};

/// The vertical interval which counts towards the white area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceZone {
    pub min: f64,
    pub max: f64,
}

impl ReferenceZone {
    /// The zone of a reference outline, grown by `overshoot` above and below
    pub fn from_bounds(bounds: Rect, overshoot: f64) -> Self {
        ReferenceZone {
            min: bounds.min_y() - overshoot,
            max: bounds.max_y() + overshoot,
        }
    }

    pub fn contains(&self, y: f64) -> bool {
        self.min <= y && y <= self.max
    }

    pub fn height(&self) -> f64 {
        self.max - self.min
    }
}

/// One sample of a margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginSample {
    /// The outline was crossed at this point
    Measured(Point),
    /// The outline was absent at this height; the point is projected from
    /// the slanted bounding box
    Synthesized(Point),
}

impl MarginSample {
    pub fn point(&self) -> Point {
        match self {
            MarginSample::Measured(p) | MarginSample::Synthesized(p) => *p,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, MarginSample::Measured(_))
    }
}

/// Samples of both margins, taken at the same heights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarginProfile {
    pub left: Vec<MarginSample>,
    pub right: Vec<MarginSample>,
}

impl MarginProfile {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn left_points(&self) -> Vec<Point> {
        self.left.iter().map(MarginSample::point).collect()
    }

    pub fn right_points(&self) -> Vec<Point> {
        self.right.iter().map(MarginSample::point).collect()
    }

    /// Only the samples whose height lies inside the zone
    pub fn restrict(&self, zone: ReferenceZone) -> MarginProfile {
        let keep = |side: &[MarginSample]| {
            side.iter()
                .filter(|s| zone.contains(s.point().y))
                .copied()
                .collect()
        };
        MarginProfile {
            left: keep(&self.left),
            right: keep(&self.right),
        }
    }
}

/// Sample the margins of `outline` every `step` units from `min_y` to `max_y`.
///
/// Where the ray misses the outline on a side, a position on the outline's
/// slanted bounding parallelogram is used instead: the right edge for the left
/// margin and the left edge for the right margin, so that a missing sample is
/// as deep as it can be.
///
/// Returns `Ok(None)` if no measured sample lies inside `zone`; the outline
/// then has nothing to say about the white space in the reference zone.
pub fn build_margins(
    outline: &dyn Outline,
    min_y: f64,
    max_y: f64,
    angle: f64,
    zone: ReferenceZone,
    step: f64,
) -> Result<Option<MarginProfile>, SpacingError> {
    if !(step.is_finite() && step > 0.0) {
        return Err(SpacingError::InvalidParameter {
            name: "paramFreq",
            reason: format!("sampling step must be positive, got {step}"),
        });
    }
    if !(min_y.is_finite() && max_y.is_finite()) || min_y > max_y {
        return Err(SpacingError::General(format!(
            "Bad vertical extent {min_y}..{max_y} for margin sampling"
        )));
    }
    let Some(bounds) = outline.bounds() else {
        return Ok(None);
    };

    let origin = bounds.min_x();
    // Width of the top side of the slanted bounding parallelogram
    let default_depth = bounds.max_x() - (slant_offset(angle, bounds.max_y()) + origin);

    let mut profile = MarginProfile::default();
    let mut in_zone = false;
    let mut y = min_y;
    while y <= max_y {
        let measured = margin_span(&outline.intersections(y));
        let slant_right = origin + slant_offset(angle, y);
        let slant_left = slant_right + default_depth;

        match measured {
            Some((left, right)) => {
                profile.left.push(MarginSample::Measured(Point::new(left, y)));
                profile
                    .right
                    .push(MarginSample::Measured(Point::new(right, y)));
                in_zone |= zone.contains(y);
            }
            None => {
                profile
                    .left
                    .push(MarginSample::Synthesized(Point::new(slant_left, y)));
                profile
                    .right
                    .push(MarginSample::Synthesized(Point::new(slant_right, y)));
            }
        }
        y += step;
    }

    Ok(in_zone.then_some(profile))
}

/// The leftmost point of `left` and the rightmost point of `right`
pub fn extremes(left: &[Point], right: &[Point]) -> Option<(Point, Point)> {
    let l = left.iter().copied().min_by(|a, b| a.x.total_cmp(&b.x))?;
    let r = right.iter().copied().max_by(|a, b| a.x.total_cmp(&b.x))?;
    Some((l, r))
}
