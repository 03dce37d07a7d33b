//! Geometric primitives used by the spacing engine.
//!
//! Everything here is a pure function of its inputs. Outlines are only ever
//! seen through the [`Outline`] capability, so hosts can plug in their own
//! intersection code.
use kurbo::{BezPath, Line, ParamCurve, PathSeg, Point, Rect, Shape as _};
use ordered_float::OrderedFloat;

/// Something a horizontal ray can be cast through
pub trait Outline {
    /// The bounding box of the outline, or `None` if it has no contours
    fn bounds(&self) -> Option<Rect>;

    /// X positions where a horizontal ray at height `y` crosses the outline.
    ///
    /// The ray runs from one unit left of the bounding box to one unit right
    /// of it, and the returned list is sorted and framed by the ray's own
    /// start and end points, so a ray which misses returns two entries.
    /// A ray through a vertex shared by two segments may report that vertex
    /// twice; callers only rely on the first and last crossings.
    fn intersections(&self, y: f64) -> Vec<f64>;
}

/// A set of decomposed contours
#[derive(Debug, Clone, Default)]
pub struct Contours {
    paths: Vec<BezPath>,
    bounds: Option<Rect>,
}

impl Contours {
    pub fn new(paths: Vec<BezPath>) -> Self {
        let bounds = paths
            .iter()
            .filter(|p| p.segments().next().is_some())
            .map(|p| p.bounding_box())
            .reduce(|accum, item| accum.union(item));
        Contours { paths, bounds }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }
}

impl Outline for Contours {
    fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    fn intersections(&self, y: f64) -> Vec<f64> {
        let Some(bounds) = self.bounds else {
            return vec![];
        };
        let ray = Line::new((bounds.min_x() - 1.0, y), (bounds.max_x() + 1.0, y));
        let mut hits = vec![ray.p0.x];
        for path in &self.paths {
            for seg in path.segments() {
                match seg {
                    PathSeg::Line(line) => hits.extend(line_crossing(line, y)),
                    curve => hits.extend(
                        curve
                            .intersect_line(ray)
                            .into_iter()
                            .map(|hit| curve.eval(hit.segment_t).x),
                    ),
                }
            }
        }
        hits.push(ray.p1.x);
        hits.sort_by_key(|x| OrderedFloat(*x));
        hits
    }
}

// Straight segments are solved directly so that vertical stems give exact
// positions. Both endpoints count; horizontal segments never cross.
fn line_crossing(line: Line, y: f64) -> Option<f64> {
    let (p0, p1) = (line.p0, line.p1);
    if p0.y == p1.y || y < p0.y.min(p1.y) || y > p0.y.max(p1.y) {
        return None;
    }
    Some(p0.x + (y - p0.y) * (p1.x - p0.x) / (p1.y - p0.y))
}

/// Area of a polygon given as a cyclic list of points (shoelace formula)
///
/// Collinear or repeated points contribute nothing; fewer than three points
/// give zero.
pub fn polygon_area(points: &[Point]) -> f64 {
    let Some(last) = points.last() else {
        return 0.0;
    };
    let mut previous = last;
    let mut sum = 0.0;
    for point in points {
        sum += previous.x * point.y - point.x * previous.y;
        previous = point;
    }
    sum.abs() * 0.5
}

/// The left and right margin positions from a sorted, framed intersection list
///
/// The first and last entries are the ray's endpoints; the next entries in
/// from each end are the outline's outermost crossings. `None` means the ray
/// did not meet the outline at this height.
pub fn margin_span(hits: &[f64]) -> Option<(f64, f64)> {
    match hits {
        [_, left, .., right, _] => Some((*left, *right)),
        [_, only, _] => Some((*only, *only)),
        _ => None,
    }
}

/// Horizontal offset of a line slanted by `angle` degrees at height `y`
pub fn slant_offset(angle: f64, y: f64) -> f64 {
    y * angle.to_radians().tan()
}

/// Shear points upright, pivoting around the height `pivot_y`
///
/// `x' = x - (y - pivot_y) * tan(angle)`; heights are unchanged.
pub fn deslant(points: &[Point], angle: f64, pivot_y: f64) -> Vec<Point> {
    let tan = angle.to_radians().tan();
    points
        .iter()
        .map(|p| Point::new(p.x - (p.y - pivot_y) * tan, p.y))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::Path;
    use rstest::rstest;

    fn contours(paths: &[Path]) -> Contours {
        Contours::new(paths.iter().map(|p| p.to_kurbo().unwrap()).collect())
    }

    #[test]
    fn test_square_area() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(polygon_area(&square), 100.0);
        let mut reversed = square;
        reversed.reverse();
        assert_eq!(polygon_area(&reversed), 100.0);
    }

    #[test]
    fn test_degenerate_area() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[Point::new(3.0, 4.0)]), 0.0);
        let collinear = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(0.0, 5.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(polygon_area(&collinear), 0.0);
    }

    #[test]
    fn test_margin_span() {
        assert_eq!(margin_span(&[-1.0, 101.0]), None);
        assert_eq!(margin_span(&[]), None);
        assert_eq!(margin_span(&[-1.0, 50.0, 101.0]), Some((50.0, 50.0)));
        assert_eq!(
            margin_span(&[-1.0, 10.0, 30.0, 70.0, 90.0, 101.0]),
            Some((10.0, 90.0))
        );
    }

    #[test]
    fn test_rectangle_intersections() {
        let outline = contours(&[Path::rect(50.0, 0.0, 450.0, 500.0)]);
        assert_eq!(outline.bounds(), Some(Rect::new(50.0, 0.0, 450.0, 500.0)));
        let hits = outline.intersections(250.0);
        assert_eq!(hits, vec![49.0, 50.0, 450.0, 451.0]);
        // Corners are met by both edges
        assert_eq!(margin_span(&outline.intersections(0.0)), Some((50.0, 450.0)));
        assert_eq!(margin_span(&outline.intersections(500.0)), Some((50.0, 450.0)));
        assert_eq!(margin_span(&hits), Some((50.0, 450.0)));
        assert_eq!(margin_span(&outline.intersections(600.0)), None);
    }

    #[test]
    fn test_shared_vertex() {
        let diamond = contours(&[Path::polygon(&[
            (0.0, 50.0),
            (50.0, 100.0),
            (100.0, 50.0),
            (50.0, 0.0),
        ])]);
        // Both segments meeting at each side vertex report it
        let hits = diamond.intersections(50.0);
        assert_eq!(hits, vec![-1.0, 0.0, 0.0, 100.0, 100.0, 101.0]);
        assert_eq!(margin_span(&hits), Some((0.0, 100.0)));
    }

    #[test]
    fn test_ring_takes_outer_crossings() {
        let outline = contours(&[
            Path::rect(0.0, 0.0, 300.0, 300.0),
            Path::polygon(&[(100.0, 100.0), (100.0, 200.0), (200.0, 200.0), (200.0, 100.0)]),
        ]);
        let hits = outline.intersections(150.0);
        assert_eq!(hits.len(), 6);
        assert_eq!(margin_span(&hits), Some((0.0, 300.0)));
    }

    #[test]
    fn test_curve_crossing() {
        let mut bez = BezPath::new();
        bez.move_to((0.0, 0.0));
        bez.curve_to((0.0, 55.0), (45.0, 100.0), (100.0, 100.0));
        bez.line_to((100.0, 0.0));
        bez.close_path();
        let outline = Contours::new(vec![bez]);
        let (left, right) = margin_span(&outline.intersections(50.0)).unwrap();
        assert!(left > 0.0 && left < 50.0, "left crossing was {left}");
        assert_eq!(right, 100.0);
    }

    #[test]
    fn test_empty_outline() {
        let outline = Contours::new(vec![]);
        assert!(outline.is_empty());
        assert!(outline.intersections(0.0).is_empty());
    }

    #[rstest]
    #[case(250.0, 0.0)]
    #[case(0.0, 250.0 * 12f64.to_radians().tan())]
    #[case(500.0, -250.0 * 12f64.to_radians().tan())]
    fn test_deslant_shift(#[case] y: f64, #[case] shift: f64) {
        let out = deslant(&[Point::new(100.0, y)], 12.0, 250.0);
        assert!((out[0].x - (100.0 + shift)).abs() < 1e-9);
        assert_eq!(out[0].y, y);
    }

    #[test]
    fn test_slant_offset() {
        assert_eq!(slant_offset(0.0, 700.0), 0.0);
        assert!((slant_offset(45.0, 100.0) - 100.0).abs() < 1e-9);
    }
}
