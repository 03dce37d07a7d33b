//! Turning zone-restricted margins into closed counter polygons.
use kurbo::Point;

use crate::margins::ReferenceZone;

/// Closed polygons enclosing the white space on each side of a glyph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterPolygons {
    pub left: Vec<Point>,
    pub right: Vec<Point>,
}

/// Shape both margins into closed counter polygons.
///
/// `depth` is the deepest a counter may reach in from its extreme, in font
/// units. The steps are applied in order: depth clamp, padding to the full
/// zone, 45° smoothing, closing against the vertical through the extreme.
pub fn shape_counters(
    left: &[Point],
    right: &[Point],
    left_extreme: Point,
    right_extreme: Point,
    depth: f64,
    zone: ReferenceZone,
    step: f64,
) -> CounterPolygons {
    let max_depth = left_extreme.x + depth;
    let min_depth = right_extreme.x - depth;
    let mut left: Vec<Point> = left
        .iter()
        .map(|p| Point::new(p.x.min(max_depth), p.y))
        .collect();
    let mut right: Vec<Point> = right
        .iter()
        .map(|p| Point::new(p.x.max(min_depth), p.y))
        .collect();

    pad_to_zone(&mut left, &mut right, max_depth, min_depth, zone, step);
    diagonize(&mut left, &mut right);

    CounterPolygons {
        left: close_counter(left, left_extreme.x, zone),
        right: close_counter(right, right_extreme.x, zone),
    }
}

// A glyph shorter than the zone is extended with samples at full depth.
fn pad_to_zone(
    left: &mut Vec<Point>,
    right: &mut Vec<Point>,
    max_depth: f64,
    min_depth: f64,
    zone: ReferenceZone,
    step: f64,
) {
    let (Some(first), Some(last)) = (left.first().copied(), left.last().copied()) else {
        return;
    };
    if step.is_nan() || step <= 0.0 {
        return;
    }

    let mut below_l = vec![];
    let mut below_r = vec![];
    let mut y = first.y - step;
    while y > zone.min {
        below_l.push(Point::new(max_depth, y));
        below_r.push(Point::new(min_depth, y));
        y -= step;
    }
    below_l.reverse();
    below_r.reverse();
    left.splice(0..0, below_l);
    right.splice(0..0, below_r);

    let mut y = last.y + step;
    while y < zone.max {
        left.push(Point::new(max_depth, y));
        right.push(Point::new(min_depth, y));
        y += step;
    }
}

/// Limit the slope between neighbouring samples to 45°.
///
/// Walks up and then down each margin; whenever a neighbour sits further into
/// the glyph than the height between them, it is pulled back onto the
/// diagonal. Left margins are limited towards increasing x, right margins
/// towards decreasing x.
pub fn diagonize(left: &mut [Point], right: &mut [Point]) {
    let pairs = left.len().min(right.len()).saturating_sub(1);
    for i in 0..pairs {
        let ystep = (left[i + 1].y - left[i].y).abs();
        if left[i + 1].x - left[i].x > ystep {
            left[i + 1].x = left[i].x + ystep;
        }
        if right[i + 1].x - right[i].x < -ystep {
            right[i + 1].x = right[i].x - ystep;
        }
    }
    for i in (0..pairs).rev() {
        let ystep = (left[i + 1].y - left[i].y).abs();
        if left[i].x - left[i + 1].x > ystep {
            left[i].x = left[i + 1].x + ystep;
        }
        if right[i].x - right[i + 1].x < -ystep {
            right[i].x = right[i + 1].x - ystep;
        }
    }
}

fn close_counter(mut margin: Vec<Point>, extreme_x: f64, zone: ReferenceZone) -> Vec<Point> {
    margin.insert(0, Point::new(extreme_x, zone.min));
    margin.push(Point::new(extreme_x, zone.max));
    margin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon_area;
    use pretty_assertions::assert_eq;

    fn column(x: f64, from: f64, to: f64, step: f64) -> Vec<Point> {
        let mut points = vec![];
        let mut y = from;
        while y <= to {
            points.push(Point::new(x, y));
            y += step;
        }
        points
    }

    const ZONE: ReferenceZone = ReferenceZone {
        min: 0.0,
        max: 500.0,
    };

    #[test]
    fn test_short_glyph_is_padded_and_smoothed() {
        let left = column(200.0, 0.0, 100.0, 5.0);
        let right = column(300.0, 0.0, 100.0, 5.0);
        let polygons = shape_counters(
            &left,
            &right,
            Point::new(200.0, 0.0),
            Point::new(300.0, 0.0),
            60.0,
            ZONE,
            5.0,
        );
        // 21 samples, 79 padding samples (105..=495), 2 closing points
        assert_eq!(polygons.left.len(), 102);
        assert_eq!(polygons.left[0], Point::new(200.0, 0.0));
        assert_eq!(polygons.left[101], Point::new(200.0, 500.0));
        // The padded wall climbs at 45° from the top of the glyph
        assert_eq!(polygons.left[22], Point::new(205.0, 105.0));
        assert_eq!(polygons.left[33], Point::new(260.0, 160.0));
        assert_eq!(polygons.right[22], Point::new(295.0, 105.0));
        assert_eq!(polygon_area(&polygons.left), 22050.0);
        assert_eq!(polygon_area(&polygons.right), 22050.0);
    }

    #[test]
    fn test_padding_below() {
        let left = column(0.0, 200.0, 300.0, 10.0);
        let right = column(100.0, 200.0, 300.0, 10.0);
        let zone = ReferenceZone {
            min: 170.0,
            max: 300.0,
        };
        let polygons = shape_counters(
            &left,
            &right,
            Point::new(0.0, 200.0),
            Point::new(100.0, 200.0),
            40.0,
            zone,
            10.0,
        );
        // 190 and 180 are added; 170 is the zone edge itself
        let heights: Vec<f64> = polygons.left.iter().take(4).map(|p| p.y).collect();
        assert_eq!(heights, vec![170.0, 180.0, 190.0, 200.0]);
        assert_eq!(polygons.left[1].x, 20.0);
        assert_eq!(polygons.left[2].x, 10.0);
    }

    #[test]
    fn test_depth_clamp_bound() {
        let left: Vec<Point> = (0..=100)
            .map(|i| Point::new(if i % 7 == 0 { 400.0 } else { 30.0 + i as f64 }, i as f64 * 5.0))
            .collect();
        let right: Vec<Point> = (0..=100)
            .map(|i| Point::new(if i % 5 == 0 { 0.0 } else { 470.0 - i as f64 }, i as f64 * 5.0))
            .collect();
        let depth = 500.0 * 12.0 / 100.0;
        let polygons = shape_counters(
            &left,
            &right,
            Point::new(30.0, 0.0),
            Point::new(470.0, 0.0),
            depth,
            ZONE,
            5.0,
        );
        let n = polygons.left.len();
        for p in &polygons.left[1..n - 1] {
            assert!((p.x - 30.0).abs() <= depth, "{p:?} is too deep");
        }
        let n = polygons.right.len();
        for p in &polygons.right[1..n - 1] {
            assert!((p.x - 470.0).abs() <= depth, "{p:?} is too deep");
        }
    }

    #[test]
    fn test_diagonize_both_directions() {
        let mut left = vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 5.0),
            Point::new(0.0, 10.0),
        ];
        let mut right = vec![
            Point::new(100.0, 0.0),
            Point::new(100.0, 5.0),
            Point::new(40.0, 10.0),
        ];
        diagonize(&mut left, &mut right);
        assert_eq!(left[1].x, 5.0);
        assert_eq!(right[2].x, 95.0);
    }
}
