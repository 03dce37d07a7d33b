use crate::{
    common::{Node, NodeType},
    SpacingError,
};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A component in a glyph
pub struct Component {
    /// The referenced glyph name
    pub reference: SmolStr,
    /// The transformation applied to the component
    #[serde(default = "kurbo::Affine::default")]
    pub transform: kurbo::Affine,
}

impl Component {
    pub fn new(reference: impl Into<SmolStr>, transform: kurbo::Affine) -> Self {
        Component {
            reference: reference.into(),
            transform,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// A path in a glyph
pub struct Path {
    /// A list of nodes in the path
    pub nodes: Vec<Node>,
    /// Whether the path is closed
    pub closed: bool,
}

impl Path {
    /// A closed path of straight lines through the given points
    pub fn polygon(points: &[(f64, f64)]) -> Self {
        Path {
            nodes: points.iter().map(|&(x, y)| Node::new_line(x, y)).collect(),
            closed: true,
        }
    }

    /// A closed axis-aligned rectangle
    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Path::polygon(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    /// Converts the `Path` to a [`kurbo::BezPath`].
    pub fn to_kurbo(&self) -> Result<kurbo::BezPath, SpacingError> {
        let mut path = kurbo::BezPath::new();
        let mut offs = std::collections::VecDeque::new();
        let rotate = if self.closed {
            self.nodes
                .iter()
                .rev()
                .position(|pt| pt.nodetype != NodeType::OffCurve)
                .map(|idx| self.nodes.len() - 1 - idx)
                .unwrap_or(0)
        } else {
            0
        };
        let mut nodes = self
            .nodes
            .iter()
            .cycle()
            .skip(rotate)
            .take(self.nodes.len());
        // All kurbo paths (even closed ones) must start with a move_to
        let start = nodes.next().map(|n| n.to_kurbo());
        if let Some(start) = start {
            path.move_to(start);
        }
        for pt in nodes {
            let kurbo_point = pt.to_kurbo();
            match pt.nodetype {
                NodeType::Move => path.move_to(kurbo_point),
                NodeType::Line => path.line_to(kurbo_point),
                NodeType::OffCurve => offs.push_back(kurbo_point),
                NodeType::Curve => {
                    match offs.make_contiguous() {
                        [] => return Err(SpacingError::BadPath),
                        [p1] => path.quad_to(*p1, kurbo_point),
                        [p1, p2] => path.curve_to(*p1, *p2, kurbo_point),
                        _ => return Err(SpacingError::BadPath),
                    };
                    offs.clear();
                }
                NodeType::QCurve => {
                    while let Some(pt) = offs.pop_front() {
                        if let Some(next) = offs.front() {
                            let implied_point = pt.midpoint(*next);
                            path.quad_to(pt, implied_point);
                        } else {
                            path.quad_to(pt, kurbo_point);
                        }
                    }
                    offs.clear();
                }
            }
        }
        // Off-curves trailing the last on-curve node lead back to the start
        if let (true, Some(start)) = (self.closed, start) {
            match offs.make_contiguous() {
                [] => {}
                [p1] => path.quad_to(*p1, start),
                [p1, p2] => path.curve_to(*p1, *p2, start),
                _ => return Err(SpacingError::BadPath),
            }
        }
        if self.closed {
            path.close_path()
        }
        Ok(path)
    }

    pub(crate) fn transformed(&self, transform: kurbo::Affine) -> Path {
        Path {
            nodes: self
                .nodes
                .iter()
                .map(|node| {
                    let new_point = transform * node.to_kurbo();
                    Node {
                        x: new_point.x,
                        y: new_point.y,
                        nodetype: node.nodetype,
                        smooth: node.smooth,
                    }
                })
                .collect(),
            closed: self.closed,
        }
    }
}

/// A shape in a glyph, either a component or a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shape {
    /// A component in a glyph
    Component(Component),
    /// A path in a glyph
    Path(Path),
}

impl Shape {
    /// Move the shape horizontally
    pub(crate) fn shift_x(&mut self, dx: f64) {
        match self {
            Shape::Path(p) => p.nodes.iter_mut().for_each(|n| n.translate(dx, 0.0)),
            Shape::Component(c) => {
                c.transform = kurbo::Affine::translate((dx, 0.0)) * c.transform;
            }
        }
    }
}
