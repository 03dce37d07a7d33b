use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum NodeType {
    Move,
    Line,
    OffCurve,
    Curve,
    QCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub nodetype: NodeType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub smooth: bool,
}

impl Node {
    pub fn new_line(x: f64, y: f64) -> Self {
        Node {
            x,
            y,
            nodetype: NodeType::Line,
            smooth: false,
        }
    }

    pub fn new_offcurve(x: f64, y: f64) -> Self {
        Node {
            x,
            y,
            nodetype: NodeType::OffCurve,
            smooth: false,
        }
    }

    pub fn new_curve(x: f64, y: f64) -> Self {
        Node {
            x,
            y,
            nodetype: NodeType::Curve,
            smooth: true,
        }
    }

    pub fn to_kurbo(&self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    /// Move the node by `(dx, dy)`
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}
