mod node;
pub use node::{Node, NodeType};
