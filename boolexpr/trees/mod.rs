//! Expression trees and the rewrites defined on them.
pub mod node;
pub mod rewrites;

pub use crate::trees::node::{render, ExpressionTreeNode, NodeKind, NodeRef};
