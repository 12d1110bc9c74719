//! Depth-annotated visitors over the nodes of a [`PolyShape`](crate::PolyShape).
//!
//! Visitors see every splitter node in pre-order during a walk of a
//! [`PolyShape`](super::PolyShape) without coupling traversal to a use case.

use crate::Edge;

use super::node::TreeNode;

/// Visitor for processing nodes during BSP tree traversal.
///
/// Nodes are visited in pre-order: a node, then its front subtree, then its
/// back subtree. `depth` is 1 for the root.
pub trait TreeVisitor {
    fn visit(&mut self, node: &TreeNode, depth: usize);
}

/// A simple visitor that collects every splitter edge.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<Edge>,
}

impl CollectingVisitor {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected edges.
    pub fn into_edges(self) -> Vec<Edge> {
        self.collected
    }

    pub fn edges(&self) -> &[Edge] {
        &self.collected
    }
}

impl TreeVisitor for CollectingVisitor {
    fn visit(&mut self, node: &TreeNode, _depth: usize) {
        self.collected.push(*node.edge());
    }
}

/// A visitor that calls a closure for each node.
pub struct FnVisitor<F>
where
    F: FnMut(&TreeNode, usize),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(&TreeNode, usize),
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> TreeVisitor for FnVisitor<F>
where
    F: FnMut(&TreeNode, usize),
{
    fn visit(&mut self, node: &TreeNode, depth: usize) {
        (self.func)(node, depth);
    }
}
