//! Arena nodes of the partition tree.

use crate::{Edge, Plane2, PlaneSide};

/// Handle of a node inside a [`PolyShape`](super::PolyShape) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One splitting edge and the links to its neighbours in the arena.
///
/// Each node partitions the plane along the line of its splitter edge.
/// Children are stored as arena handles owned by the tree:
/// - `front`: subtree for the outside of the splitter. Absent means "empty".
/// - `back`: subtree for the inside of the splitter. Absent means "solid".
///
/// `parent` is a navigation link only; traversal always starts at the root.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// The edge whose line splits this node.
    edge: Edge,

    /// The splitter's plane, cached.
    plane: Plane2,

    front: Option<NodeId>,
    back: Option<NodeId>,
    parent: Option<NodeId>,
}

impl TreeNode {
    /// Creates a childless node split by `edge`.
    pub fn new(edge: Edge, parent: Option<NodeId>) -> Self {
        Self {
            edge,
            plane: edge.plane(),
            front: None,
            back: None,
            parent,
        }
    }

    #[inline]
    pub fn edge(&self) -> &Edge {
        &self.edge
    }

    #[inline]
    pub fn plane(&self) -> &Plane2 {
        &self.plane
    }

    #[inline]
    pub fn front(&self) -> Option<NodeId> {
        self.front
    }

    #[inline]
    pub fn back(&self) -> Option<NodeId> {
        self.back
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the child on `side`; only `Front` and `Back` have children.
    pub fn child(&self, side: PlaneSide) -> Option<NodeId> {
        match side {
            PlaneSide::Front => self.front,
            PlaneSide::Back => self.back,
            PlaneSide::On | PlaneSide::Both => None,
        }
    }

    #[inline]
    pub(crate) fn set_front(&mut self, node: Option<NodeId>) {
        self.front = node;
    }

    #[inline]
    pub(crate) fn set_back(&mut self, node: Option<NodeId>) {
        self.back = node;
    }

    /// True when neither side has a subtree.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }
}

/// Returns true if two planes face roughly the same direction.
#[inline]
pub fn faces_same_direction(a: &Plane2, b: &Plane2) -> bool {
    a.normal().dot(&b.normal()) > 0.0
}
