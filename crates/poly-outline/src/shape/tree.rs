//! BSP tree container, construction and CSG queries.

use std::fmt;

use nalgebra::Point2;
use tracing::{debug, instrument, trace};

use crate::config::MAX_TREE_DEPTH;
use crate::{Box2, Cuttable, Edge, GeometryError, PlaneSide, Polygon};

use super::node::{NodeId, TreeNode, faces_same_direction};
use super::selector::{BalancedSplitter, SplitterSelector};
use super::visitor::TreeVisitor;

/// A 2D solid region stored as a BSP tree of edges.
///
/// Each node splits the plane along the line of one edge. The front of an
/// edge is the outside of the region: an absent front child is empty space,
/// an absent back child is solid. The region is never intersected explicitly;
/// union and clipping both work by pushing polygons down the tree.
///
/// Nodes live in an arena owned by the shape and refer to each other by
/// [`NodeId`]. The tree only grows.
///
/// # Construction
///
/// ```ignore
/// use poly_outline::{PolyShape, Polygon};
/// use nalgebra::Point2;
///
/// let mut shape = PolyShape::new();
/// shape.add_overlapping_polygons(&polygons, true)?;
/// let boundary = shape.to_polygons();
/// ```
#[derive(Debug, Clone)]
pub struct PolyShape<S: SplitterSelector = BalancedSplitter> {
    nodes: Vec<TreeNode>,
    root: Option<NodeId>,
    bbox: Option<Box2>,
    selector: S,
    max_depth: usize,
}

/// Outcome of clipping a polygon against a subtree.
enum Clipped {
    /// The polygon survived untouched.
    Kept,
    /// The polygon was split or removed; these are the survivors.
    Pieces(Vec<Polygon>),
}

impl PolyShape {
    /// Creates an empty shape using the [`BalancedSplitter`].
    pub fn new() -> Self {
        Self::with_selector(BalancedSplitter)
    }

    /// Builds a shape from a set of edges in one pass.
    pub fn from_edges(edges: &[Edge]) -> Result<Self, GeometryError> {
        let mut shape = Self::new();
        shape.add_edges(edges)?;
        Ok(shape)
    }

    /// Builds a shape from the edges of all `polygons` at once.
    ///
    /// The polygons are reoriented counter-clockwise. Together they should
    /// describe the boundary of a single region, e.g. one concave loop; use
    /// [`PolyShape::add_overlapping_polygons`] to union overlapping shapes.
    pub fn from_polygons(polygons: &[Polygon]) -> Result<Self, GeometryError> {
        let edges: Vec<Edge> = polygons
            .iter()
            .enumerate()
            .flat_map(|(i, p)| Edge::edges_from_polygon(&p.to_counter_clockwise(), Some(i)))
            .collect();
        Self::from_edges(&edges)
    }
}

impl Default for PolyShape {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SplitterSelector> PolyShape<S> {
    /// Creates an empty shape with a custom splitter strategy.
    pub fn with_selector(selector: S) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            bbox: None,
            selector,
            max_depth: MAX_TREE_DEPTH,
        }
    }

    /// Overrides the recursion bound used while building and inserting.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns `true` if no edges have been added yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Bounds of every edge ever added, including edges dropped as redundant.
    #[inline]
    pub fn bounding_box(&self) -> Option<Box2> {
        self.bbox
    }

    /// Returns the maximum depth of the tree (0 for empty tree).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        self.for_each_node(|_, depth| deepest = deepest.max(depth));
        deepest
    }

    /// Number of ancestors of `id` plus one, following parent links.
    pub fn node_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).map(|_| id);
        while let Some(node_id) = current {
            depth += 1;
            current = self.nodes[node_id.0].parent();
        }
        depth
    }

    /// Visits every node in pre-order (node, front subtree, back subtree).
    pub fn traverse<V: TreeVisitor>(&self, visitor: &mut V) {
        self.for_each_node(|node, depth| visitor.visit(node, depth));
    }

    fn for_each_node(&self, mut f: impl FnMut(&TreeNode, usize)) {
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id.0];
            f(node, depth);
            if let Some(back) = node.back() {
                stack.push((back, depth + 1));
            }
            if let Some(front) = node.front() {
                stack.push((front, depth + 1));
            }
        }
    }

    /// Adds edges to the region.
    ///
    /// An empty tree is built from `edges` directly. Otherwise each edge is
    /// pushed down the tree: edges reaching an absent front child are built
    /// into a new subtree there, edges reaching an absent back child are
    /// dropped because that region is already solid.
    ///
    /// On error the tree is left exactly as it was before the call.
    #[instrument(level = "debug", skip_all, fields(edges = edges.len()))]
    pub fn add_edges(&mut self, edges: &[Edge]) -> Result<(), GeometryError> {
        if edges.is_empty() {
            return Ok(());
        }

        let checkpoint = self.nodes.len();
        let result = match self.root {
            None => self.build(edges, None, 1).map(|root| {
                self.root = Some(root);
            }),
            Some(root) => self.insert_edges(root, edges, 1),
        };

        if let Err(err) = result {
            self.rollback(checkpoint);
            debug!(%err, "edge insertion failed, tree restored");
            return Err(err);
        }

        for edge in edges {
            self.extend_bbox(edge);
        }
        debug!(nodes = self.nodes.len(), "edges added");
        Ok(())
    }

    /// Adds each polygon's edges, one polygon at a time.
    ///
    /// Polygons are reoriented counter-clockwise first. On error none of
    /// `polygons` is kept.
    pub fn add_polygons(&mut self, polygons: &[Polygon]) -> Result<(), GeometryError> {
        self.all_or_nothing(|shape| {
            for (i, polygon) in polygons.iter().enumerate() {
                let edges = Edge::edges_from_polygon(&polygon.to_counter_clockwise(), Some(i));
                shape.add_edges(&edges)?;
            }
            Ok(())
        })
    }

    /// Unions possibly overlapping polygons into the region.
    ///
    /// When the tree is empty the first polygon seeds it. Every other polygon
    /// is clipped against the current tree and only the surviving fragments
    /// are added, each fragment on its own. With `additive` set the part
    /// already inside the region is removed; otherwise the part outside is.
    ///
    /// On error the tree is left as it was before the call, including the
    /// seed and any fragments already inserted.
    #[instrument(level = "debug", skip_all, fields(polygons = polygons.len(), additive = additive))]
    pub fn add_overlapping_polygons(
        &mut self,
        polygons: &[Polygon],
        additive: bool,
    ) -> Result<(), GeometryError> {
        let side_to_delete = if additive {
            PlaneSide::Back
        } else {
            PlaneSide::Front
        };

        self.all_or_nothing(|shape| {
            let mut seeded = 0;
            if let Some(first) = polygons.first().filter(|_| shape.is_empty()) {
                let edges = Edge::edges_from_polygon(&first.to_counter_clockwise(), Some(0));
                shape.add_edges(&edges)?;
                seeded = 1;
            }

            for (i, polygon) in polygons.iter().enumerate().skip(seeded) {
                let fragments = shape.clip(&polygon.to_counter_clockwise(), side_to_delete);
                trace!(polygon = i, fragments = fragments.len(), "clipped against tree");
                for fragment in &fragments {
                    shape.add_edges(&Edge::edges_from_polygon(fragment, Some(i)))?;
                }
            }
            Ok(())
        })
    }

    /// Returns `true` if `p` lies inside the region.
    ///
    /// Points exactly on a splitter line go to the back side.
    pub fn point_inside(&self, p: Point2<f32>) -> bool {
        let Some(mut id) = self.root else {
            return false;
        };

        loop {
            let node = &self.nodes[id.0];
            let next = if node.plane().signed_distance(p) > 0.0 {
                match node.front() {
                    Some(front) => front,
                    None => return false,
                }
            } else {
                match node.back() {
                    Some(back) => back,
                    None => return true,
                }
            };
            id = next;
        }
    }

    /// Clips `polygon` against the region, deleting the parts on `side_to_delete`.
    ///
    /// `Front` removes what lies outside the region, `Back` what lies inside.
    /// A polygon that survives whole is returned unchanged; polygons
    /// degenerate against a splitter are dropped.
    ///
    /// # Errors
    /// Returns [`GeometryError::InvalidSide`] unless the side is `Front` or `Back`.
    pub fn clip_polygon(
        &self,
        polygon: &Polygon,
        side_to_delete: PlaneSide,
    ) -> Result<Vec<Polygon>, GeometryError> {
        match side_to_delete {
            PlaneSide::Front | PlaneSide::Back => Ok(self.clip(polygon, side_to_delete)),
            other => Err(GeometryError::InvalidSide(other)),
        }
    }

    /// Returns `true` if any part of `polygon` lies inside the region.
    pub fn polygon_inside(&self, polygon: &Polygon) -> bool {
        !self.clip(polygon, PlaneSide::Front).is_empty()
    }

    /// Returns `true` if none of `polygons` has a part inside the region.
    pub fn polygons_outside(&self, polygons: &[Polygon]) -> bool {
        !polygons.iter().any(|p| self.polygon_inside(p))
    }

    /// Returns `true` if some piece of `polygon` reaches a solid leaf.
    ///
    /// Unlike [`PolyShape::polygon_inside`] this never drops pieces that are
    /// degenerate against a splitter, so touching along an edge can count.
    pub fn is_touching(&self, polygon: &Polygon) -> bool {
        self.root.is_some_and(|root| self.touches(root, polygon))
    }

    /// Extracts the region's boundary as a flat list of polygons.
    ///
    /// Clips the quad of the accumulated bounding box, removing the outside.
    #[instrument(level = "debug", skip_all)]
    pub fn to_polygons(&self) -> Vec<Polygon> {
        let Some(bbox) = self.bbox else {
            return Vec::new();
        };
        let polygons = self.clip(&Polygon::quad(&bbox), PlaneSide::Front);
        debug!(count = polygons.len(), "extracted boundary polygons");
        polygons
    }

    /// Deep-copies the subtree rooted at `id` into a new shape.
    ///
    /// Parent links in the copy point into the copy; the new root has none.
    pub fn subtree(&self, id: NodeId) -> Option<Self>
    where
        S: Clone,
    {
        self.node(id)?;
        let mut shape = Self::with_selector(self.selector.clone()).with_max_depth(self.max_depth);
        let root = shape.copy_subtree(self, id, None);
        shape.root = Some(root);
        Some(shape)
    }

    fn copy_subtree(&mut self, source: &Self, id: NodeId, parent: Option<NodeId>) -> NodeId {
        let node = &source.nodes[id.0];
        let edge = *node.edge();
        self.extend_bbox(&edge);
        let copy = self.push_node(TreeNode::new(edge, parent));

        if let Some(front) = node.front() {
            let child = self.copy_subtree(source, front, Some(copy));
            self.nodes[copy.0].set_front(Some(child));
        }
        if let Some(back) = node.back() {
            let child = self.copy_subtree(source, back, Some(copy));
            self.nodes[copy.0].set_back(Some(child));
        }
        copy
    }

    fn push_node(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn extend_bbox(&mut self, edge: &Edge) {
        let bbox = self.bbox.get_or_insert_with(|| Box2::from_point(edge.a));
        bbox.extend(edge.a);
        bbox.extend(edge.b);
    }

    /// Runs `f`, restoring the nodes and bounds it started with if it fails.
    fn all_or_nothing(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), GeometryError>,
    ) -> Result<(), GeometryError> {
        let checkpoint = self.nodes.len();
        let bbox = self.bbox;
        let result = f(self);
        if result.is_err() {
            self.rollback(checkpoint);
            self.bbox = bbox;
        }
        result
    }

    /// Drops every node created after `checkpoint` and the links to them.
    ///
    /// Building and inserting only append nodes and fill absent child slots,
    /// so this restores the earlier tree exactly.
    fn rollback(&mut self, checkpoint: usize) {
        self.nodes.truncate(checkpoint);
        for node in &mut self.nodes {
            if node.front().is_some_and(|id| id.0 >= checkpoint) {
                node.set_front(None);
            }
            if node.back().is_some_and(|id| id.0 >= checkpoint) {
                node.set_back(None);
            }
        }
        if self.root.is_some_and(|id| id.0 >= checkpoint) {
            self.root = None;
        }
    }

    /// Recursively builds a subtree from a list of edges.
    fn build(
        &mut self,
        edges: &[Edge],
        parent: Option<NodeId>,
        depth: usize,
    ) -> Result<NodeId, GeometryError> {
        if depth > self.max_depth {
            return Err(GeometryError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }

        let splitter = self
            .selector
            .select(edges)
            .filter(|&i| i < edges.len())
            .ok_or(GeometryError::NoSplitter)?;

        let id = self.push_node(TreeNode::new(edges[splitter], parent));
        let plane = *self.nodes[id.0].plane();

        let mut front_list = Vec::new();
        let mut back_list = Vec::new();

        for (i, edge) in edges.iter().enumerate() {
            if i == splitter {
                continue;
            }
            match edge.classify(&plane) {
                PlaneSide::Front => front_list.push(*edge),
                PlaneSide::Back => back_list.push(*edge),
                PlaneSide::On => {
                    if faces_same_direction(&plane, &edge.plane()) {
                        front_list.push(*edge);
                    } else {
                        back_list.push(*edge);
                    }
                }
                PlaneSide::Both => {
                    front_list.push(*edge);
                    back_list.push(*edge);
                }
            }
        }

        trace!(
            depth,
            front = front_list.len(),
            back = back_list.len(),
            "partitioned edges"
        );

        if !front_list.is_empty() {
            let child = self.build(&front_list, Some(id), depth + 1)?;
            self.nodes[id.0].set_front(Some(child));
        }
        if !back_list.is_empty() {
            let child = self.build(&back_list, Some(id), depth + 1)?;
            self.nodes[id.0].set_back(Some(child));
        }

        Ok(id)
    }

    /// Pushes edges down from `id`, growing the tree on the front side only.
    fn insert_edges(
        &mut self,
        id: NodeId,
        edges: &[Edge],
        depth: usize,
    ) -> Result<(), GeometryError> {
        if depth > self.max_depth {
            return Err(GeometryError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }

        let plane = *self.nodes[id.0].plane();
        let mut front_list = Vec::new();
        let mut back_list = Vec::new();

        for edge in edges {
            match edge.classify(&plane) {
                PlaneSide::Front => front_list.push(*edge),
                PlaneSide::Back => back_list.push(*edge),
                PlaneSide::On | PlaneSide::Both => {
                    front_list.push(*edge);
                    back_list.push(*edge);
                }
            }
        }

        if !front_list.is_empty() {
            match self.nodes[id.0].front() {
                Some(front) => self.insert_edges(front, &front_list, depth + 1)?,
                None => {
                    let child = self.build(&front_list, Some(id), depth + 1)?;
                    self.nodes[id.0].set_front(Some(child));
                }
            }
        }

        if !back_list.is_empty() {
            match self.nodes[id.0].back() {
                Some(back) => self.insert_edges(back, &back_list, depth + 1)?,
                None => trace!(dropped = back_list.len(), "edges behind solid leaf"),
            }
        }

        Ok(())
    }

    fn clip(&self, polygon: &Polygon, side_to_delete: PlaneSide) -> Vec<Polygon> {
        let Some(root) = self.root else {
            return match side_to_delete {
                PlaneSide::Back => vec![polygon.clone()],
                _ => Vec::new(),
            };
        };

        match self.clip_node(root, polygon, side_to_delete) {
            Clipped::Kept => vec![polygon.clone()],
            Clipped::Pieces(pieces) => pieces,
        }
    }

    fn clip_node(&self, id: NodeId, polygon: &Polygon, side_to_delete: PlaneSide) -> Clipped {
        let node = &self.nodes[id.0];

        match polygon.classify(node.plane()) {
            // Degenerate in 2D.
            PlaneSide::On => Clipped::Pieces(Vec::new()),
            side @ (PlaneSide::Front | PlaneSide::Back) => {
                self.clip_child(node.child(side), side, polygon, side_to_delete)
            }
            PlaneSide::Both => {
                let (front, back) = polygon.split(node.plane());
                let mut pieces = Vec::new();
                let mut all_kept = true;

                for (side, part) in [(PlaneSide::Front, front), (PlaneSide::Back, back)] {
                    let Some(part) = part else {
                        all_kept = false;
                        continue;
                    };
                    match self.clip_child(node.child(side), side, &part, side_to_delete) {
                        Clipped::Kept => pieces.push(part),
                        Clipped::Pieces(survivors) => {
                            all_kept = false;
                            pieces.extend(survivors);
                        }
                    }
                }

                if all_kept {
                    Clipped::Kept
                } else {
                    Clipped::Pieces(pieces)
                }
            }
        }
    }

    /// Clips into `child`, or applies the leaf rule when it is absent.
    fn clip_child(
        &self,
        child: Option<NodeId>,
        side: PlaneSide,
        polygon: &Polygon,
        side_to_delete: PlaneSide,
    ) -> Clipped {
        match child {
            Some(child) => self.clip_node(child, polygon, side_to_delete),
            None if side == side_to_delete => Clipped::Pieces(Vec::new()),
            None => Clipped::Kept,
        }
    }

    fn touches(&self, id: NodeId, polygon: &Polygon) -> bool {
        let node = &self.nodes[id.0];
        let (front, back) = polygon.split(node.plane());

        let in_front = front.is_some_and(|part| {
            node.front()
                .is_some_and(|child| self.touches(child, &part))
        });
        let in_back = back.is_some_and(|part| {
            node.back()
                .is_none_or(|child| self.touches(child, &part))
        });

        in_front || in_back
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, indent: usize) -> fmt::Result {
        let node = &self.nodes[id.0];
        let pad = " ".repeat(indent);
        let edge = node.edge();
        writeln!(
            f,
            "{pad}Split: ({}, {}) -> ({}, {})",
            edge.a.x, edge.a.y, edge.b.x, edge.b.y
        )?;

        for (label, child) in [("Front", node.front()), ("Back", node.back())] {
            match child {
                Some(child) => {
                    writeln!(f, "{pad}{label}:")?;
                    self.fmt_node(f, child, indent + 1)?;
                }
                None => writeln!(f, "{pad}{label}: null")?,
            }
        }
        Ok(())
    }
}

impl<S: SplitterSelector> fmt::Display for PolyShape<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            None => writeln!(f, "Tree: null"),
            Some(root) => self.fmt_node(f, root, 0),
        }
    }
}
