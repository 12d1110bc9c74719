//! Half-edge contour merge.
//!
//! [`PolyMerge`] takes a flat list of polygon fragments, such as the output
//! of [`PolyShape::to_polygons`](crate::PolyShape::to_polygons), and splices
//! fragments that share boundary edges into as few simple polygons as
//! possible.
//!
//! Construction runs three passes over the half-edge graph:
//!
//! 1. Weld vertices closer than the tolerance into one.
//! 2. Split edges that have another vertex lying on their interior.
//! 3. Pair each edge with a reversed twin on a neighbouring ring.
//!
//! Pairs that are never found (tolerance too small for the input scale) just
//! leave their fragments unmerged.

mod graph;

use nalgebra::Point2;
use slotmap::SecondaryMap;
use tracing::{debug, instrument, trace};

use crate::config::WELD_EPSILON;
use crate::edge::distance_to_segment;
use crate::{GeometryError, Polygon};

use graph::{HalfEdgeGraph, HalfEdgeKey, VertexKey};

/// Merges polygon fragments across shared edges.
///
/// ```ignore
/// let mut merge = PolyMerge::new(&fragments);
/// merge.merge_polygons();
/// let outline = merge.polygons();
/// ```
#[derive(Debug, Clone)]
pub struct PolyMerge {
    graph: HalfEdgeGraph,
    epsilon: f32,
}

impl PolyMerge {
    /// Builds the merge graph with the default weld tolerance.
    pub fn new(polygons: &[Polygon]) -> Self {
        Self::with_epsilon(polygons, WELD_EPSILON)
    }

    /// Builds the merge graph, welding vertices closer than `epsilon`.
    #[instrument(level = "debug", skip_all, fields(polygons = polygons.len(), epsilon = epsilon))]
    pub fn with_epsilon(polygons: &[Polygon], epsilon: f32) -> Self {
        let mut graph = HalfEdgeGraph::default();
        for polygon in polygons {
            let keys: Vec<VertexKey> = polygon
                .vertices()
                .iter()
                .map(|&p| graph.add_vertex(p))
                .collect();
            graph.add_ring(&keys);
            trace!(vertices = keys.len(), "added ring");
        }

        let mut merge = Self { graph, epsilon };
        merge.weld_vertices();
        merge.remove_collapsed_edges();
        merge.repair_t_junctions();
        merge.match_opposites();
        merge
    }

    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    #[inline]
    pub fn polygon_count(&self) -> usize {
        self.graph.polys.len()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.graph.vertices.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edges.len()
    }

    /// Number of opposite pairs still joining two different polygons.
    pub fn shared_edge_count(&self) -> usize {
        let crossing = self
            .graph
            .edges
            .values()
            .filter(|edge| {
                edge.opposite
                    .is_some_and(|op| self.graph.edges[op].poly != edge.poly)
            })
            .count();
        crossing / 2
    }

    /// Verifies the ring and opposite invariants of the whole graph.
    pub fn check_links(&self) -> Result<(), GeometryError> {
        self.graph.check_links()
    }

    /// The current polygons, in input order of the surviving rings.
    pub fn polygons(&self) -> Vec<Polygon> {
        self.graph
            .polys
            .keys()
            .filter_map(|poly| {
                let points = self.graph.positions(poly);
                (points.len() >= 3).then(|| Polygon::from_vertices(points))
            })
            .collect()
    }

    /// Merges every pair of polygons joined by an opposite pair, then removes
    /// the two-edge slivers the splices leave behind.
    ///
    /// Returns the number of polygons absorbed.
    #[instrument(level = "debug", skip_all)]
    pub fn merge_polygons(&mut self) -> usize {
        let mut merged = 0;
        for key in self.graph.ring_edges() {
            if self.try_merge(key) {
                merged += 1;
            }
        }

        let slivers = self.remove_slivers();
        let dropped = self.graph.drop_degenerate_rings();
        debug!(
            merged,
            slivers,
            dropped,
            polygons = self.graph.polys.len(),
            "merged polygons"
        );
        merged
    }

    /// Performs a single merge across the first usable opposite pair.
    ///
    /// No sliver cleanup is done. Returns `false` once nothing is left to merge.
    pub fn remove_one_edge(&mut self) -> bool {
        self.graph
            .ring_edges()
            .into_iter()
            .any(|key| self.try_merge(key))
    }

    fn try_merge(&mut self, key: HalfEdgeKey) -> bool {
        let Some(edge) = self.graph.edges.get(key).copied() else {
            return false;
        };
        let Some(op) = edge.opposite else {
            return false;
        };
        if self.graph.edges[op].poly == edge.poly {
            return false;
        }
        self.merge_poly(key, op);
        true
    }

    /// Splices the ring of `op` into the ring of `key` and drops the pair.
    fn merge_poly(&mut self, key: HalfEdgeKey, op: HalfEdgeKey) {
        let edge = self.graph.edges[key];
        let other = self.graph.edges[op];
        let absorbed = other.poly;
        let absorbed_ring = self.graph.ring(absorbed);

        self.graph.link(other.prev, edge.next);
        self.graph.link(edge.prev, other.next);

        for member in absorbed_ring {
            self.graph.edges[member].poly = edge.poly;
        }
        self.graph.polys[edge.poly].first = edge.next;
        self.graph.polys.remove(absorbed);

        self.graph.edges.remove(key);
        self.graph.edges.remove(op);
    }

    /// Shortcuts every `e -> opposite(e)` pair inside a ring.
    fn remove_slivers(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let sliver = self
                .graph
                .edges
                .iter()
                .find(|(_, edge)| edge.opposite == Some(edge.next))
                .map(|(key, _)| key);
            let Some(key) = sliver else {
                break;
            };

            let edge = self.graph.edges[key];
            let op = edge.next;
            let after = self.graph.edges[op].next;

            if after == key {
                self.graph.remove_poly(edge.poly);
            } else {
                self.graph.link(edge.prev, after);
                self.graph.polys[edge.poly].first = edge.prev;
                self.graph.edges.remove(key);
                self.graph.edges.remove(op);
            }
            removed += 1;
        }
        removed
    }

    fn weld_vertices(&mut self) {
        let eps_sq = self.epsilon * self.epsilon;
        let all: Vec<(VertexKey, Point2<f32>)> = self
            .graph
            .vertices
            .iter()
            .map(|(key, v)| (key, v.pos))
            .collect();

        let mut unique: Vec<(VertexKey, Point2<f32>)> = Vec::new();
        let mut remap: SecondaryMap<VertexKey, VertexKey> = SecondaryMap::new();
        for &(key, pos) in &all {
            match unique
                .iter()
                .find(|(_, kept)| (pos - *kept).norm_squared() < eps_sq)
            {
                Some(&(target, _)) => {
                    remap.insert(key, target);
                }
                None => unique.push((key, pos)),
            }
        }

        for edge in self.graph.edges.values_mut() {
            if let Some(&target) = remap.get(edge.a) {
                edge.a = target;
            }
            if let Some(&target) = remap.get(edge.b) {
                edge.b = target;
            }
        }
        for key in remap.keys() {
            self.graph.vertices.remove(key);
        }

        debug!(welded = remap.len(), total = all.len(), "welded vertices");
    }

    /// Drops edges whose ends were welded together.
    fn remove_collapsed_edges(&mut self) {
        let collapsed: Vec<HalfEdgeKey> = self
            .graph
            .edges
            .iter()
            .filter(|(_, edge)| edge.a == edge.b)
            .map(|(key, _)| key)
            .collect();
        if collapsed.is_empty() {
            return;
        }

        for &key in &collapsed {
            if self.graph.edges.contains_key(key) {
                self.graph.unlink_edge(key);
            }
        }
        let dropped = self.graph.drop_degenerate_rings();
        debug!(edges = collapsed.len(), rings = dropped, "removed collapsed edges");
    }

    /// Splits every edge that has a foreign vertex on its interior.
    ///
    /// New edges are appended to the work list so they can be split again.
    fn repair_t_junctions(&mut self) {
        let eps = self.epsilon;
        let eps_sq = eps * eps;
        let vertices: Vec<(VertexKey, Point2<f32>)> = self
            .graph
            .vertices
            .iter()
            .map(|(key, v)| (key, v.pos))
            .collect();
        let mut edges = self.graph.ring_edges();
        let mut repaired = 0usize;

        for &(v, pos) in &vertices {
            let mut i = 0;
            while i < edges.len() {
                let key = edges[i];
                i += 1;

                let edge = self.graph.edges[key];
                if edge.a == v || edge.b == v {
                    continue;
                }
                let a = self.graph.vertices[edge.a].pos;
                let b = self.graph.vertices[edge.b].pos;
                if distance_to_segment(pos, a, b) < eps
                    && (a - pos).norm_squared() > eps_sq
                    && (b - pos).norm_squared() > eps_sq
                {
                    edges.push(self.graph.split_edge(key, v));
                    repaired += 1;
                }
            }
        }

        debug!(repaired, "repaired T-junctions");
    }

    /// Pairs each unmatched edge `a -> b` with the first unmatched `b -> a`.
    fn match_opposites(&mut self) {
        let edges = self.graph.ring_edges();

        let mut starts: SecondaryMap<VertexKey, Vec<HalfEdgeKey>> = SecondaryMap::new();
        for &key in &edges {
            let a = self.graph.edges[key].a;
            match starts.get_mut(a) {
                Some(list) => list.push(key),
                None => {
                    starts.insert(a, vec![key]);
                }
            }
        }

        let mut pairs = 0usize;
        for &key in &edges {
            let edge = self.graph.edges[key];
            if edge.opposite.is_some() {
                continue;
            }
            let Some(candidates) = starts.get(edge.b) else {
                continue;
            };
            let found = candidates.iter().copied().find(|&other| {
                let candidate = &self.graph.edges[other];
                other != key && candidate.b == edge.a && candidate.opposite.is_none()
            });
            if let Some(other) = found {
                self.graph.edges[key].opposite = Some(other);
                self.graph.edges[other].opposite = Some(key);
                pairs += 1;
            }
        }

        debug!(pairs, "matched opposite edges");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_polygon(points: &[[f32; 2]]) -> Polygon {
        Polygon::new(points.iter().map(|p| Point2::new(p[0], p[1])).collect()).unwrap()
    }

    fn make_square(min: [f32; 2], max: [f32; 2]) -> Polygon {
        Polygon::rectangle(Point2::new(min[0], min[1]), Point2::new(max[0], max[1]))
    }

    fn total_area(polygons: &[Polygon]) -> f32 {
        polygons.iter().map(Polygon::area).sum()
    }

    #[test]
    fn adjacent_squares_merge() {
        let mut merge = PolyMerge::new(&[
            make_square([0.0, 0.0], [1.0, 1.0]),
            make_square([1.0, 0.0], [2.0, 1.0]),
        ]);
        assert_eq!(merge.shared_edge_count(), 1);

        assert_eq!(merge.merge_polygons(), 1);

        let polygons = merge.polygons();
        assert_eq!(
            polygons,
            vec![make_polygon(&[
                [1.0, 1.0],
                [0.0, 1.0],
                [0.0, 0.0],
                [1.0, 0.0],
                [2.0, 0.0],
                [2.0, 1.0],
            ])]
        );
        assert_eq!(merge.shared_edge_count(), 0);
        assert!(merge.check_links().is_ok());
    }

    #[test]
    fn t_junction_is_repaired_before_matching() {
        let square = make_square([0.0, 0.0], [2.0, 2.0]);
        let triangle = make_polygon(&[[2.0, 0.0], [3.0, 1.0], [2.0, 1.0]]);
        let mut merge = PolyMerge::new(&[square, triangle]);

        // (2, 0) is welded; (2, 1) splits the square's right edge.
        assert_eq!(merge.vertex_count(), 6);
        assert_eq!(merge.edge_count(), 8);
        assert_eq!(merge.shared_edge_count(), 1);

        merge.merge_polygons();

        let polygons = merge.polygons();
        assert_eq!(
            polygons,
            vec![make_polygon(&[
                [2.0, 1.0],
                [2.0, 2.0],
                [0.0, 2.0],
                [0.0, 0.0],
                [2.0, 0.0],
                [3.0, 1.0],
            ])]
        );
        assert_relative_eq!(polygons[0].area(), 4.5);
        assert!(merge.check_links().is_ok());
    }

    #[test]
    fn grid_merges_and_drops_inner_sliver() {
        let cells = [
            make_square([0.0, 0.0], [1.0, 1.0]),
            make_square([1.0, 0.0], [2.0, 1.0]),
            make_square([0.0, 1.0], [1.0, 2.0]),
            make_square([1.0, 1.0], [2.0, 2.0]),
        ];
        let mut merge = PolyMerge::new(&cells);
        assert_eq!(merge.shared_edge_count(), 4);

        assert_eq!(merge.merge_polygons(), 3);

        let polygons = merge.polygons();
        assert_eq!(polygons.len(), 1);
        // Collinear midpoints stay in the ring.
        assert_eq!(polygons[0].len(), 8);
        assert_relative_eq!(polygons[0].area(), 4.0);
        assert_eq!(merge.shared_edge_count(), 0);
        assert!(merge.check_links().is_ok());
    }

    #[test]
    fn near_duplicate_vertices_are_welded() {
        let merge = PolyMerge::new(&[
            make_square([0.0, 0.0], [1.0, 1.0]),
            make_square([1.0005, 0.0], [2.0, 1.0]),
        ]);
        assert_eq!(merge.vertex_count(), 6);
        assert_eq!(merge.shared_edge_count(), 1);
    }

    #[test]
    fn epsilon_controls_welding() {
        let polygons = [
            make_square([0.0, 0.0], [1.0, 1.0]),
            make_square([1.01, 0.0], [2.0, 1.0]),
        ];
        assert_eq!(PolyMerge::new(&polygons).shared_edge_count(), 0);

        let merge = PolyMerge::with_epsilon(&polygons, 0.05);
        assert_eq!(merge.epsilon(), 0.05);
        assert_eq!(merge.shared_edge_count(), 1);
    }

    #[test]
    fn collapsed_edge_is_removed() {
        let merge = PolyMerge::new(&[make_polygon(&[
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 0.0001],
            [0.0, 1.0],
        ])]);
        let polygons = merge.polygons();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 3);
        assert!(merge.check_links().is_ok());
    }

    #[test]
    fn disjoint_polygons_stay_separate() {
        let input = [
            make_square([0.0, 0.0], [1.0, 1.0]),
            make_square([3.0, 0.0], [4.0, 1.0]),
        ];
        let mut merge = PolyMerge::new(&input);
        assert_eq!(merge.merge_polygons(), 0);
        assert_eq!(merge.polygons(), input.to_vec());
    }

    #[test]
    fn remove_one_edge_merges_a_single_pair() {
        let mut merge = PolyMerge::new(&[
            make_square([0.0, 0.0], [1.0, 1.0]),
            make_square([1.0, 0.0], [2.0, 1.0]),
            make_square([2.0, 0.0], [3.0, 1.0]),
        ]);
        assert_eq!(merge.polygon_count(), 3);

        assert!(merge.remove_one_edge());
        assert_eq!(merge.polygon_count(), 2);
        assert!(merge.check_links().is_ok());

        assert!(merge.remove_one_edge());
        assert!(!merge.remove_one_edge());
        assert_eq!(merge.polygon_count(), 1);
        assert_relative_eq!(total_area(&merge.polygons()), 3.0);
    }

    #[test]
    fn merging_output_again_changes_nothing() {
        let mut merge = PolyMerge::new(&[
            make_square([0.0, 0.0], [1.0, 1.0]),
            make_square([1.0, 0.0], [2.0, 1.0]),
            make_square([0.0, 1.0], [1.0, 2.0]),
        ]);
        merge.merge_polygons();
        let first = merge.polygons();

        let mut again = PolyMerge::new(&first);
        assert_eq!(again.merge_polygons(), 0);
        assert_eq!(again.polygons(), first);
    }
}
