//! Half-edge arena used by the merge pass.
//!
//! Vertices, half-edges and polygons live in generational slot maps and refer
//! to each other by key. Every half-edge belongs to exactly one circular ring
//! (`next`/`prev`) and every ring to exactly one polygon.

use nalgebra::Point2;
use slotmap::{Key, SlotMap, new_key_type};

use crate::GeometryError;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct VertexKey;
    pub struct HalfEdgeKey;
    pub struct PolyKey;
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub pos: Point2<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    pub a: VertexKey,
    pub b: VertexKey,
    pub poly: PolyKey,
    pub next: HalfEdgeKey,
    pub prev: HalfEdgeKey,
    /// The reversed twin on a neighbouring ring, if one was found.
    pub opposite: Option<HalfEdgeKey>,
}

/// A polygon is identified by any one member of its ring.
#[derive(Debug, Clone, Copy)]
pub struct Poly {
    pub first: HalfEdgeKey,
}

// ─── Arena ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct HalfEdgeGraph {
    pub vertices: SlotMap<VertexKey, Vertex>,
    pub edges: SlotMap<HalfEdgeKey, HalfEdge>,
    pub polys: SlotMap<PolyKey, Poly>,
}

impl HalfEdgeGraph {
    pub fn add_vertex(&mut self, pos: Point2<f32>) -> VertexKey {
        self.vertices.insert(Vertex { pos })
    }

    /// Creates a polygon whose ring visits `vertices` in order.
    ///
    /// Returns `None` for fewer than three vertices.
    pub fn add_ring(&mut self, vertices: &[VertexKey]) -> Option<PolyKey> {
        let n = vertices.len();
        if n < 3 {
            return None;
        }

        let poly = self.polys.insert(Poly {
            first: HalfEdgeKey::null(),
        });
        let keys: Vec<HalfEdgeKey> = (0..n)
            .map(|i| {
                self.edges.insert_with_key(|key| HalfEdge {
                    a: vertices[i],
                    b: vertices[(i + 1) % n],
                    poly,
                    next: key,
                    prev: key,
                    opposite: None,
                })
            })
            .collect();

        for i in 0..n {
            self.link(keys[i], keys[(i + 1) % n]);
        }
        self.polys[poly].first = keys[0];
        Some(poly)
    }

    /// Makes `next` follow `prev` in their ring.
    #[inline]
    pub fn link(&mut self, prev: HalfEdgeKey, next: HalfEdgeKey) {
        self.edges[prev].next = next;
        self.edges[next].prev = prev;
    }

    /// Ring members of `poly`, starting at its first edge.
    ///
    /// Stops early on a missing key or a ring that does not close, so a
    /// broken graph never loops forever.
    pub fn ring(&self, poly: PolyKey) -> Vec<HalfEdgeKey> {
        let Some(first) = self.polys.get(poly).map(|p| p.first) else {
            return Vec::new();
        };

        let mut ring = Vec::new();
        let mut current = first;
        while let Some(edge) = self.edges.get(current) {
            ring.push(current);
            current = edge.next;
            if current == first || ring.len() > self.edges.len() {
                break;
            }
        }
        ring
    }

    /// Every ring edge, polygon by polygon.
    pub fn ring_edges(&self) -> Vec<HalfEdgeKey> {
        self.polys.keys().flat_map(|poly| self.ring(poly)).collect()
    }

    /// Start positions of the ring of `poly`, in ring order.
    pub fn positions(&self, poly: PolyKey) -> Vec<Point2<f32>> {
        self.ring(poly)
            .into_iter()
            .map(|key| self.vertices[self.edges[key].a].pos)
            .collect()
    }

    /// Splits `key` at `v`: the edge now ends at `v` and a new edge from `v`
    /// to the old end follows it in the ring.
    pub fn split_edge(&mut self, key: HalfEdgeKey, v: VertexKey) -> HalfEdgeKey {
        let edge = self.edges[key];
        let tail = self.edges.insert(HalfEdge {
            a: v,
            b: edge.b,
            poly: edge.poly,
            next: edge.next,
            prev: key,
            opposite: None,
        });
        self.edges[edge.next].prev = tail;
        self.edges[key].next = tail;
        self.edges[key].b = v;
        tail
    }

    /// Removes one edge from its ring, joining its neighbours.
    pub fn unlink_edge(&mut self, key: HalfEdgeKey) {
        let edge = self.edges[key];
        if edge.next == key {
            self.polys.remove(edge.poly);
        } else {
            self.link(edge.prev, edge.next);
            if self.polys[edge.poly].first == key {
                self.polys[edge.poly].first = edge.next;
            }
        }
        self.clear_opposite(key);
        self.edges.remove(key);
    }

    /// Removes a polygon and its whole ring.
    pub fn remove_poly(&mut self, poly: PolyKey) {
        for key in self.ring(poly) {
            self.clear_opposite(key);
            self.edges.remove(key);
        }
        self.polys.remove(poly);
    }

    /// Removes every polygon whose ring has fewer than three edges.
    pub fn drop_degenerate_rings(&mut self) -> usize {
        let degenerate: Vec<PolyKey> = self
            .polys
            .keys()
            .filter(|&poly| self.ring(poly).len() < 3)
            .collect();
        for &poly in &degenerate {
            self.remove_poly(poly);
        }
        degenerate.len()
    }

    fn clear_opposite(&mut self, key: HalfEdgeKey) {
        let Some(op) = self.edges[key].opposite.take() else {
            return;
        };
        if let Some(other) = self.edges.get_mut(op) {
            if other.opposite == Some(key) {
                other.opposite = None;
            }
        }
    }

    /// Verifies ring, ownership and opposite invariants.
    pub fn check_links(&self) -> Result<(), GeometryError> {
        for (key, edge) in &self.edges {
            let next = self
                .edges
                .get(edge.next)
                .ok_or_else(|| broken(key, "next edge is missing"))?;
            if next.prev != key {
                return Err(broken(key, "next.prev does not point back"));
            }
            let prev = self
                .edges
                .get(edge.prev)
                .ok_or_else(|| broken(key, "prev edge is missing"))?;
            if prev.next != key {
                return Err(broken(key, "prev.next does not point back"));
            }
            if !self.polys.contains_key(edge.poly) {
                return Err(broken(key, "owning polygon is missing"));
            }
            if let Some(op) = edge.opposite {
                let other = self
                    .edges
                    .get(op)
                    .ok_or_else(|| broken(key, "opposite edge is missing"))?;
                if other.a != edge.b || other.b != edge.a {
                    return Err(broken(key, "opposite is not reversed"));
                }
                if other.opposite != Some(key) {
                    return Err(broken(key, "opposite is not mutual"));
                }
            }
        }

        for (poly, data) in &self.polys {
            let ring = self.ring(poly);
            let closed = ring
                .last()
                .and_then(|&last| self.edges.get(last))
                .is_some_and(|last| last.next == data.first);
            if !closed {
                return Err(GeometryError::BrokenTopology(format!(
                    "ring of polygon {poly:?} does not close"
                )));
            }
            if ring.iter().any(|&key| self.edges[key].poly != poly) {
                return Err(GeometryError::BrokenTopology(format!(
                    "ring of polygon {poly:?} holds foreign edges"
                )));
            }
        }

        Ok(())
    }
}

fn broken(key: HalfEdgeKey, what: &str) -> GeometryError {
    GeometryError::BrokenTopology(format!("edge {key:?}: {what}"))
}
