//! Polygon splitting against a plane.

use nalgebra::Point2;

use crate::{Box2, Plane2, Polygon};

/// Trait for geometry that can be cut by a plane.
pub trait Cuttable {
    /// Cuts the geometry by a plane.
    ///
    /// Returns `(front, back)` where:
    /// - `front`: `Some(polygon)` containing the part on the front side of the plane
    /// - `back`: `Some(polygon)` containing the part on the back side of the plane
    ///
    /// A side is `None` when fewer than three vertices end up on it.
    fn split(&self, plane: &Plane2) -> (Option<Polygon>, Option<Polygon>);
}

impl Cuttable for Polygon {
    fn split(&self, plane: &Plane2) -> (Option<Polygon>, Option<Polygon>) {
        split_polygon(self, plane)
    }
}

impl Cuttable for Box2 {
    fn split(&self, plane: &Plane2) -> (Option<Polygon>, Option<Polygon>) {
        Polygon::from(self).split(plane)
    }
}

/// Splits a polygon into its front and back parts.
///
/// Walks every edge `v1 -> v2` of the loop. Points with a non-negative
/// distance count as front. An edge that stays on one side contributes its
/// end point to that side; an edge that crosses the plane contributes the
/// crossing point to both sides, then its end point to the side it lands on.
fn split_polygon(polygon: &Polygon, plane: &Plane2) -> (Option<Polygon>, Option<Polygon>) {
    let vertices = polygon.vertices();
    let n = vertices.len();

    let mut front_verts = Vec::with_capacity(n + 2);
    let mut back_verts = Vec::with_capacity(n + 2);

    let distances: Vec<f32> = vertices.iter().map(|v| plane.signed_distance(*v)).collect();

    let mut v1 = n - 1;
    for v2 in 0..n {
        let d1 = distances[v1];
        let d2 = distances[v2];

        match (d1 >= 0.0, d2 >= 0.0) {
            (true, true) => front_verts.push(vertices[v2]),
            (false, false) => back_verts.push(vertices[v2]),
            (front_start, _) => {
                let crossing = interpolate(vertices[v1], vertices[v2], d1 / (d1 - d2));
                front_verts.push(crossing);
                back_verts.push(crossing);
                if front_start {
                    back_verts.push(vertices[v2]);
                } else {
                    front_verts.push(vertices[v2]);
                }
            }
        }

        v1 = v2;
    }

    let front = (front_verts.len() >= 3).then(|| Polygon::from_vertices(front_verts));
    let back = (back_verts.len() >= 3).then(|| Polygon::from_vertices(back_verts));

    (front, back)
}

#[inline]
fn interpolate(a: Point2<f32>, b: Point2<f32>, t: f32) -> Point2<f32> {
    a + (b - a) * t
}
