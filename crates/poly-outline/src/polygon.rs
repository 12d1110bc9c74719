//! Simple polygon representation.

use nalgebra::{Affine2, Point2, Vector2};

use crate::edge::{closest_point_on_segment, distance_to_segment};
use crate::plane::{classify_distances, perp};
use crate::{Box2, Cuttable, Edge, GeometryError, Plane2, PlaneSide};

/// A simple closed polygon, defined by an ordered list of vertices.
///
/// The loop is implicitly closed from the last vertex back to the first.
/// Holes are not supported. Counter-clockwise loops have outward-facing edge
/// normals, which is the orientation [`PolyShape`](crate::PolyShape) expects.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point2<f32>>,
}

impl Polygon {
    /// Creates a new polygon from a list of vertices.
    ///
    /// # Errors
    /// Returns [`GeometryError::TooFewVertices`] if fewer than 3 vertices are provided.
    pub fn new(vertices: Vec<Point2<f32>>) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                count: vertices.len(),
            });
        }
        Ok(Self { vertices })
    }

    /// Wraps vertices already known to form a loop of at least 3 points.
    pub(crate) fn from_vertices(vertices: Vec<Point2<f32>>) -> Self {
        debug_assert!(vertices.len() >= 3, "Polygon must have at least 3 vertices");
        Self { vertices }
    }

    /// Creates the counter-clockwise quad covering a bounding box.
    pub fn quad(bbox: &Box2) -> Self {
        Self {
            vertices: bbox.vertices().to_vec(),
        }
    }

    /// Creates the counter-clockwise rectangle spanned by two corners.
    pub fn rectangle(a: Point2<f32>, b: Point2<f32>) -> Self {
        Self::quad(&Box2::from_corners(a, b))
    }

    /// Returns the vertices of the polygon.
    #[inline]
    pub fn vertices(&self) -> &[Point2<f32>] {
        &self.vertices
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the polygon has no vertices (always false for valid polygons).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the directed edge from vertex `i` to vertex `i + 1` (wrapping).
    pub fn edge(&self, i: usize) -> Edge {
        let n = self.vertices.len();
        Edge::new(self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    /// Returns all directed edges of the loop, in vertex order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.vertices.len()).map(|i| self.edge(i))
    }

    /// Returns the signed area (shoelace formula).
    ///
    /// Positive for counter-clockwise winding, negative for clockwise.
    pub fn signed_area(&self) -> f32 {
        let n = self.vertices.len();
        let twice: f32 = (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice * 0.5
    }

    /// Returns the absolute area.
    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    #[inline]
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Computes the vertex average.
    pub fn centroid(&self) -> Point2<f32> {
        let sum: Vector2<f32> = self.vertices.iter().map(|p| p.coords).sum();
        Point2::from(sum / self.vertices.len() as f32)
    }

    pub fn bounding_box(&self) -> Box2 {
        let mut bbox = Box2::from_point(self.vertices[0]);
        for &v in &self.vertices[1..] {
            bbox.extend(v);
        }
        bbox
    }

    /// Returns the polygon with its winding reversed.
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self { vertices }
    }

    /// Returns the polygon wound counter-clockwise, reversing it if needed.
    pub fn to_counter_clockwise(&self) -> Self {
        if self.signed_area() < 0.0 {
            self.reversed()
        } else {
            self.clone()
        }
    }

    /// Applies an affine transform to every vertex.
    pub fn transform(&self, xform: &Affine2<f32>) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| xform.transform_point(v)).collect(),
        }
    }

    /// Classifies this polygon relative to a plane.
    ///
    /// Returns:
    /// - `On` if every vertex lies within epsilon of the plane (degenerate in 2D)
    /// - `Front` if no vertex is behind the plane
    /// - `Back` if no vertex is in front of the plane
    /// - `Both` if vertices are on both sides
    pub fn classify(&self, plane: &Plane2) -> PlaneSide {
        classify_distances(self.vertices.iter().map(|v| plane.signed_distance(*v)))
    }

    /// Returns true if `p` is behind (or on) every edge plane.
    ///
    /// Exact for convex counter-clockwise polygons; use [`Polygon::contains`]
    /// for concave ones.
    pub fn point_inside(&self, p: Point2<f32>) -> bool {
        let n = self.vertices.len();
        (0..n).all(|i| {
            let a = self.vertices[i];
            let normal = perp(self.vertices[(i + 1) % n] - a);
            normal.dot(&(p - a)) <= 0.0
        })
    }

    /// Even-odd point containment, valid for any simple polygon.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > p.y) != (vj.y > p.y)
                && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// The part of the polygon on the front of `plane`.
    ///
    /// Returns `None` when fewer than three vertices survive.
    pub fn clip_to_plane(&self, plane: &Plane2) -> Option<Polygon> {
        self.split(plane).0
    }

    /// The point on the polygon's boundary nearest to `p`.
    pub fn closest_point(&self, p: Point2<f32>) -> Point2<f32> {
        let mut best_dist = f32::MAX;
        let mut best = self.vertices[0];
        for edge in self.edges() {
            let dist = distance_to_segment(p, edge.a, edge.b);
            if dist < best_dist {
                best_dist = dist;
                best = closest_point_on_segment(p, edge.a, edge.b);
            }
        }
        best
    }

    /// True if a vertex of either polygon lies inside the other.
    ///
    /// Uses the convex [`Polygon::point_inside`] test. Polygons that cross
    /// without either containing a vertex of the other are not detected.
    pub fn is_touching(&self, other: &Polygon) -> bool {
        other.vertices.iter().any(|&v| self.point_inside(v))
            || self.vertices.iter().any(|&v| other.point_inside(v))
    }
}

impl From<Box2> for Polygon {
    fn from(bbox: Box2) -> Self {
        Self::quad(&bbox)
    }
}

impl From<&Box2> for Polygon {
    fn from(bbox: &Box2) -> Self {
        Self::quad(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    fn make_polygon(points: &[[f32; 2]]) -> Polygon {
        Polygon::new(points.iter().map(|p| Point2::new(p[0], p[1])).collect()).unwrap()
    }

    fn unit_square() -> Polygon {
        make_polygon(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
    }

    #[test]
    fn new_rejects_two_points() {
        let err = Polygon::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices { count: 2 });
    }

    #[test]
    fn signed_area_follows_winding() {
        let square = unit_square();
        assert_relative_eq!(square.signed_area(), 1.0);
        assert!(square.is_counter_clockwise());
        assert_relative_eq!(square.reversed().signed_area(), -1.0);
        assert_relative_eq!(square.reversed().area(), 1.0);
    }

    #[test]
    fn to_counter_clockwise_reverses_clockwise_only() {
        let square = unit_square();
        assert_eq!(square.to_counter_clockwise(), square);
        assert_relative_eq!(square.reversed().to_counter_clockwise().signed_area(), 1.0);
    }

    #[test]
    fn quad_covers_bbox_counter_clockwise() {
        let bbox = Box2::from_corners(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0));
        let quad = Polygon::quad(&bbox);
        assert_eq!(quad.len(), 4);
        assert_relative_eq!(quad.signed_area(), 2.0);
        assert_eq!(quad.bounding_box(), bbox);
    }

    #[test]
    fn edges_wrap_around() {
        let square = unit_square();
        let edges: Vec<Edge> = square.edges().collect();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3].a, Point2::new(0.0, 1.0));
        assert_eq!(edges[3].b, Point2::new(0.0, 0.0));
    }

    #[test]
    fn classify_against_axis_plane() {
        let square = unit_square();
        // Plane x = 0.5, front is +x
        let plane = Plane2::new(Vector2::new(1.0, 0.0), 0.5);
        assert_eq!(square.classify(&plane), PlaneSide::Both);

        // Plane x = 1, the square's right edge: everything is behind or on.
        let plane = Plane2::new(Vector2::new(1.0, 0.0), 1.0);
        assert_eq!(square.classify(&plane), PlaneSide::Back);

        let plane = Plane2::new(Vector2::new(-1.0, 0.0), 0.0);
        assert_eq!(square.classify(&plane), PlaneSide::Back);

        let plane = Plane2::new(Vector2::new(1.0, 0.0), -0.5);
        assert_eq!(square.classify(&plane), PlaneSide::Front);
    }

    #[test]
    fn collinear_polygon_classifies_on() {
        let sliver = make_polygon(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
        let plane = Plane2::from_edge(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        assert_eq!(sliver.classify(&plane), PlaneSide::On);
    }

    #[test]
    fn point_inside_convex() {
        let square = unit_square();
        assert!(square.point_inside(Point2::new(0.5, 0.5)));
        assert!(!square.point_inside(Point2::new(1.5, 0.5)));
        assert!(!square.point_inside(Point2::new(0.5, -0.1)));
    }

    #[test]
    fn contains_concave() {
        // L-shape: the notch at (1.5, 1.5) is outside.
        let l_shape = make_polygon(&[
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 2.0],
            [0.0, 2.0],
        ]);
        assert!(l_shape.contains(Point2::new(0.5, 1.5)));
        assert!(l_shape.contains(Point2::new(1.5, 0.5)));
        assert!(!l_shape.contains(Point2::new(1.5, 1.5)));
        assert_relative_eq!(l_shape.area(), 3.0);
    }

    #[test]
    fn clip_to_plane_keeps_the_front() {
        let square = unit_square();

        // Plane x = 0.5, front is +x
        let half = square
            .clip_to_plane(&Plane2::new(Vector2::new(1.0, 0.0), 0.5))
            .unwrap();
        assert_relative_eq!(half.area(), 0.5);
        assert!(half.vertices().iter().all(|v| v.x >= 0.5));

        assert_eq!(
            square.clip_to_plane(&Plane2::new(Vector2::new(1.0, 0.0), -1.0)),
            Some(square.clone())
        );
        assert!(
            square
                .clip_to_plane(&Plane2::new(Vector2::new(1.0, 0.0), 2.0))
                .is_none()
        );
    }

    #[test]
    fn closest_point_on_boundary() {
        let square = unit_square();
        assert_relative_eq!(
            square.closest_point(Point2::new(0.5, -2.0)),
            Point2::new(0.5, 0.0)
        );
        assert_relative_eq!(
            square.closest_point(Point2::new(3.0, 3.0)),
            Point2::new(1.0, 1.0)
        );
        // From the inside the nearest side wins.
        assert_relative_eq!(
            square.closest_point(Point2::new(0.5, 0.4)),
            Point2::new(0.5, 0.0)
        );
    }

    #[test]
    fn touching_by_vertex_containment() {
        let square = unit_square();
        let shifted = make_polygon(&[[0.5, 0.5], [1.5, 0.5], [1.5, 1.5], [0.5, 1.5]]);
        let far = make_polygon(&[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0]]);
        assert!(square.is_touching(&shifted));
        assert!(shifted.is_touching(&square));
        assert!(!square.is_touching(&far));

        // A plus sign: the bars cross but hold none of each other's corners.
        let bar = make_polygon(&[[0.0, 0.4], [3.0, 0.4], [3.0, 0.6], [0.0, 0.6]]);
        let post = make_polygon(&[[1.4, -1.0], [1.6, -1.0], [1.6, 2.0], [1.4, 2.0]]);
        assert!(!bar.is_touching(&post));
    }

    #[test]
    fn centroid_of_square() {
        assert_relative_eq!(unit_square().centroid(), Point2::new(0.5, 0.5));
    }

    #[test]
    fn transform_translates_and_scales() {
        #[rustfmt::skip]
        let xform = Affine2::from_matrix_unchecked(Matrix3::new(
            2.0, 0.0, 10.0,
            0.0, 2.0, 20.0,
            0.0, 0.0, 1.0,
        ));
        let moved = unit_square().transform(&xform);
        assert_eq!(moved.vertices()[2], Point2::new(12.0, 22.0));
        assert_relative_eq!(moved.area(), 4.0);
    }
}
