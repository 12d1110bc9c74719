//! Directed edges and their derived planes.

use nalgebra::{Point2, Vector2};

use crate::config::{NORMALIZE_EPSILON, PLANE_EPSILON};
use crate::plane::classify_distances;
use crate::{Plane2, PlaneSide, Polygon};

/// A directed edge `a -> b`.
///
/// `owner` optionally records the index of the input polygon the edge came
/// from. It is a plain index, not a reference, and is never dereferenced by
/// the shape code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: Point2<f32>,
    pub b: Point2<f32>,
    owner: Option<usize>,
}

impl Edge {
    pub fn new(a: Point2<f32>, b: Point2<f32>) -> Self {
        Self { a, b, owner: None }
    }

    /// Tags the edge with the index of the polygon it belongs to.
    pub fn with_owner(mut self, owner: usize) -> Self {
        self.owner = Some(owner);
        self
    }

    #[inline]
    pub fn owner(&self) -> Option<usize> {
        self.owner
    }

    /// The plane running along this edge; its normal points to the right of `a -> b`.
    #[inline]
    pub fn plane(&self) -> Plane2 {
        Plane2::from_edge(self.a, self.b)
    }

    #[inline]
    pub fn normal(&self) -> Vector2<f32> {
        self.plane().normal()
    }

    #[inline]
    pub fn middle(&self) -> Point2<f32> {
        nalgebra::center(&self.a, &self.b)
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.b - self.a).norm()
    }

    /// True when the edge is too short to define a direction.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.length() < NORMALIZE_EPSILON
    }

    /// Classifies both endpoints against `plane`, without interpolation.
    ///
    /// `Both` is returned when the endpoints lie on opposite sides.
    pub fn classify(&self, plane: &Plane2) -> PlaneSide {
        classify_distances([plane.signed_distance(self.a), plane.signed_distance(self.b)])
    }

    /// True if `p` lies within epsilon of the segment.
    pub fn is_point_on_edge(&self, p: Point2<f32>) -> bool {
        distance_to_segment(p, self.a, self.b) < PLANE_EPSILON
    }

    /// Collects the edges of `polygon` in loop order, skipping zero-length ones.
    pub fn edges_from_polygon(polygon: &Polygon, owner: Option<usize>) -> Vec<Edge> {
        polygon
            .edges()
            .filter(|e| !e.is_degenerate())
            .map(|e| Edge { owner, ..e })
            .collect()
    }
}

/// Distance from `p` to the segment `a`-`b`.
///
/// Uses the perpendicular distance when `p` projects strictly inside the
/// segment and the nearer endpoint otherwise.
pub fn distance_to_segment(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let dir = b - a;
    let sa = dir.dot(&a.coords);
    let sb = dir.dot(&b.coords);
    let st = dir.dot(&p.coords);

    let within = if sb < sa {
        st > sb && st < sa
    } else {
        st > sa && st < sb
    };

    if within {
        Plane2::from_edge(a, b).signed_distance(p).abs()
    } else {
        (p - a).norm().min((p - b).norm())
    }
}

/// Nearest point to `p` on the segment `a`-`b`.
///
/// Projects onto the supporting line when `p` projects strictly inside the
/// segment and falls back to the nearer endpoint otherwise.
pub fn closest_point_on_segment(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> Point2<f32> {
    let dir = b - a;
    let sa = dir.dot(&a.coords);
    let sb = dir.dot(&b.coords);
    let st = dir.dot(&p.coords);

    let within = if sb < sa {
        st > sb && st < sa
    } else {
        st > sa && st < sb
    };

    if within {
        let plane = Plane2::from_edge(a, b);
        p - plane.normal() * plane.signed_distance(p)
    } else if (p - a).norm_squared() <= (p - b).norm_squared() {
        a
    } else {
        b
    }
}
