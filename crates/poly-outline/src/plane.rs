//! Oriented 2D lines ("planes") and side classification.

use nalgebra::{Point2, Vector2};

use crate::config::{NORMALIZE_EPSILON, PLANE_EPSILON};

/// Which side of a plane a point or shape lies on.
///
/// Points only ever classify as `Front`, `Back` or `On`. `Both` is reserved
/// for shapes with vertices on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneSide {
    /// In front of the plane (positive side of the normal).
    Front,
    /// Behind the plane (negative side of the normal).
    Back,
    /// Within epsilon of the plane.
    On,
    /// Vertices on both sides of the plane.
    Both,
}

/// A line in the plane, represented as `normal · point = offset`.
///
/// The positive half-space is the "front". For edges derived from a
/// counter-clockwise loop the front is the outside of the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane2 {
    normal: Vector2<f32>,
    offset: f32,
}

impl Plane2 {
    /// Plane of points `p` with `normal · p = offset`.
    ///
    /// The normal is normalized, together with the offset, unless it is
    /// shorter than `NORMALIZE_EPSILON`.
    pub fn new(normal: Vector2<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        if norm < NORMALIZE_EPSILON {
            return Self { normal, offset };
        }
        Self {
            normal: normal / norm,
            offset: offset / norm,
        }
    }

    /// Creates the plane running along the directed edge `a -> b`.
    ///
    /// The normal points to the right of the travel direction.
    pub fn from_edge(a: Point2<f32>, b: Point2<f32>) -> Self {
        let normal = perp(normalized(b - a));
        Self {
            normal,
            offset: normal.dot(&a.coords),
        }
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector2<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: Point2<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies which side of the plane a point lies on.
    #[inline]
    pub fn classify_point(&self, point: Point2<f32>) -> PlaneSide {
        self.classify_point_with_epsilon(point, PLANE_EPSILON)
    }

    /// Same as [`Plane2::classify_point`] with a caller-chosen tolerance.
    pub fn classify_point_with_epsilon(&self, point: Point2<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::On
        }
    }

    /// Returns a new plane with the normal flipped.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }
}

/// Combines per-point distances into a shape classification.
///
/// `On` only if every distance is within epsilon of zero.
pub(crate) fn classify_distances<I>(distances: I) -> PlaneSide
where
    I: IntoIterator<Item = f32>,
{
    let mut front = true;
    let mut back = true;
    let mut on = true;

    for dist in distances {
        if dist < -PLANE_EPSILON {
            front = false;
            on = false;
        }
        if dist > PLANE_EPSILON {
            back = false;
            on = false;
        }
    }

    if on {
        PlaneSide::On
    } else if front {
        PlaneSide::Front
    } else if back {
        PlaneSide::Back
    } else {
        PlaneSide::Both
    }
}

/// Right-hand perpendicular: `(x, y) -> (y, -x)`.
#[inline]
pub fn perp(v: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(v.y, -v.x)
}

/// Normalizes `v`, leaving near-zero vectors untouched.
#[inline]
pub(crate) fn normalized(v: Vector2<f32>) -> Vector2<f32> {
    v.try_normalize(NORMALIZE_EPSILON).unwrap_or(v)
}
