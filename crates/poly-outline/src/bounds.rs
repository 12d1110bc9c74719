//! Axis-aligned bounding boxes.

use nalgebra::{Point2, Vector2};

/// An axis-aligned box in the plane, defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box2 {
    min: Point2<f32>,
    max: Point2<f32>,
}

impl Box2 {
    /// Creates a box from two arbitrary corners.
    pub fn from_corners(a: Point2<f32>, b: Point2<f32>) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Creates a zero-sized box at a single point.
    #[inline]
    pub fn from_point(p: Point2<f32>) -> Self {
        Self { min: p, max: p }
    }

    /// Creates the smallest box containing all points.
    ///
    /// Returns `None` if the iterator is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point2<f32>>,
    {
        let mut iter = points.into_iter();
        let mut bbox = Self::from_point(iter.next()?);
        for p in iter {
            bbox.extend(p);
        }
        Some(bbox)
    }

    /// Grows the box to include `p`.
    pub fn extend(&mut self, p: Point2<f32>) {
        self.min = Point2::new(self.min.x.min(p.x), self.min.y.min(p.y));
        self.max = Point2::new(self.max.x.max(p.x), self.max.y.max(p.y));
    }

    /// Returns the minimum corner.
    #[inline]
    pub fn min(&self) -> Point2<f32> {
        self.min
    }

    /// Returns the maximum corner.
    #[inline]
    pub fn max(&self) -> Point2<f32> {
        self.max
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Vector2<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point2<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Returns the four corners in counter-clockwise order, starting at `min`.
    pub fn vertices(&self) -> [Point2<f32>; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }

    /// Returns true if `p` lies inside or on the border of the box.
    pub fn contains_point(&self, p: Point2<f32>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
