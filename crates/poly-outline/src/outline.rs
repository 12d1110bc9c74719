//! End-to-end outline extraction from placed primitives.

use std::collections::HashSet;

use nalgebra::{Affine2, Point2};
use tracing::{debug, instrument};

use crate::{Box2, GeometryError, PolyMerge, PolyShape, Polygon};

/// A primitive that can contribute to a package outline.
pub trait Drawable {
    /// The layer the primitive lives on.
    fn layer(&self) -> i32;

    /// The primitive's closed polygon, or the end points of a line.
    ///
    /// Fewer than three points contribute no area and are skipped.
    fn polygon_or_line(&self) -> Vec<Point2<f32>>;
}

impl<T: Drawable + ?Sized> Drawable for &T {
    fn layer(&self) -> i32 {
        (**self).layer()
    }

    fn polygon_or_line(&self) -> Vec<Point2<f32>> {
        (**self).polygon_or_line()
    }
}

impl<T: Drawable + ?Sized> Drawable for Box<T> {
    fn layer(&self) -> i32 {
        (**self).layer()
    }

    fn polygon_or_line(&self) -> Vec<Point2<f32>> {
        (**self).polygon_or_line()
    }
}

/// Collects the transformed polygons of every drawable on `layers`.
///
/// `None` accepts every layer.
pub fn package_polygons<I>(
    items: I,
    xform: &Affine2<f32>,
    layers: Option<&HashSet<i32>>,
) -> Vec<Polygon>
where
    I: IntoIterator,
    I::Item: Drawable,
{
    items
        .into_iter()
        .filter(|item| layers.is_none_or(|set| set.contains(&item.layer())))
        .filter_map(|item| match Polygon::new(item.polygon_or_line()) {
            Ok(polygon) => Some(polygon.transform(xform)),
            Err(err) => {
                debug!(layer = item.layer(), %err, "skipping drawable without area");
                None
            }
        })
        .collect()
}

/// Bounds of every drawable on `layers`, lines included, in the frame given
/// by `xform`.
///
/// Returns `None` when nothing is drawn on the selected layers.
pub fn package_bounds<I>(
    items: I,
    xform: &Affine2<f32>,
    layers: Option<&HashSet<i32>>,
) -> Option<Box2>
where
    I: IntoIterator,
    I::Item: Drawable,
{
    Box2::from_points(
        items
            .into_iter()
            .filter(|item| layers.is_none_or(|set| set.contains(&item.layer())))
            .flat_map(|item| item.polygon_or_line())
            .map(|p| xform.transform_point(&p)),
    )
}

/// Unions `polygons` and merges the result into a minimal outline.
#[instrument(level = "debug", skip_all, fields(polygons = polygons.len()))]
pub fn merge_outline(polygons: &[Polygon]) -> Result<Vec<Polygon>, GeometryError> {
    let mut shape = PolyShape::new();
    shape.add_overlapping_polygons(polygons, true)?;

    let fragments = shape.to_polygons();
    let mut merge = PolyMerge::new(&fragments);
    merge.merge_polygons();

    let outline = merge.polygons();
    debug!(
        fragments = fragments.len(),
        outline = outline.len(),
        "merged outline"
    );
    Ok(outline)
}

/// Outline of every drawable on `layers`, in the frame given by `xform`.
pub fn package_outline<I>(
    items: I,
    xform: &Affine2<f32>,
    layers: Option<&HashSet<i32>>,
) -> Result<Vec<Polygon>, GeometryError>
where
    I: IntoIterator,
    I::Item: Drawable,
{
    merge_outline(&package_polygons(items, xform, layers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    struct Pad {
        layer: i32,
        points: Vec<Point2<f32>>,
    }

    impl Drawable for Pad {
        fn layer(&self) -> i32 {
            self.layer
        }

        fn polygon_or_line(&self) -> Vec<Point2<f32>> {
            self.points.clone()
        }
    }

    fn make_pad(layer: i32, min: [f32; 2], max: [f32; 2]) -> Pad {
        let rect = Polygon::rectangle(Point2::new(min[0], min[1]), Point2::new(max[0], max[1]));
        Pad {
            layer,
            points: rect.vertices().to_vec(),
        }
    }

    fn make_wire(layer: i32) -> Pad {
        Pad {
            layer,
            points: vec![Point2::new(0.0, 0.0), Point2::new(5.0, 5.0)],
        }
    }

    fn translation(x: f32, y: f32) -> Affine2<f32> {
        #[rustfmt::skip]
        let m = Matrix3::new(
            1.0, 0.0, x,
            0.0, 1.0, y,
            0.0, 0.0, 1.0,
        );
        Affine2::from_matrix_unchecked(m)
    }

    #[test]
    fn package_polygons_filters_layers_and_lines() {
        let items = vec![
            make_pad(1, [0.0, 0.0], [1.0, 1.0]),
            make_pad(2, [2.0, 0.0], [3.0, 1.0]),
            make_wire(1),
        ];
        let layers: HashSet<i32> = [1].into_iter().collect();

        let polygons = package_polygons(&items, &Affine2::identity(), Some(&layers));
        assert_eq!(polygons.len(), 1);

        let all = package_polygons(&items, &Affine2::identity(), None);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn package_polygons_applies_transform() {
        let items = [make_pad(1, [0.0, 0.0], [1.0, 1.0])];
        let polygons = package_polygons(&items, &translation(10.0, 5.0), None);
        assert_eq!(polygons[0].vertices()[0], Point2::new(10.0, 5.0));
    }

    #[test]
    fn boxed_drawables_are_accepted() {
        let items: Vec<Box<dyn Drawable>> = vec![
            Box::new(make_pad(1, [0.0, 0.0], [1.0, 1.0])),
            Box::new(make_wire(1)),
        ];
        assert_eq!(package_polygons(&items, &Affine2::identity(), None).len(), 1);
    }

    #[test]
    fn package_bounds_include_lines() {
        let items = vec![
            make_pad(1, [0.0, 0.0], [1.0, 1.0]),
            make_pad(2, [-4.0, -4.0], [-3.0, -3.0]),
            make_wire(1),
        ];
        let layers: HashSet<i32> = [1].into_iter().collect();

        let bounds = package_bounds(&items, &translation(10.0, 5.0), Some(&layers)).unwrap();
        assert_eq!(bounds.min(), Point2::new(10.0, 5.0));
        assert_eq!(bounds.max(), Point2::new(15.0, 10.0));

        let all = package_bounds(&items, &Affine2::identity(), None).unwrap();
        assert_eq!(all.min(), Point2::new(-4.0, -4.0));

        let none: HashSet<i32> = [7].into_iter().collect();
        assert!(package_bounds(&items, &Affine2::identity(), Some(&none)).is_none());
    }

    #[test]
    fn adjacent_pads_become_one_rectangle() {
        let outline = merge_outline(&[
            Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)),
            Polygon::rectangle(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0)),
        ])
        .unwrap();

        assert_eq!(
            outline,
            vec![Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0))]
        );
    }

    #[test]
    fn overlapping_pads_keep_union_area() {
        let items = [
            make_pad(1, [0.0, 0.0], [2.0, 2.0]),
            make_pad(1, [1.0, 1.0], [3.0, 3.0]),
        ];
        let outline = package_outline(&items, &Affine2::identity(), None).unwrap();

        let area: f32 = outline.iter().map(Polygon::area).sum();
        assert_relative_eq!(area, 7.0, epsilon = 1e-4);
    }

    #[test]
    fn empty_input_gives_empty_outline() {
        let items: [Pad; 0] = [];
        assert!(package_outline(&items, &Affine2::identity(), None).unwrap().is_empty());
    }
}
