//! 2D outline engine: BSP polygon union followed by half-edge contour merging.
//!
//! Primitive polygons are unioned into a [`PolyShape`], whose boundary is
//! extracted as a flat list of fragments and spliced back together by
//! [`PolyMerge`]. The [`outline`] module wires the two passes together.

mod bounds;
pub mod config;
mod cuttable;
mod edge;
mod error;
pub mod merge;
pub mod outline;
mod plane;
mod polygon;
pub mod shape;

pub use bounds::Box2;
pub use cuttable::Cuttable;
pub use edge::{Edge, closest_point_on_segment, distance_to_segment};
pub use error::GeometryError;
pub use merge::PolyMerge;
pub use outline::{Drawable, merge_outline, package_bounds, package_outline, package_polygons};
pub use plane::{Plane2, PlaneSide, perp};
pub use polygon::Polygon;
pub use shape::{
    BalancedSplitter, CollectingVisitor, FirstEdge, FnVisitor, NodeId, PolyShape,
    SplitterSelector, TreeNode, TreeVisitor,
};
