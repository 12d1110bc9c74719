//! Binary Space Partitioning tree for 2D solid regions.
//!
//! [`PolyShape`] partitions the plane along the lines of its boundary
//! edges. The tree supports:
//!
//! - Point containment and polygon clipping against the region
//! - Incremental union of overlapping polygons
//! - Boundary extraction by clipping the bounding quad
//!
//! # Example
//!
//! ```ignore
//! use poly_outline::{PolyShape, Polygon};
//! use nalgebra::Point2;
//!
//! let mut shape = PolyShape::new();
//! shape.add_overlapping_polygons(&[
//!     Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)),
//!     Polygon::rectangle(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0)),
//! ], true)?;
//!
//! assert!(shape.point_inside(Point2::new(1.5, 0.5)));
//! let boundary = shape.to_polygons();
//! ```
//!
//! # Architecture
//!
//! - [`PolyShape`]: The arena holding every node, plus the root and bounds
//! - [`TreeNode`]: A splitter edge, its plane and optional children
//! - [`SplitterSelector`]: Strategy trait for choosing splitter edges
//! - [`TreeVisitor`]: Visitor trait for walking the tree

mod node;
mod selector;
mod tree;
mod visitor;

pub use node::{NodeId, TreeNode, faces_same_direction};
pub use selector::{BalancedSplitter, FirstEdge, SplitterSelector, splitter_score};
pub use tree::PolyShape;
pub use visitor::{CollectingVisitor, FnVisitor, TreeVisitor};
