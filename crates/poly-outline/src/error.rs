//! Error types for shape and merge operations.

use thiserror::Error;

use crate::PlaneSide;

/// Errors that can occur while building or querying outline geometry.
///
/// Degenerate polygons and unmatched shared edges are not errors: the former
/// are dropped during subdivision and the latter simply stay unmerged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A clip was requested with a side other than `Front` or `Back`.
    #[error("side to delete must be Front or Back, got {0:?}")]
    InvalidSide(PlaneSide),

    /// A polygon needs at least three vertices.
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices {
        /// Number of vertices supplied.
        count: usize,
    },

    /// Building or inserting into the BSP tree went deeper than allowed.
    #[error("BSP recursion exceeded the depth limit of {limit}")]
    DepthLimitExceeded {
        /// The configured maximum depth.
        limit: usize,
    },

    /// The splitter selector returned no usable edge.
    #[error("splitter selector did not pick an edge")]
    NoSplitter,

    /// A half-edge ring or opposite link is inconsistent.
    #[error("broken half-edge topology: {0}")]
    BrokenTopology(String),
}
