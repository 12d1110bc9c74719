//! Tolerances and safety bounds shared by the shape and merge passes.
//!
//! All values are tuned for board/footprint coordinates in millimetres,
//! where features are a few tenths of a millimetre or larger. Nothing here
//! is scaled to the input: very large or very small geometry may weld or
//! classify differently than expected.

/// Points within this distance of a plane are classified as on the plane.
pub const PLANE_EPSILON: f32 = 1e-3;

/// Vertices closer than this are welded into one, and a vertex this close to
/// the interior of an edge splits that edge.
pub const WELD_EPSILON: f32 = 1e-3;

/// Directions shorter than this are left unnormalized.
pub const NORMALIZE_EPSILON: f32 = 1e-4;

/// Weight of a split in the splitter score, relative to front/back imbalance.
pub const SPLIT_PENALTY: usize = 3;

/// Default bound on BSP recursion depth during build and insertion.
pub const MAX_TREE_DEPTH: usize = 1024;
