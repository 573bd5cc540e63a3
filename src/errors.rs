//! Compilation errors

/// Fatal problems that abort a compilation.
///
/// Everything here is either malformed input data (the BSP tree and polygon
/// tables are assumed to be well formed) or a caller decision such as
/// cancellation. Per-polygon problems are *not* fatal, see [`AtlasError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The tree has no nodes, or node 0 has a parent
    #[error("BSP tree has no root node (node 0 must exist and have no parent)")]
    MissingRoot,
    /// A node refers to a node index that does not exist
    #[error("node {node} references node {target}, but the tree only has {len} nodes")]
    NodeOutOfRange { node: usize, target: usize, len: usize },
    /// A node's stored index differs from its position in the arena
    #[error("node at arena position {position} claims index {stored}")]
    IndexMismatch { position: usize, stored: usize },
    /// A child's parent pointer disagrees with the node that links to it
    #[error("node {node} is inconsistent with its parent/child links (expected parent {expected:?}, found {found:?})")]
    ParentMismatch {
        node: usize,
        expected: Option<usize>,
        found: Option<usize>,
    },
    /// A node was reached twice during traversal, or not at all
    #[error("node {0} is reachable more than once or not at all; the BSP tree contains a cycle or shared subtree")]
    Cycle(usize),
    /// A node's polygon range runs past the polygon index array
    #[error("node {node} polygon range {start}..{end} exceeds the {len} polygon indices")]
    PolygonRangeOutOfBounds {
        node: usize,
        start: usize,
        end: usize,
        len: usize,
    },
    /// A polygon index does not name a polygon
    #[error("polygon index {index} is out of range ({len} polygons)")]
    PolygonOutOfRange { index: usize, len: usize },
    /// A polygon's material index does not name a material
    #[error("polygon {polygon} references missing material {material}")]
    MaterialOutOfRange { polygon: usize, material: usize },
    /// A polygon references a missing vertex position
    #[error("polygon {polygon} references missing position {position}")]
    PositionOutOfRange { polygon: usize, position: usize },
    /// A polygon has a different number of features than positions
    #[error("polygon {polygon} has {positions} positions but {features} vertex features")]
    FeatureCountMismatch {
        polygon: usize,
        positions: usize,
        features: usize,
    },
    /// Configuration rejected by `CompilerConfig::validate`
    #[error("invalid compiler configuration: {0}")]
    InvalidConfig(String),
    /// A submesh grew past what its index type can address
    #[error("vertex index {index} does not fit the triangle index type")]
    IndexOverflow { index: usize },
    /// Light-bounded agglomeration kept moving chunks past the iteration cap
    #[error("light-bounded merge did not reach a fixed point after {iterations} iterations")]
    MergeDidNotConverge { iterations: usize },
    /// The compilation was abandoned through its cancel token
    #[error("compilation cancelled")]
    Cancelled,
}

/// Reasons a material could not be given an atlas slot.
///
/// The polygon using the material is skipped; the compilation continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtlasError {
    /// The asset loader has no metadata for this texture key
    #[error("texture '{0}' not found")]
    TextureNotFound(String),
    /// The metadata exists but describes an unusable texture
    #[error("texture '{key}' is unusable: {reason}")]
    InvalidTexture { key: String, reason: String },
}
