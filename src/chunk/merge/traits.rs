//! Trait for one iteration of the light-bounded merge

use crate::bsp::BspTree;
use crate::chunk::ChunkMap;
use crate::chunk::merge::MergeStep;
use crate::errors::CompileError;
use crate::source::LightQuery;

/// Runs one agglomeration iteration over every chunk root.
///
/// Implementations must place each root with [`place`](super::place) and
/// build their result with [`fold_buckets`](super::fold_buckets); they only
/// differ in how the per-root placements are computed. The only failure is
/// a merged submesh outgrowing its index type.
pub trait MergeOps {
    fn agglomerate_step(
        &self,
        tree: &BspTree,
        lights: &dyn LightQuery,
        light_cap: usize,
        chunks: ChunkMap,
        iteration: usize,
    ) -> Result<MergeStep, CompileError>;
}
