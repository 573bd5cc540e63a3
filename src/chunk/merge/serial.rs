//! Serial implementation of the light-bounded merge

use crate::bsp::BspTree;
use crate::chunk::ChunkMap;
use crate::chunk::merge::{Buckets, MergeOps, MergeStep, fold_buckets, place};
use crate::errors::CompileError;
use crate::source::LightQuery;

/// Places chunk roots one after another on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialMergeOps;

impl SerialMergeOps {
    pub const fn new() -> Self {
        Self
    }
}

impl MergeOps for SerialMergeOps {
    fn agglomerate_step(
        &self,
        tree: &BspTree,
        lights: &dyn LightQuery,
        light_cap: usize,
        chunks: ChunkMap,
        iteration: usize,
    ) -> Result<MergeStep, CompileError> {
        let mut buckets = Buckets::new();
        for (root, group) in chunks {
            let placement = place(tree, lights, light_cap, root);
            buckets
                .entry(placement.target)
                .or_default()
                .push((root, placement, group));
        }
        fold_buckets(buckets, iteration)
    }
}
