//! Parallel implementation of the light-bounded merge

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::bsp::BspTree;
use crate::chunk::merge::{Buckets, MergeOps, MergeStep, fold_buckets, place};
use crate::chunk::{ChunkGroup, ChunkMap};
use crate::errors::CompileError;
use crate::source::LightQuery;
use std::sync::{Mutex, PoisonError};

/// Places chunk roots on the rayon pool.
///
/// Light queries dominate the cost, so workers share one coarse lock around
/// the output buckets. Each worker owns the roots it was handed; nobody reads
/// the buckets until every worker is done.
#[cfg(feature = "parallel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelMergeOps;

#[cfg(feature = "parallel")]
impl ParallelMergeOps {
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(feature = "parallel")]
impl MergeOps for ParallelMergeOps {
    fn agglomerate_step(
        &self,
        tree: &BspTree,
        lights: &dyn LightQuery,
        light_cap: usize,
        chunks: ChunkMap,
        iteration: usize,
    ) -> Result<MergeStep, CompileError> {
        let buckets = Mutex::new(Buckets::new());
        let roots: Vec<(usize, ChunkGroup)> = chunks.into_iter().collect();

        roots.into_par_iter().for_each(|(root, group)| {
            let placement = place(tree, lights, light_cap, root);
            buckets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(placement.target)
                .or_default()
                .push((root, placement, group));
        });

        fold_buckets(
            buckets.into_inner().unwrap_or_else(PoisonError::into_inner),
            iteration,
        )
    }
}
