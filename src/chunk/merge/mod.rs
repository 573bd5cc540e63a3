//! Light-bounded agglomeration of chunk roots
//!
//! Each iteration looks at every chunk root `r` with parent `p` and
//! grandparent `g`. When fewer than `light_cap` lights touch `p`'s bounds,
//! `r`'s submeshes are filed under `g`; otherwise they stay at `r`.
//! Submeshes of the same shader class landing on one node are concatenated
//! in ascending source-root order, so the lowest root's buffers survive and
//! the others are appended to them. A chunk that lands alone is simply
//! carried upward.
//!
//! Iterations repeat while the number of chunk roots keeps going down. The
//! first iteration that does not lower it is thrown away, carries included,
//! and the mapping before it is the result. This is a loose merge driven by
//! tree adjacency, not a bin-packing optimum; in exchange it needs at most
//! about half the tree depth iterations.
//!
//! The per-root work is implemented by [`MergeOps`]: [`SerialMergeOps`], and
//! `ParallelMergeOps` on rayon when the `parallel` feature is enabled.

pub mod serial;
pub mod traits;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use serial::SerialMergeOps;
pub use traits::MergeOps;

#[cfg(feature = "parallel")]
pub use parallel::ParallelMergeOps;

use crate::bsp::BspTree;
use crate::chunk::compiler::CancelToken;
use crate::chunk::{ChunkGroup, ChunkMap, ShaderClass, file_submesh};
use crate::errors::CompileError;
use crate::source::LightQuery;
use std::collections::BTreeMap;

/// Where one chunk root's submeshes go in an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub target: usize,
    /// Parent whose bounds were queried, if the query ran
    pub parent: Option<usize>,
    pub light_count: Option<usize>,
}

impl Placement {
    const fn stay(root: usize) -> Self {
        Self {
            target: root,
            parent: None,
            light_count: None,
        }
    }

    #[inline]
    pub const fn moves_from(&self, root: usize) -> bool {
        self.target != root
    }
}

/// Decide where `root`'s submeshes go.
///
/// The light query is skipped when no grandparent exists or the cap is zero,
/// since neither case can lead to a move.
pub fn place(tree: &BspTree, lights: &dyn LightQuery, light_cap: usize, root: usize) -> Placement {
    if light_cap == 0 {
        return Placement::stay(root);
    }
    let Some(parent) = tree.parent(root) else {
        return Placement::stay(root);
    };
    let Some(grandparent) = tree.parent(parent) else {
        return Placement::stay(root);
    };

    let light_count = lights.count_lights_in_bounds(tree.bounds(parent));
    Placement {
        target: if light_count < light_cap { grandparent } else { root },
        parent: Some(parent),
        light_count: Some(light_count),
    }
}

/// One submesh moved by the light-bounded merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRecord {
    pub iteration: usize,
    pub shader: ShaderClass,
    pub from: usize,
    pub to: usize,
    /// Node whose bounds were queried to allow the move
    pub parent: usize,
    pub light_count: usize,
    /// `true` when it was concatenated with another submesh at `to`,
    /// `false` when it was carried alone
    pub merged: bool,
}

/// Output of one iteration.
#[derive(Debug, Clone, Default)]
pub struct MergeStep {
    pub chunks: ChunkMap,
    pub records: Vec<MergeRecord>,
}

impl MergeStep {
    #[inline]
    pub fn moved(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Target node → every `(source root, placement, group)` that lands there.
pub type Buckets = BTreeMap<usize, Vec<(usize, Placement, ChunkGroup)>>;

/// Fold the buckets filled by one iteration into the next mapping.
///
/// Sources are sorted by root index first, so the result does not depend on
/// the order workers filled the buckets in.
pub fn fold_buckets(buckets: Buckets, iteration: usize) -> Result<MergeStep, CompileError> {
    let mut step = MergeStep::default();

    for (target, mut sources) in buckets {
        sources.sort_unstable_by_key(|(root, _, _)| *root);

        let mut arrivals: BTreeMap<ShaderClass, usize> = BTreeMap::new();
        sources
            .iter()
            .flat_map(|(_, _, group)| group.keys())
            .for_each(|shader| *arrivals.entry(*shader).or_default() += 1);

        let mut folded = ChunkGroup::new();
        for (root, placement, group) in sources {
            for (shader, mesh) in group {
                if placement.moves_from(root) {
                    step.records.push(MergeRecord {
                        iteration,
                        shader,
                        from: root,
                        to: target,
                        parent: placement.parent.unwrap_or(target),
                        light_count: placement.light_count.unwrap_or_default(),
                        merged: arrivals[&shader] > 1,
                    });
                }
                file_submesh(&mut folded, mesh)?;
            }
        }
        step.chunks.insert_group(target, folded)?;
    }

    Ok(step)
}

/// Result of running the merge to its fixed point.
#[derive(Debug, Clone, Default)]
pub struct Agglomerated {
    pub chunks: ChunkMap,
    /// Iterations run, including the final one that was thrown away
    pub iterations: usize,
    /// Moves of the kept iterations only
    pub records: Vec<MergeRecord>,
}

/// Run [`MergeOps::agglomerate_step`] until the chunk-root count stops
/// decreasing, and return the last mapping that lowered it.
///
/// Running the result through again therefore changes nothing. A kept
/// iteration moves every root whose parent is dim enough two levels up, and
/// a root that stays once stays for good, so `tree.depth() + 1` iterations
/// always suffice; running out means the step is broken and is reported as
/// [`CompileError::MergeDidNotConverge`]. The cancel token is checked before
/// each iteration; every iteration leaves a complete mapping behind, so
/// stopping between them needs no cleanup.
pub fn agglomerate(
    ops: &impl MergeOps,
    tree: &BspTree,
    lights: &dyn LightQuery,
    light_cap: usize,
    mut chunks: ChunkMap,
    cancel: &CancelToken,
) -> Result<Agglomerated, CompileError> {
    let max_iterations = tree.depth() + 1;
    let mut records = Vec::new();

    for iteration in 0..max_iterations {
        cancel.check()?;

        let roots_before = chunks.root_count();
        let step = ops.agglomerate_step(tree, lights, light_cap, chunks.clone(), iteration)?;
        let roots_after = step.chunks.root_count();
        log::debug!(
            "merge iteration {iteration}: {roots_before} -> {roots_after} chunk roots, {} submeshes moved",
            step.records.len()
        );

        if roots_after >= roots_before {
            return Ok(Agglomerated {
                chunks,
                iterations: iteration + 1,
                records,
            });
        }
        chunks = step.chunks;
        records.extend(step.records);
    }

    debug_assert!(
        false,
        "light-bounded merge still lowering the root count after {max_iterations} iterations"
    );
    Err(CompileError::MergeDidNotConverge {
        iterations: max_iterations,
    })
}
