//! Depth-first tree walk that assigns leaf geometry to chunk roots

use crate::atlas::TextureAtlasAllocator;
use crate::bsp::tree::ROOT;
use crate::chunk::ChunkMap;
use crate::chunk::expand::LeafExpander;
use crate::errors::CompileError;
use crate::source::{TextureSource, WorldSource};

/// Walk the tree pre-order (front before back) and expand every leaf into
/// the submeshes of its chunk root.
///
/// The chunk root of a branch is the first node on the way down that owns
/// geometry and is not the tree root; every leaf below it files into that
/// root's group. A tree whose root is itself a geometry-bearing leaf is
/// anchored at the root, since nothing else could hold its geometry.
///
/// Uses an explicit stack, so deep trees cannot overflow the call stack.
pub fn walk<W, T>(
    world: &W,
    textures: &T,
    atlas: &mut TextureAtlasAllocator,
    expander: &mut LeafExpander,
) -> Result<ChunkMap, CompileError>
where
    W: WorldSource + ?Sized,
    T: TextureSource + ?Sized,
{
    let tree = world.bsp_tree();
    let mut chunks = ChunkMap::new();
    if tree.is_empty() {
        return Ok(chunks);
    }

    let mut visited = vec![false; tree.len()];
    let mut stack: Vec<(usize, Option<usize>)> = vec![(ROOT, None)];

    while let Some((index, mut chunk_root)) = stack.pop() {
        let seen = visited
            .get_mut(index)
            .ok_or(CompileError::NodeOutOfRange {
                node: index,
                target: index,
                len: tree.len(),
            })?;
        if std::mem::replace(seen, true) {
            return Err(CompileError::Cycle(index));
        }

        expander.stats.nodes_visited += 1;
        let node = tree.node(index);
        if node.has_geometry() {
            if chunk_root.is_none() && index != ROOT {
                log::trace!("node {index} opens a chunk group");
                chunk_root = Some(index);
            }
            if node.is_leaf() {
                let root = chunk_root.unwrap_or(index);
                expander.expand_leaf(
                    world,
                    textures,
                    atlas,
                    tree.polygon_ids(index),
                    chunks.group_mut(root),
                )?;
            }
        }

        // back is pushed first so front is walked first
        if let Some(back) = node.back {
            stack.push((back, chunk_root));
        }
        if let Some(front) = node.front {
            stack.push((front, chunk_root));
        }
    }

    chunks.prune_empty();
    log::debug!(
        "walk: {} chunk roots, {} submeshes, {} triangles",
        chunks.root_count(),
        chunks.chunk_count(),
        chunks.triangle_count()
    );
    Ok(chunks)
}
