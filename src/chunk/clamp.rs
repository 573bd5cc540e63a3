//! Shader-height clamp: lift one shader class a fixed number of tree levels
//!
//! Water surfaces are large and sparse, and the light-bounded merge rarely
//! helps them. Lifting every water chunk `limit` levels and concatenating
//! whatever meets on the same ancestor yields a few big water meshes instead
//! of many small ones.

use crate::bsp::BspTree;
use crate::chunk::{ChunkGroup, ChunkMap, ShaderClass, SubMesh, file_submesh};
use crate::errors::CompileError;
use std::collections::BTreeMap;

/// Move every `shader` submesh to the ancestor `limit` levels above its root
/// (or the tree root when fewer levels exist), concatenating all submeshes
/// that reach the same ancestor in ascending source-root order. Other shader
/// classes are left where they are.
pub fn clamp_shader_height(
    tree: &BspTree,
    chunks: ChunkMap,
    shader: ShaderClass,
    limit: usize,
) -> Result<ChunkMap, CompileError> {
    let mut kept = ChunkMap::new();
    let mut lifted: BTreeMap<usize, Vec<SubMesh>> = BTreeMap::new();

    // ChunkMap iterates roots in ascending order, so each ancestor's list is
    // already sorted by source root.
    for (root, mut group) in chunks {
        if let Some(mesh) = group.remove(&shader) {
            let (ancestor, _) = tree.ancestor(root, limit);
            lifted.entry(ancestor).or_default().push(mesh);
        }
        if !group.is_empty() {
            kept.insert_group(root, group)?;
        }
    }

    let lifted_count: usize = lifted.values().map(Vec::len).sum();
    let ancestors = lifted.len();
    for (ancestor, meshes) in lifted {
        let mut group = ChunkGroup::new();
        meshes
            .into_iter()
            .try_for_each(|mesh| file_submesh(&mut group, mesh))?;
        kept.insert_group(ancestor, group)?;
    }

    log::debug!(
        "height clamp ({}, limit {limit}): {lifted_count} chunks -> {ancestors}",
        shader.name()
    );
    Ok(kept)
}
