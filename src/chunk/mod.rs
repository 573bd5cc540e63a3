//! Compiling a BSP tree into a handful of large per-shader mesh chunks
//!
//! The pipeline is:
//! 1. [`walk`]: depth-first walk that expands leaf polygons into per-shader
//!    [`SubMesh`]es grouped under the shallowest geometry-bearing ancestor
//!    (the *chunk root*).
//! 2. [`merge`]: light-bounded agglomeration, folding chunk roots into their
//!    grandparents while that keeps lowering the number of chunk roots.
//! 3. [`clamp`]: lifts every chunk of one shader class a fixed number of
//!    levels and concatenates whatever lands on the same ancestor.
//! 4. [`compiler::finalize`]: flattens the mapping into renderer-ready chunks.

pub mod clamp;
pub mod compiler;
pub mod expand;
pub mod merge;
pub mod submesh;
pub mod walk;

pub use compiler::{CancelToken, Chunk, ChunkCompiler, CompileOutput, CompileStats};
pub use submesh::SubMesh;

use crate::atlas::AtlasCategory;
use crate::errors::CompileError;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Shader a chunk is drawn with; one per atlas category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShaderClass {
    WorldLit,
    AlphaCutout,
    Water,
}

impl ShaderClass {
    #[inline]
    pub const fn category(self) -> AtlasCategory {
        match self {
            Self::WorldLit => AtlasCategory::Opaque,
            Self::AlphaCutout => AtlasCategory::Transparent,
            Self::Water => AtlasCategory::Water,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::WorldLit => "world-lit",
            Self::AlphaCutout => "alpha-cutout",
            Self::Water => "water",
        }
    }
}

impl From<AtlasCategory> for ShaderClass {
    fn from(category: AtlasCategory) -> Self {
        match category {
            AtlasCategory::Opaque => Self::WorldLit,
            AtlasCategory::Transparent => Self::AlphaCutout,
            AtlasCategory::Water => Self::Water,
        }
    }
}

/// The submeshes filed under one chunk root, at most one per shader class.
pub type ChunkGroup = BTreeMap<ShaderClass, SubMesh>;

/// Add `mesh` to `group`, appending to an existing submesh of the same class.
pub fn file_submesh(group: &mut ChunkGroup, mesh: SubMesh) -> Result<(), CompileError> {
    match group.entry(mesh.shader()) {
        Entry::Vacant(slot) => {
            slot.insert(mesh);
            Ok(())
        },
        Entry::Occupied(slot) => slot.into_mut().append(mesh),
    }
}

/// Chunk root → submeshes. Ordered by node index so every pass that
/// iterates it is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMap {
    roots: BTreeMap<usize, ChunkGroup>,
}

impl ChunkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The group for `root`, created empty if missing
    pub fn group_mut(&mut self, root: usize) -> &mut ChunkGroup {
        self.roots.entry(root).or_default()
    }

    pub fn get(&self, root: usize) -> Option<&ChunkGroup> {
        self.roots.get(&root)
    }

    /// File every submesh of `group` under `root`
    pub fn insert_group(&mut self, root: usize, group: ChunkGroup) -> Result<(), CompileError> {
        let target = self.group_mut(root);
        group
            .into_values()
            .try_for_each(|mesh| file_submesh(target, mesh))
    }

    /// Drop roots left without geometry
    pub fn prune_empty(&mut self) {
        self.roots.retain(|_, group| {
            group.retain(|_, mesh| !mesh.is_empty());
            !group.is_empty()
        });
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.roots.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ChunkGroup)> {
        self.roots.iter().map(|(root, group)| (*root, group))
    }

    /// Every submesh with its root, in root then shader order
    pub fn submeshes(&self) -> impl Iterator<Item = (usize, &SubMesh)> {
        self.iter()
            .flat_map(|(root, group)| group.values().map(move |mesh| (root, mesh)))
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.roots.values().map(BTreeMap::len).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes().map(|(_, mesh)| mesh.triangle_count()).sum()
    }

    pub fn chunk_count_of(&self, shader: ShaderClass) -> usize {
        self.roots
            .values()
            .filter(|group| group.contains_key(&shader))
            .count()
    }
}

impl IntoIterator for ChunkMap {
    type Item = (usize, ChunkGroup);
    type IntoIter = std::collections::btree_map::IntoIter<usize, ChunkGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.into_iter()
    }
}
