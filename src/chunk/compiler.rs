//! Top-level driver: walk, merge, clamp, finalize

use crate::aabb::Aabb;
use crate::atlas::{AtlasCategory, AtlasLayout, TextureAtlasAllocator};
use crate::chunk::clamp::clamp_shader_height;
use crate::chunk::expand::{ExpandStats, LeafExpander};
use crate::chunk::merge::{MergeOps, MergeRecord, agglomerate};
use crate::chunk::walk::walk;
use crate::chunk::{ChunkMap, ShaderClass, SubMesh};
use crate::config::CompilerConfig;
use crate::errors::CompileError;
use crate::source::{LightQuery, TextureSource, WorldSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag for abandoning a compilation, e.g. on scene unload.
///
/// Checked before the walk and between merge iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<(), CompileError> {
        if self.is_cancelled() {
            Err(CompileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A finished chunk: one draw unit for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Node the chunk ended up anchored at
    pub root: usize,
    pub mesh: SubMesh,
}

impl Chunk {
    #[inline]
    pub fn shader(&self) -> ShaderClass {
        self.mesh.shader()
    }

    #[inline]
    pub fn category(&self) -> AtlasCategory {
        self.mesh.category
    }

    #[inline]
    pub fn material(&self) -> usize {
        self.mesh.material
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.mesh.bounds()
    }
}

/// What happened during one compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileStats {
    pub expand: ExpandStats,
    pub roots_after_walk: usize,
    pub roots_after_merge: usize,
    pub roots_after_clamp: usize,
    pub chunks: usize,
    pub merge_iterations: usize,
    pub merge_records: Vec<MergeRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    /// Surviving chunks, ordered by root then shader class
    pub chunks: Vec<Chunk>,
    pub atlas: AtlasLayout,
    pub stats: CompileStats,
}

impl CompileOutput {
    pub fn triangle_count(&self) -> usize {
        self.chunks.iter().map(Chunk::triangle_count).sum()
    }

    pub fn chunks_of(&self, shader: ShaderClass) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().filter(move |c| c.shader() == shader)
    }
}

/// Flatten the mapping into chunks, reversing every buffer in place.
pub fn finalize(chunks: ChunkMap) -> Vec<Chunk> {
    chunks
        .into_iter()
        .flat_map(|(root, group)| {
            group.into_values().map(move |mut mesh| {
                mesh.reverse();
                Chunk { root, mesh }
            })
        })
        .collect()
}

/// Compiles a BSP world into renderer-ready chunks.
///
/// ```rust
/// # use bspchunk::prelude::*;
/// # use nalgebra::{Point3, Vector2, Vector3};
/// let bb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// let mut tree = TreeBuilder::new(bb, &[]);
/// tree.add_front(0, bb, &[0]);
/// let feature = VertexFeature::new(Vector2::zeros(), Vector3::z(), [255; 4]);
/// let world = WorldData::new(
///     tree.build(),
///     vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
///     vec![Polygon::new(vec![0, 1, 2], vec![feature; 3], 0)],
///     vec![Material::new("floor")],
/// );
/// let mut textures = TextureTable::new();
/// textures.insert("floor", TextureMetadata::new(256, 256, 9, PixelFormat::Bc1));
///
/// let output = ChunkCompiler::default()
///     .compile(&world, &textures, &PointLights::default())
///     .unwrap();
/// assert_eq!(output.chunks.len(), 1);
/// assert_eq!(output.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChunkCompiler {
    config: CompilerConfig,
    cancel: CancelToken,
}

impl ChunkCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub const fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile with the default merge implementation
    #[cfg(not(feature = "parallel"))]
    pub fn compile<W, T>(
        &self,
        world: &W,
        textures: &T,
        lights: &dyn LightQuery,
    ) -> Result<CompileOutput, CompileError>
    where
        W: WorldSource + ?Sized,
        T: TextureSource + ?Sized,
    {
        self.compile_with(&crate::chunk::merge::SerialMergeOps::new(), world, textures, lights)
    }

    #[cfg(feature = "parallel")]
    pub fn compile<W, T>(
        &self,
        world: &W,
        textures: &T,
        lights: &dyn LightQuery,
    ) -> Result<CompileOutput, CompileError>
    where
        W: WorldSource + ?Sized,
        T: TextureSource + ?Sized,
    {
        self.compile_with(&crate::chunk::merge::ParallelMergeOps::new(), world, textures, lights)
    }

    /// Compile with an explicit merge implementation
    pub fn compile_with<W, T>(
        &self,
        ops: &impl MergeOps,
        world: &W,
        textures: &T,
        lights: &dyn LightQuery,
    ) -> Result<CompileOutput, CompileError>
    where
        W: WorldSource + ?Sized,
        T: TextureSource + ?Sized,
    {
        self.config.validate()?;
        self.cancel.check()?;

        let tree = world.bsp_tree();
        tree.validate(world.polygon_count())?;

        let mut atlas = TextureAtlasAllocator::new(
            self.config.reference_atlas_size,
            self.config.max_atlas_texture_size,
        );
        let mut expander = LeafExpander::new();
        let chunks = walk(world, textures, &mut atlas, &mut expander)?;

        let mut stats = CompileStats {
            expand: expander.stats,
            roots_after_walk: chunks.root_count(),
            ..Default::default()
        };

        let merged = agglomerate(
            ops,
            tree,
            lights,
            self.config.effective_light_cap(),
            chunks,
            &self.cancel,
        )?;
        stats.roots_after_merge = merged.chunks.root_count();
        stats.merge_iterations = merged.iterations;
        stats.merge_records = merged.records;

        let chunks = match self.config.height_clamped_shader {
            Some(shader) => clamp_shader_height(
                tree,
                merged.chunks,
                shader,
                self.config.water_tree_height_limit,
            )?,
            None => merged.chunks,
        };
        stats.roots_after_clamp = chunks.root_count();

        let chunks = finalize(chunks);
        stats.chunks = chunks.len();

        log::info!(
            "compiled {} polygons into {} chunks ({} triangles, {} atlas textures, {} merge iterations)",
            stats.expand.polygons_emitted,
            stats.chunks,
            stats.expand.triangles,
            atlas.len(),
            stats.merge_iterations
        );

        Ok(CompileOutput {
            chunks,
            atlas: atlas.into_layout(),
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(CompileError::Cancelled));
    }

    #[test]
    fn finalize_orders_by_root_then_shader() {
        let mut map = ChunkMap::new();
        for (root, category) in [
            (7, AtlasCategory::Water),
            (3, AtlasCategory::Transparent),
            (3, AtlasCategory::Opaque),
        ] {
            let mut mesh = SubMesh::new(category, 0);
            mesh.push_triangle([0, 0, 0]);
            map.group_mut(root).insert(mesh.shader(), mesh);
        }
        let order: Vec<_> = finalize(map)
            .iter()
            .map(|c| (c.root, c.shader()))
            .collect();
        assert_eq!(
            order,
            vec![
                (3, ShaderClass::WorldLit),
                (3, ShaderClass::AlphaCutout),
                (7, ShaderClass::Water)
            ]
        );
    }
}
