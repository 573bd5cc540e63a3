//! Leaf polygon deduplication and triangle-fan expansion

use crate::atlas::{AtlasHandle, TextureAtlasAllocator};
use crate::chunk::{ChunkGroup, ShaderClass, SubMesh};
use crate::errors::CompileError;
use crate::float_types::Real;
use crate::polygon::Polygon;
use crate::source::{TextureSource, WorldSource};
use hashbrown::HashSet;
use nalgebra::Vector4;
use std::collections::btree_map::Entry;

/// Counters kept while expanding leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandStats {
    pub nodes_visited: usize,
    pub leaves: usize,
    pub polygons_emitted: usize,
    pub portals_skipped: usize,
    pub duplicates_skipped: usize,
    pub missing_texture_skipped: usize,
    pub degenerate: usize,
    pub triangles: usize,
}

/// Emits each polygon at most once across a whole compilation.
///
/// Several leaves may reference the same polygon; the first leaf to reach it
/// in walk order claims it.
#[derive(Debug, Default)]
pub struct LeafExpander {
    claimed: HashSet<usize>,
    pub stats: ExpandStats,
}

impl LeafExpander {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_claimed(&self, polygon: usize) -> bool {
        self.claimed.contains(&polygon)
    }

    /// Expand the polygons of one leaf into `group`.
    ///
    /// Texture problems skip the polygon; malformed polygon data is fatal.
    pub fn expand_leaf<W, T>(
        &mut self,
        world: &W,
        textures: &T,
        atlas: &mut TextureAtlasAllocator,
        polygon_ids: &[usize],
        group: &mut ChunkGroup,
    ) -> Result<(), CompileError>
    where
        W: WorldSource + ?Sized,
        T: TextureSource + ?Sized,
    {
        self.stats.leaves += 1;

        for &id in polygon_ids {
            if !self.claimed.insert(id) {
                self.stats.duplicates_skipped += 1;
                continue;
            }

            let polygon = world.polygon(id).ok_or(CompileError::PolygonOutOfRange {
                index: id,
                len: world.polygon_count(),
            })?;
            if polygon.is_portal {
                self.stats.portals_skipped += 1;
                continue;
            }

            let material = world
                .material(polygon.material)
                .ok_or(CompileError::MaterialOutOfRange {
                    polygon: id,
                    material: polygon.material,
                })?;

            let handle = match atlas.resolve(material, textures) {
                Ok(handle) => handle,
                Err(err) => {
                    log::warn!("skipping polygon {id}: {err}");
                    self.stats.missing_texture_skipped += 1;
                    continue;
                },
            };

            if polygon.fan_triangle_count() == 0 {
                self.stats.degenerate += 1;
                continue;
            }

            let mesh = match group.entry(ShaderClass::from(handle.category)) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    slot.insert(SubMesh::new(handle.category, polygon.material))
                },
            };
            let triangles = emit_fan(world, id, polygon, &handle, material.animation_vector(), mesh)?;
            self.stats.polygons_emitted += 1;
            self.stats.triangles += triangles;
        }

        Ok(())
    }
}

/// Append the triangle fan of `polygon` to `mesh`, one fresh vertex per
/// triangle corner. Returns the number of triangles written.
pub fn emit_fan<W: WorldSource + ?Sized>(
    world: &W,
    id: usize,
    polygon: &Polygon,
    handle: &AtlasHandle,
    animation: Vector4<Real>,
    mesh: &mut SubMesh,
) -> Result<usize, CompileError> {
    if polygon.features.len() != polygon.position_indices.len() {
        return Err(CompileError::FeatureCountMismatch {
            polygon: id,
            positions: polygon.position_indices.len(),
            features: polygon.features.len(),
        });
    }

    let mut triangles = 0;
    for fan in polygon.fan() {
        let mut corners = [0; 3];
        for (corner, &vertex) in corners.iter_mut().zip(fan.iter()) {
            let position_index = polygon.position_indices[vertex];
            let position = world
                .position(position_index)
                .ok_or(CompileError::PositionOutOfRange {
                    polygon: id,
                    position: position_index,
                })?;
            let feature = &polygon.features[vertex];
            *corner = mesh.push_vertex(
                position,
                handle.pack_uv(&feature.uv),
                feature.normal,
                feature.light_color,
                animation,
            )?;
        }
        mesh.push_triangle(corners);
        triangles += 1;
    }
    Ok(triangles)
}
