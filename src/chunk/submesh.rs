//! Per-shader mesh buffers accumulated under a chunk root

use crate::aabb::Aabb;
use crate::atlas::AtlasCategory;
use crate::chunk::ShaderClass;
use crate::errors::CompileError;
use crate::float_types::{Index, Real};
use nalgebra::{Point3, Vector3, Vector4};

/// `vertex` as a triangle index, if the index type can hold it
fn index_of(vertex: usize) -> Result<Index, CompileError> {
    Index::try_from(vertex).map_err(|_| CompileError::IndexOverflow { index: vertex })
}

/// One renderable batch: parallel per-vertex arrays plus a triangle list.
///
/// Vertices are never shared between triangles, because atlas slot and mip
/// data are baked into each vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub category: AtlasCategory,
    /// Material of the first polygon that created this submesh
    pub material: usize,
    pub positions: Vec<Point3<Real>>,
    pub indices: Vec<Index>,
    /// `(u, v, atlas slot, max mip level)`
    pub uvs: Vec<Vector4<Real>>,
    pub normals: Vec<Vector3<Real>>,
    pub light_colors: Vec<[u8; 4]>,
    /// `(dir.x, dir.y, frame count, fps)`, zero when not animated
    pub animations: Vec<Vector4<Real>>,
}

impl SubMesh {
    pub const fn new(category: AtlasCategory, material: usize) -> Self {
        Self {
            category,
            material,
            positions: Vec::new(),
            indices: Vec::new(),
            uvs: Vec::new(),
            normals: Vec::new(),
            light_colors: Vec::new(),
            animations: Vec::new(),
        }
    }

    #[inline]
    pub fn shader(&self) -> ShaderClass {
        ShaderClass::from(self.category)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append one vertex record and return its index
    pub fn push_vertex(
        &mut self,
        position: Point3<Real>,
        uv: Vector4<Real>,
        normal: Vector3<Real>,
        light_color: [u8; 4],
        animation: Vector4<Real>,
    ) -> Result<Index, CompileError> {
        let index = index_of(self.positions.len())?;
        self.positions.push(position);
        self.uvs.push(uv);
        self.normals.push(normal);
        self.light_colors.push(light_color);
        self.animations.push(animation);
        Ok(index)
    }

    pub fn push_triangle(&mut self, triangle: [Index; 3]) {
        self.indices.extend_from_slice(&triangle);
    }

    /// Triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [Index; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Triangles as position triples
    pub fn triangle_positions(&self) -> impl Iterator<Item = [Point3<Real>; 3]> + '_ {
        self.triangles()
            .map(|t| t.map(|i| self.positions[i as usize]))
    }

    /// Move `other`'s buffers onto the end of this one. Indices of `other` are
    /// offset by this mesh's prior vertex count; `self` keeps its material.
    ///
    /// Fails without touching either mesh when the combined vertices could
    /// not all be indexed.
    pub fn append(&mut self, mut other: SubMesh) -> Result<(), CompileError> {
        debug_assert_eq!(self.category, other.category);
        let offset = index_of(self.positions.len())?;
        index_of((self.positions.len() + other.positions.len()).saturating_sub(1))?;
        self.positions.append(&mut other.positions);
        self.uvs.append(&mut other.uvs);
        self.normals.append(&mut other.normals);
        self.light_colors.append(&mut other.light_colors);
        self.animations.append(&mut other.animations);
        self.indices
            .extend(other.indices.into_iter().map(|i| i + offset));
        Ok(())
    }

    /// Reverse every per-vertex array in place, together with the triangle
    /// list.
    ///
    /// Triangles are reversed as whole units and their corners remapped, so
    /// each triangle still names the same three vertices in the same order
    /// and winding is unchanged.
    pub fn reverse(&mut self) {
        // push_vertex and append keep every vertex indexable
        let last = match self.positions.len() {
            0 => return,
            n => (n - 1) as Index,
        };
        self.positions.reverse();
        self.uvs.reverse();
        self.normals.reverse();
        self.light_colors.reverse();
        self.animations.reverse();

        self.indices.reverse();
        for triangle in self.indices.chunks_exact_mut(3) {
            triangle.reverse();
            triangle.iter_mut().for_each(|i| *i = last - *i);
        }
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }
}
