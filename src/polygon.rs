//! Raw world polygons as stored by the asset loader.

use crate::float_types::Real;
use nalgebra::{Vector2, Vector3};

/// Per-corner attributes of a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexFeature {
    /// Texture coordinate before atlas scaling
    pub uv: Vector2<Real>,
    pub normal: Vector3<Real>,
    /// Baked light color, RGBA8
    pub light_color: [u8; 4],
}

impl VertexFeature {
    pub const fn new(uv: Vector2<Real>, normal: Vector3<Real>, light_color: [u8; 4]) -> Self {
        Self {
            uv,
            normal,
            light_color,
        }
    }
}

/// One n-gon face. Vertex `i` is `position_indices[i]` with `features[i]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    pub position_indices: Vec<usize>,
    pub features: Vec<VertexFeature>,
    pub material: usize,
    /// Portals mark split planes and are never rendered
    pub is_portal: bool,
}

impl Polygon {
    pub const fn new(
        position_indices: Vec<usize>,
        features: Vec<VertexFeature>,
        material: usize,
    ) -> Self {
        Self {
            position_indices,
            features,
            material,
            is_portal: false,
        }
    }

    pub const fn portal(mut self) -> Self {
        self.is_portal = true;
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.position_indices.len()
    }

    /// Number of triangles a fan over this polygon produces
    #[inline]
    pub fn fan_triangle_count(&self) -> usize {
        self.vertex_count().saturating_sub(2)
    }

    /// Corner triples of the fan anchored at corner 0: `(0, i, i + 1)`.
    ///
    /// ```rust
    /// # use bspchunk::polygon::Polygon;
    /// let pentagon = Polygon::new(vec![10, 11, 12, 13, 14], Vec::new(), 0);
    /// let fan: Vec<_> = pentagon.fan().collect();
    /// assert_eq!(fan, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    /// ```
    pub fn fan(&self) -> impl Iterator<Item = [usize; 3]> + use<> {
        (1..self.vertex_count().saturating_sub(1)).map(|i| [0, i, i + 1])
    }
}
