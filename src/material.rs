//! Materials referenced by world polygons

use crate::float_types::Real;
use nalgebra::{Vector2, Vector4};

/// Coarse material grouping supplied by the asset loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaterialGroup {
    #[default]
    Default,
    /// Always packed into the water atlas, whatever its pixel format
    Water,
}

/// Linear UV scroll animation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UvScroll {
    pub direction: Vector2<Real>,
    pub frame_count: u32,
    pub fps: Real,
}

impl UvScroll {
    /// Per-vertex animation channel: `(dir.x, dir.y, frame_count, fps)`
    pub fn as_vector(&self) -> Vector4<Real> {
        Vector4::new(
            self.direction.x,
            self.direction.y,
            self.frame_count as Real,
            self.fps,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    /// Key the texture loader knows this material's texture by
    pub texture_key: String,
    pub group: MaterialGroup,
    pub scroll: Option<UvScroll>,
}

impl Material {
    pub fn new(texture_key: impl Into<String>) -> Self {
        Self {
            texture_key: texture_key.into(),
            group: MaterialGroup::Default,
            scroll: None,
        }
    }

    pub fn water(texture_key: impl Into<String>) -> Self {
        Self {
            group: MaterialGroup::Water,
            ..Self::new(texture_key)
        }
    }

    pub fn with_scroll(mut self, scroll: UvScroll) -> Self {
        self.scroll = Some(scroll);
        self
    }

    #[inline]
    pub fn is_water(&self) -> bool {
        self.group == MaterialGroup::Water
    }

    /// Animation vector baked into every vertex using this material
    pub fn animation_vector(&self) -> Vector4<Real> {
        self.scroll
            .as_ref()
            .map_or_else(Vector4::zeros, UvScroll::as_vector)
    }
}
