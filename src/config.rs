//! Per-compilation configuration

use crate::chunk::ShaderClass;
use crate::errors::CompileError;

/// Knobs passed in by the caller for one compilation.
///
/// ```rust
/// # use bspchunk::config::CompilerConfig;
/// let config = CompilerConfig::default().with_lighting(false).with_light_cap(8);
/// assert_eq!(config.light_cap, 8);
/// // lighting off disables light-bounded merging altogether
/// assert_eq!(config.effective_light_cap(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompilerConfig {
    pub lighting_enabled: bool,
    /// A region may be merged upward while fewer lights than this touch it
    pub light_cap: usize,
    /// How far the height-clamp pass lifts chunks of `height_clamped_shader`
    pub water_tree_height_limit: usize,
    /// Texture side length that maps to a UV scale of 1.0
    pub reference_atlas_size: u32,
    /// Larger textures lose mip levels until they fit
    pub max_atlas_texture_size: u32,
    /// Shader class the height-clamp pass applies to; `None` skips the pass
    pub height_clamped_shader: Option<ShaderClass>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            lighting_enabled: true,
            light_cap: 16,
            water_tree_height_limit: 3,
            reference_atlas_size: 1024,
            max_atlas_texture_size: 1024,
            height_clamped_shader: Some(ShaderClass::Water),
        }
    }
}

impl CompilerConfig {
    pub const fn with_lighting(mut self, enabled: bool) -> Self {
        self.lighting_enabled = enabled;
        self
    }

    pub const fn with_light_cap(mut self, cap: usize) -> Self {
        self.light_cap = cap;
        self
    }

    pub const fn with_water_height_limit(mut self, limit: usize) -> Self {
        self.water_tree_height_limit = limit;
        self
    }

    pub const fn with_atlas_sizes(mut self, reference: u32, max_texture: u32) -> Self {
        self.reference_atlas_size = reference;
        self.max_atlas_texture_size = max_texture;
        self
    }

    pub const fn with_height_clamped_shader(mut self, shader: Option<ShaderClass>) -> Self {
        self.height_clamped_shader = shader;
        self
    }

    /// Cap actually used by the light-bounded merge. Zero when lighting is
    /// disabled, which turns that pass into a no-op.
    #[inline]
    pub const fn effective_light_cap(&self) -> usize {
        if self.lighting_enabled {
            self.light_cap
        } else {
            0
        }
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.reference_atlas_size == 0 {
            return Err(CompileError::InvalidConfig(
                "reference_atlas_size must be non-zero".into(),
            ));
        }
        if self.max_atlas_texture_size == 0 {
            return Err(CompileError::InvalidConfig(
                "max_atlas_texture_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
