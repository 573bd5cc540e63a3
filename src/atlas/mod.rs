//! Texture-atlas index allocation
//!
//! Every distinct texture key gets a stable slot in one of three texture
//! arrays ([`AtlasCategory`]). Slots are handed out lazily, in the order the
//! compiler first meets each key, so a deterministic walk yields a
//! deterministic atlas. Pixel storage is the renderer's business; this module
//! only decides *where* a texture goes and how UVs must be scaled to sample it.

pub mod texture;

use crate::errors::AtlasError;
use crate::float_types::{Real, real_from_u32};
use crate::material::Material;
use crate::source::TextureSource;
use hashbrown::HashMap;
use nalgebra::{Vector2, Vector4};
use texture::{PixelFormat, TextureMetadata};

/// Which texture array a texture is packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AtlasCategory {
    Opaque,
    Transparent,
    Water,
}

impl AtlasCategory {
    pub const ALL: [AtlasCategory; 3] = [Self::Opaque, Self::Transparent, Self::Water];

    /// Water materials always go to the water array; everything else is
    /// decided by pixel format, with unknown formats treated as transparent.
    pub fn classify(material: &Material, pixel_format: PixelFormat) -> Self {
        if material.is_water() {
            Self::Water
        } else if pixel_format.is_block_compressed_opaque() {
            Self::Opaque
        } else {
            Self::Transparent
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Opaque => 0,
            Self::Transparent => 1,
            Self::Water => 2,
        }
    }
}

/// One allocated atlas slot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtlasEntry {
    pub texture_key: String,
    pub category: AtlasCategory,
    pub slot: u32,
    /// Texture size relative to the atlas reference size
    pub scale: Vector2<Real>,
    /// Number of mip levels kept for this texture (at least 1)
    pub mip_depth: u32,
}

impl AtlasEntry {
    pub fn handle(&self) -> AtlasHandle {
        AtlasHandle {
            category: self.category,
            slot: self.slot,
            scale: self.scale,
            mip_depth: self.mip_depth,
        }
    }
}

/// The part of an [`AtlasEntry`] vertex emission needs, without the key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasHandle {
    pub category: AtlasCategory,
    pub slot: u32,
    pub scale: Vector2<Real>,
    pub mip_depth: u32,
}

impl AtlasHandle {
    #[inline]
    pub const fn max_mip_level(&self) -> u32 {
        self.mip_depth.saturating_sub(1)
    }

    /// Scale a source UV into the slot and pack `(slot, max mip level)` into
    /// the `z`/`w` channels.
    ///
    /// ```rust
    /// # use bspchunk::atlas::{AtlasCategory, AtlasHandle};
    /// # use nalgebra::{Vector2, Vector4};
    /// let handle = AtlasHandle {
    ///     category: AtlasCategory::Opaque,
    ///     slot: 3,
    ///     scale: Vector2::new(0.5, 0.25),
    ///     mip_depth: 8,
    /// };
    /// assert_eq!(handle.pack_uv(&Vector2::new(1.0, 2.0)), Vector4::new(0.5, 0.5, 3.0, 7.0));
    /// ```
    pub fn pack_uv(&self, uv: &Vector2<Real>) -> Vector4<Real> {
        Vector4::new(
            uv.x * self.scale.x,
            uv.y * self.scale.y,
            real_from_u32(self.slot),
            real_from_u32(self.max_mip_level()),
        )
    }
}

#[derive(Debug, Clone, Default)]
struct CategorySlots {
    entries: Vec<AtlasEntry>,
    by_key: HashMap<String, u32>,
}

/// Lookup-or-allocate table for the three atlas categories.
///
/// Not thread safe by contract: the compiler only uses it from its
/// single-threaded tree walk.
#[derive(Debug, Clone)]
pub struct TextureAtlasAllocator {
    reference_size: u32,
    max_texture_size: u32,
    categories: [CategorySlots; 3],
    /// Loader results, including misses, so each key is loaded at most once
    metadata: HashMap<String, Option<TextureMetadata>>,
}

impl TextureAtlasAllocator {
    pub fn new(reference_size: u32, max_texture_size: u32) -> Self {
        Self {
            reference_size: reference_size.max(1),
            max_texture_size: max_texture_size.max(1),
            categories: Default::default(),
            metadata: HashMap::new(),
        }
    }

    fn load_metadata(
        &mut self,
        key: &str,
        textures: &(impl TextureSource + ?Sized),
    ) -> Result<TextureMetadata, AtlasError> {
        let cached = match self.metadata.get(key) {
            Some(cached) => *cached,
            None => {
                let loaded = textures.texture_metadata(key);
                if loaded.is_none() {
                    log::warn!("texture '{key}' has no metadata; polygons using it are skipped");
                }
                self.metadata.insert(key.to_owned(), loaded);
                loaded
            },
        };
        cached.ok_or_else(|| AtlasError::TextureNotFound(key.to_owned()))
    }

    /// Find or allocate the atlas slot for `material`'s texture.
    pub fn resolve(
        &mut self,
        material: &Material,
        textures: &(impl TextureSource + ?Sized),
    ) -> Result<AtlasHandle, AtlasError> {
        let key = material.texture_key.as_str();
        let metadata = self.load_metadata(key, textures)?;
        let category = AtlasCategory::classify(material, metadata.pixel_format);

        let slots = &mut self.categories[category.index()];
        if let Some(&slot) = slots.by_key.get(key) {
            return Ok(slots.entries[slot as usize].handle());
        }

        if metadata.width == 0 || metadata.height == 0 {
            return Err(AtlasError::InvalidTexture {
                key: key.to_owned(),
                reason: format!("zero-sized ({}x{})", metadata.width, metadata.height),
            });
        }

        let (width, height, mip_depth) = metadata.fit_within(self.max_texture_size);
        if (width, height) != (metadata.width, metadata.height) {
            log::debug!(
                "texture '{key}' downsampled from {}x{} to {width}x{height} for the atlas",
                metadata.width,
                metadata.height
            );
        }

        let reference = real_from_u32(self.reference_size);
        let slot = slots.entries.len() as u32;
        let entry = AtlasEntry {
            texture_key: key.to_owned(),
            category,
            slot,
            scale: Vector2::new(real_from_u32(width) / reference, real_from_u32(height) / reference),
            mip_depth,
        };
        log::trace!("atlas {category:?} slot {slot} <- '{key}'");
        let handle = entry.handle();
        slots.by_key.insert(key.to_owned(), slot);
        slots.entries.push(entry);
        Ok(handle)
    }

    /// Entries of one category, in slot order
    pub fn entries(&self, category: AtlasCategory) -> &[AtlasEntry] {
        &self.categories[category.index()].entries
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand the allocation result to the renderer
    pub fn into_layout(self) -> AtlasLayout {
        let [opaque, transparent, water] = self.categories.map(|c| c.entries);
        AtlasLayout {
            opaque,
            transparent,
            water,
        }
    }
}

/// Final slot assignment for each texture array, in slot order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtlasLayout {
    pub opaque: Vec<AtlasEntry>,
    pub transparent: Vec<AtlasEntry>,
    pub water: Vec<AtlasEntry>,
}

impl AtlasLayout {
    pub fn entries(&self, category: AtlasCategory) -> &[AtlasEntry] {
        match category {
            AtlasCategory::Opaque => &self.opaque,
            AtlasCategory::Transparent => &self.transparent,
            AtlasCategory::Water => &self.water,
        }
    }
}
