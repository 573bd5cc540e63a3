//! Texture metadata as reported by the asset loader

/// Pixel storage of a source texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    /// BC1 / DXT1 without punch-through alpha
    Bc1,
    /// BC1 / DXT1 with 1-bit alpha
    Bc1Alpha,
    /// BC2 / DXT3
    Bc2,
    /// BC3 / DXT5
    Bc3,
    Rgba8,
    Rgb8,
    /// Loader-specific format id the compiler does not know
    Other(u32),
}

impl PixelFormat {
    /// Block-compressed formats without an alpha channel go to the opaque atlas
    #[inline]
    pub const fn is_block_compressed_opaque(self) -> bool {
        matches!(self, PixelFormat::Bc1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureMetadata {
    pub width: u32,
    pub height: u32,
    pub mip_count: u32,
    pub pixel_format: PixelFormat,
}

impl TextureMetadata {
    pub const fn new(width: u32, height: u32, mip_count: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            mip_count,
            pixel_format,
        }
    }

    /// Drop whole mip levels until both sides fit in `max_size`.
    ///
    /// Returns the fitted `(width, height, mip_count)`; at least one mip level
    /// always remains.
    pub fn fit_within(&self, max_size: u32) -> (u32, u32, u32) {
        let max_size = max_size.max(1);
        let (mut width, mut height, mut mips) = (self.width, self.height, self.mip_count.max(1));
        while width > max_size || height > max_size {
            width = (width / 2).max(1);
            height = (height / 2).max(1);
            mips = mips.saturating_sub(1).max(1);
        }
        (width, height, mips)
    }
}
