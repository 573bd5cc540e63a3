//! A world-geometry compiler that turns a static **Binary Space Partitioning
//! (BSP)** tree of raw polygons into a small number of large, GPU-ready mesh
//! chunks.
//!
//! Leaf polygons are deduplicated and fan-triangulated into per-shader
//! [`SubMesh`](chunk::SubMesh)es grouped under *chunk roots*, then merged
//! upward through the tree while the merged region stays under a light-count
//! budget. A final pass lifts water into a few very large meshes. Texture
//! references are resolved to slots of three shared texture arrays (opaque,
//! transparent, water) as they are met.
//!
//! The asset loader, lighting system and renderer are collaborators behind
//! the traits in [`source`].
//!
//! # Features
//! #### Default
//! - **f32**: use f32 as Real
//! - **parallel**: use rayon for the light-bounded merge
//!
//! #### Optional
//! - **f64**: use f64 as Real, this conflicts with f32
//! - **serde**: `Serialize`/`Deserialize` for configuration and input data

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod aabb;
pub mod atlas;
pub mod bsp;
pub mod chunk;
pub mod config;
pub mod errors;
pub mod float_types;
pub mod material;
pub mod polygon;
pub mod source;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use chunk::{Chunk, ChunkCompiler, CompileOutput};
pub use config::CompilerConfig;
pub use errors::{AtlasError, CompileError};

/// Everything needed to describe a world and compile it
pub mod prelude {
    pub use crate::aabb::Aabb;
    pub use crate::atlas::texture::{PixelFormat, TextureMetadata};
    pub use crate::atlas::{AtlasCategory, AtlasLayout};
    pub use crate::bsp::tree::TreeBuilder;
    pub use crate::bsp::{BspNode, BspTree};
    pub use crate::chunk::{CancelToken, Chunk, ChunkCompiler, CompileOutput, ShaderClass};
    pub use crate::config::CompilerConfig;
    pub use crate::errors::CompileError;
    pub use crate::material::{Material, MaterialGroup, UvScroll};
    pub use crate::polygon::{Polygon, VertexFeature};
    pub use crate::source::{
        LightQuery, PointLight, PointLights, TextureSource, TextureTable, WorldData, WorldSource,
    };
}
