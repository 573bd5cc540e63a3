// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Tolerance used when comparing vertex data coming out of the compiler.
#[cfg(feature = "f32")]
pub const EPSILON: Real = 1e-5;
/// Tolerance used when comparing vertex data coming out of the compiler.
#[cfg(feature = "f64")]
pub const EPSILON: Real = 1e-9;

/// Index type of the renderer-facing triangle buffers.
pub type Index = u32;

/// Converts a texel count or mip level into the active `Real`.
#[inline]
pub fn real_from_u32(value: u32) -> Real {
    value as Real
}
