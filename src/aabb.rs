//! Axis-aligned bounding boxes attached to BSP nodes.
//!
//! Node bounds are only ever used to ask the lighting system how many lights
//! touch a region, so this type stays deliberately small.

use crate::float_types::Real;
use nalgebra::Point3;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Aabb {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// An inverted box that any `grow` call will overwrite.
    pub fn empty() -> Self {
        Self {
            mins: Point3::new(Real::MAX, Real::MAX, Real::MAX),
            maxs: Point3::new(Real::MIN, Real::MIN, Real::MIN),
        }
    }

    /// Smallest box enclosing every point, or `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<Real>>) -> Option<Self> {
        let mut points = points.into_iter().peekable();
        points.peek()?;
        let mut bb = Self::empty();
        points.for_each(|p| bb.grow(p));
        Some(bb)
    }

    pub fn grow(&mut self, p: &Point3<Real>) {
        self.mins = self.mins.inf(p);
        self.maxs = self.maxs.sup(p);
    }

    /// Squared distance from `p` to the closest point of the box (zero inside).
    pub fn distance_squared_to(&self, p: &Point3<Real>) -> Real {
        (0..3)
            .map(|i| {
                let d = if p[i] < self.mins[i] {
                    self.mins[i] - p[i]
                } else if p[i] > self.maxs[i] {
                    p[i] - self.maxs[i]
                } else {
                    0.0
                };
                d * d
            })
            .sum()
    }
}
