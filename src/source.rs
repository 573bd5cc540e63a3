//! Traits for the collaborators the compiler consumes, plus in-memory
//! implementations of each.
//!
//! The compiler never loads files or talks to a lighting system itself; the
//! host engine provides these.

use crate::aabb::Aabb;
use crate::atlas::texture::TextureMetadata;
use crate::bsp::BspTree;
use crate::float_types::Real;
use crate::material::Material;
use crate::polygon::Polygon;
use hashbrown::HashMap;
use nalgebra::Point3;

/// Geometry side of the asset loader
pub trait WorldSource {
    fn bsp_tree(&self) -> &BspTree;

    fn polygon(&self, index: usize) -> Option<&Polygon>;

    fn polygon_count(&self) -> usize;

    fn material(&self, index: usize) -> Option<&Material>;

    fn position(&self, index: usize) -> Option<Point3<Real>>;
}

/// Texture side of the asset loader. `None` means missing or unreadable.
pub trait TextureSource {
    fn texture_metadata(&self, key: &str) -> Option<TextureMetadata>;
}

/// Lighting system query. Must be a pure function of `bounds`, since merge
/// workers call it concurrently.
pub trait LightQuery: Send + Sync {
    fn count_lights_in_bounds(&self, bounds: &Aabb) -> usize;
}

impl<F> LightQuery for F
where
    F: Fn(&Aabb) -> usize + Send + Sync,
{
    fn count_lights_in_bounds(&self, bounds: &Aabb) -> usize {
        self(bounds)
    }
}

/// A fully loaded world held in memory.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldData {
    pub tree: BspTree,
    pub positions: Vec<Point3<Real>>,
    pub polygons: Vec<Polygon>,
    pub materials: Vec<Material>,
}

impl WorldData {
    pub const fn new(
        tree: BspTree,
        positions: Vec<Point3<Real>>,
        polygons: Vec<Polygon>,
        materials: Vec<Material>,
    ) -> Self {
        Self {
            tree,
            positions,
            polygons,
            materials,
        }
    }
}

impl WorldSource for WorldData {
    fn bsp_tree(&self) -> &BspTree {
        &self.tree
    }

    fn polygon(&self, index: usize) -> Option<&Polygon> {
        self.polygons.get(index)
    }

    fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    fn position(&self, index: usize) -> Option<Point3<Real>> {
        self.positions.get(index).copied()
    }
}

/// Texture metadata keyed by texture key
#[derive(Debug, Clone, Default)]
pub struct TextureTable {
    entries: HashMap<String, TextureMetadata>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, metadata: TextureMetadata) -> &mut Self {
        self.entries.insert(key.into(), metadata);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, TextureMetadata)> for TextureTable {
    fn from_iter<I: IntoIterator<Item = (String, TextureMetadata)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl TextureSource for TextureTable {
    fn texture_metadata(&self, key: &str) -> Option<TextureMetadata> {
        self.entries.get(key).copied()
    }
}

/// A point light with a spherical range of influence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Point3<Real>,
    pub range: Real,
}

impl PointLight {
    pub const fn new(position: Point3<Real>, range: Real) -> Self {
        Self { position, range }
    }

    /// Sphere/box overlap
    #[inline]
    pub fn touches(&self, bounds: &Aabb) -> bool {
        bounds.distance_squared_to(&self.position) <= self.range * self.range
    }
}

/// A static light set answering [`LightQuery`] by brute force.
#[derive(Debug, Clone, Default)]
pub struct PointLights(pub Vec<PointLight>);

impl LightQuery for PointLights {
    fn count_lights_in_bounds(&self, bounds: &Aabb) -> usize {
        self.0.iter().filter(|light| light.touches(bounds)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_lights_count_overlapping_spheres() {
        let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let lights = PointLights(vec![
            PointLight::new(Point3::new(0.5, 0.5, 0.5), 0.1),
            PointLight::new(Point3::new(3.0, 0.5, 0.5), 2.5),
            PointLight::new(Point3::new(3.0, 0.5, 0.5), 1.5),
        ]);
        assert_eq!(lights.count_lights_in_bounds(&bounds), 2);
    }

    #[test]
    fn closures_are_light_queries() {
        let always_three = |_: &Aabb| -> usize { 3 };
        let bounds = Aabb::new(Point3::origin(), Point3::origin());
        assert_eq!(always_three.count_lights_in_bounds(&bounds), 3);
    }
}
