//! Test support library
//! Synthetic worlds, texture tables and light queries shared by the
//! integration tests.

#![allow(dead_code)]

use bspchunk::prelude::*;
use bspchunk::float_types::Real;
use nalgebra::{Point3, Vector2, Vector3};

pub const STONE: usize = 0;
pub const GRATE: usize = 1;
pub const CANAL: usize = 2;
/// Material whose texture is not in [`textures`]
pub const MISSING: usize = 3;

/// Edge length of one grid tile
pub const TILE: Real = 4.0;

pub fn materials() -> Vec<Material> {
    vec![
        Material::new("stone"),
        Material::new("grate"),
        Material::water("canal").with_scroll(UvScroll {
            direction: Vector2::new(1.0, 0.0),
            frame_count: 8,
            fps: 4.0,
        }),
        Material::new("nowhere"),
    ]
}

pub fn textures() -> TextureTable {
    let mut table = TextureTable::new();
    table
        .insert("stone", TextureMetadata::new(512, 512, 10, PixelFormat::Bc1))
        .insert("grate", TextureMetadata::new(256, 128, 9, PixelFormat::Bc3))
        .insert("canal", TextureMetadata::new(1024, 1024, 11, PixelFormat::Bc1));
    table
}

pub fn feature() -> VertexFeature {
    VertexFeature::new(Vector2::zeros(), Vector3::z(), [255, 255, 255, 255])
}

/// Bounds of a `w`×`h` block of tiles starting at tile (x, y)
pub fn tile_bounds(x: usize, y: usize, w: usize, h: usize) -> Aabb {
    Aabb::new(
        Point3::new(x as Real * TILE, y as Real * TILE, -1.0),
        Point3::new((x + w) as Real * TILE, (y + h) as Real * TILE, 1.0),
    )
}

/// Assembles positions, polygons and a tree into a [`WorldData`].
pub struct WorldBuilder {
    pub positions: Vec<Point3<Real>>,
    pub polygons: Vec<Polygon>,
    pub tree: TreeBuilder,
}

impl WorldBuilder {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            positions: Vec::new(),
            polygons: Vec::new(),
            tree: TreeBuilder::new(bounds, &[]),
        }
    }

    /// Add a polygon through `corners` (counter-clockwise seen from +Z) and
    /// return its id.
    pub fn polygon(&mut self, corners: &[[Real; 3]], material: usize) -> usize {
        let first = self.positions.len();
        self.positions
            .extend(corners.iter().map(|&[x, y, z]| Point3::new(x, y, z)));
        self.polygons.push(Polygon::new(
            (first..first + corners.len()).collect(),
            vec![feature(); corners.len()],
            material,
        ));
        self.polygons.len() - 1
    }

    pub fn quad(&mut self, x: Real, y: Real, size: Real, material: usize) -> usize {
        self.polygon(
            &[
                [x, y, 0.0],
                [x + size, y, 0.0],
                [x + size, y + size, 0.0],
                [x, y + size, 0.0],
            ],
            material,
        )
    }

    pub fn build(self) -> WorldData {
        WorldData::new(self.tree.build(), self.positions, self.polygons, materials())
    }
}

/// A `side`×`side` floor of quads under a balanced tree, one tile per leaf.
///
/// `side` must be a power of two. Interior nodes own no polygons, so every
/// leaf starts out as its own chunk root at depth `2 * log2(side)`.
pub fn grid_world(side: usize, material_of: impl Fn(usize, usize) -> usize) -> WorldData {
    assert!(side.is_power_of_two());
    let mut world = WorldBuilder::new(tile_bounds(0, 0, side, side));
    split(&mut world, &material_of, 0, (0, 0, side, side));
    world.build()
}

fn split(
    world: &mut WorldBuilder,
    material_of: &impl Fn(usize, usize) -> usize,
    node: usize,
    (x0, y0, w, h): (usize, usize, usize, usize),
) {
    if w == 1 && h == 1 {
        return;
    }
    let halves = if w >= h {
        [(x0, y0, w / 2, h), (x0 + w / 2, y0, w / 2, h)]
    } else {
        [(x0, y0, w, h / 2), (x0, y0 + h / 2, w, h / 2)]
    };
    for (i, (x, y, cw, ch)) in halves.into_iter().enumerate() {
        let polygons = if cw == 1 && ch == 1 {
            let material = material_of(x, y);
            vec![world.quad(x as Real * TILE, y as Real * TILE, TILE, material)]
        } else {
            Vec::new()
        };
        let bounds = tile_bounds(x, y, cw, ch);
        let child = if i == 0 {
            world.tree.add_front(node, bounds, &polygons)
        } else {
            world.tree.add_back(node, bounds, &polygons)
        };
        split(world, material_of, child, (x, y, cw, ch));
    }
}

/// Grid material: a water row at `y == side / 2`, stone elsewhere
pub fn canal_row(side: usize) -> impl Fn(usize, usize) -> usize {
    move |_, y| if y == side / 2 { CANAL } else { STONE }
}

/// Light query that reports `count` lights for every box
pub fn constant_lights(count: usize) -> impl Fn(&Aabb) -> usize + Send + Sync {
    move |_: &Aabb| count
}

/// Light query that reports many lights for any box wider than `width`
pub fn crowded_wider_than(width: Real) -> impl Fn(&Aabb) -> usize + Send + Sync {
    move |b: &Aabb| {
        if b.maxs.x - b.mins.x > width || b.maxs.y - b.mins.y > width {
            64
        } else {
            0
        }
    }
}

/// Geometric normal of a triangle from its corner order
pub fn face_normal([a, b, c]: [Point3<Real>; 3]) -> Vector3<Real> {
    (b - a).cross(&(c - a))
}
