// main.rs
//
// Builds a synthetic grid world (a balanced BSP over a square of floor tiles
// with a strip of water through the middle), compiles it and prints what came
// out. Set RUST_LOG=debug to watch the merge passes.

use bspchunk::prelude::*;
use bspchunk::float_types::Real;
use nalgebra::{Point3, Vector2, Vector3};

/// Tiles per side; must be a power of two so the split tree is balanced
const GRID: usize = 16;
const TILE: Real = 4.0;

struct GridWorld {
    positions: Vec<Point3<Real>>,
    polygons: Vec<Polygon>,
    builder: TreeBuilder,
}

impl GridWorld {
    fn tile_polygon(&mut self, x: usize, y: usize) -> usize {
        let (x0, y0) = (x as Real * TILE, y as Real * TILE);
        let first = self.positions.len();
        self.positions.extend([
            Point3::new(x0, y0, 0.0),
            Point3::new(x0 + TILE, y0, 0.0),
            Point3::new(x0 + TILE, y0 + TILE, 0.0),
            Point3::new(x0, y0 + TILE, 0.0),
        ]);
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let features = uvs
            .iter()
            .map(|&[u, v]| VertexFeature::new(Vector2::new(u, v), Vector3::z(), [200, 200, 180, 255]))
            .collect();
        let material = if y == GRID / 2 {
            1
        } else if (x + y) % 7 == 0 {
            2
        } else {
            0
        };
        self.polygons
            .push(Polygon::new((first..first + 4).collect(), features, material));
        self.polygons.len() - 1
    }

    fn bounds(x0: usize, y0: usize, w: usize, h: usize) -> Aabb {
        Aabb::new(
            Point3::new(x0 as Real * TILE, y0 as Real * TILE, -1.0),
            Point3::new((x0 + w) as Real * TILE, (y0 + h) as Real * TILE, 1.0),
        )
    }

    /// Split the `w`×`h` tile block at (x0, y0) along its longer side until
    /// single tiles remain.
    fn split(&mut self, node: usize, x0: usize, y0: usize, w: usize, h: usize) {
        if w == 1 && h == 1 {
            return;
        }
        let (a, b) = if w >= h {
            ((x0, y0, w / 2, h), (x0 + w / 2, y0, w - w / 2, h))
        } else {
            ((x0, y0, w, h / 2), (x0, y0 + h / 2, w, h - h / 2))
        };
        for (front, (x, y, cw, ch)) in [(true, a), (false, b)] {
            let polygons: Vec<usize> = if cw == 1 && ch == 1 {
                vec![self.tile_polygon(x, y)]
            } else {
                Vec::new()
            };
            let bounds = Self::bounds(x, y, cw, ch);
            let child = if front {
                self.builder.add_front(node, bounds, &polygons)
            } else {
                self.builder.add_back(node, bounds, &polygons)
            };
            self.split(child, x, y, cw, ch);
        }
    }
}

fn main() {
    env_logger::init();

    let mut grid = GridWorld {
        positions: Vec::new(),
        polygons: Vec::new(),
        builder: TreeBuilder::new(GridWorld::bounds(0, 0, GRID, GRID), &[]),
    };
    grid.split(0, 0, 0, GRID, GRID);

    let world = WorldData::new(
        grid.builder.build(),
        grid.positions,
        grid.polygons,
        vec![
            Material::new("floor/stone"),
            Material::water("liquid/canal").with_scroll(UvScroll {
                direction: Vector2::new(0.0, 1.0),
                frame_count: 16,
                fps: 8.0,
            }),
            Material::new("floor/grate"),
        ],
    );

    let mut textures = TextureTable::new();
    textures
        .insert("floor/stone", TextureMetadata::new(512, 512, 10, PixelFormat::Bc1))
        .insert("floor/grate", TextureMetadata::new(256, 256, 9, PixelFormat::Bc3))
        .insert("liquid/canal", TextureMetadata::new(2048, 2048, 12, PixelFormat::Bc1));

    let extent = GRID as Real * TILE;
    let lights = PointLights(
        (0..24)
            .map(|i| {
                let t = i as Real / 24.0;
                PointLight::new(Point3::new(t * extent, (1.0 - t) * extent, 2.0), 6.0)
            })
            .collect(),
    );

    let compiler = ChunkCompiler::new(CompilerConfig::default().with_light_cap(4));
    let output = match compiler.compile(&world, &textures, &lights) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("compilation failed: {err}");
            std::process::exit(1);
        },
    };

    println!(
        "{} tiles -> {} chunks, {} triangles",
        GRID * GRID,
        output.chunks.len(),
        output.triangle_count()
    );
    println!(
        "chunk roots: walk {}, light merge {} ({} iterations), water clamp {}",
        output.stats.roots_after_walk,
        output.stats.roots_after_merge,
        output.stats.merge_iterations,
        output.stats.roots_after_clamp
    );
    for shader in [ShaderClass::WorldLit, ShaderClass::AlphaCutout, ShaderClass::Water] {
        let chunks: Vec<&Chunk> = output.chunks_of(shader).collect();
        let triangles: usize = chunks.iter().map(|c| c.triangle_count()).sum();
        println!("  {:<12} {:>4} chunks {:>6} triangles", shader.name(), chunks.len(), triangles);
    }
    for category in AtlasCategory::ALL {
        for entry in output.atlas.entries(category) {
            println!(
                "  atlas {:?}[{}] {} scale {:?} mips {}",
                category, entry.slot, entry.texture_key, entry.scale, entry.mip_depth
            );
        }
    }
}
