mod support;

use bspchunk::chunk::compiler::CompileStats;
use bspchunk::prelude::*;
use bspchunk::float_types::EPSILON;
use nalgebra::{Point3, Vector3};

use crate::support::{
    CANAL, GRATE, MISSING, STONE, WorldBuilder, canal_row, constant_lights, face_normal,
    grid_world, textures, tile_bounds,
};

fn no_lights() -> PointLights {
    PointLights::default()
}

fn compile(world: &WorldData) -> CompileOutput {
    ChunkCompiler::default()
        .compile(world, &textures(), &no_lights())
        .unwrap()
}

/// Root with two leaf children that share polygon 1 (a pentagon).
fn shared_pentagon_world() -> WorldData {
    let mut w = WorldBuilder::new(tile_bounds(0, 0, 4, 4));
    let quad = w.quad(0.0, 0.0, 1.0, STONE);
    let pentagon = w.polygon(
        &[
            [0.0, 0.0, 1.0],
            [2.0, 0.0, 1.0],
            [3.0, 1.0, 1.0],
            [1.0, 3.0, 1.0],
            [-1.0, 1.0, 1.0],
        ],
        STONE,
    );
    let triangle = w.polygon(&[[5.0, 0.0, 0.0], [6.0, 0.0, 0.0], [5.0, 1.0, 0.0]], STONE);
    w.tree.add_front(0, tile_bounds(0, 0, 2, 4), &[quad, pentagon]);
    w.tree.add_back(0, tile_bounds(2, 0, 2, 4), &[pentagon, triangle]);
    w.build()
}

#[test]
fn shared_polygons_are_emitted_once() {
    let world = shared_pentagon_world();
    let output = compile(&world);

    // quad + pentagon + triangle
    assert_eq!(output.triangle_count(), 2 + 3 + 1);
    assert_eq!(output.stats.expand.duplicates_skipped, 1);
    assert_eq!(output.stats.expand.polygons_emitted, 3);
    assert_eq!(output.stats.expand.nodes_visited, 3);
    assert_eq!(output.stats.expand.leaves, 2);

    // front leaf is walked first and claims the pentagon
    let roots: Vec<_> = output.chunks.iter().map(|c| (c.root, c.triangle_count())).collect();
    assert_eq!(roots, vec![(1, 5), (2, 1)]);
}

#[test]
fn pentagon_is_a_fan_from_its_first_corner() {
    let world = shared_pentagon_world();
    let output = compile(&world);
    let chunk = &output.chunks[0];
    let p = &world.positions;

    // finalize reverses the triangle list, so the pentagon's fan comes first,
    // last triangle first
    let triangles: Vec<_> = chunk.mesh.triangle_positions().take(3).collect();
    assert_eq!(
        triangles,
        vec![[p[4], p[7], p[8]], [p[4], p[6], p[7]], [p[4], p[5], p[6]]]
    );
    // one fresh vertex per triangle corner
    assert_eq!(chunk.vertex_count(), 3 * chunk.triangle_count());
}

#[test]
fn portals_missing_textures_and_degenerates_are_skipped() {
    let mut w = WorldBuilder::new(tile_bounds(0, 0, 1, 1));
    let solid = w.quad(0.0, 0.0, 1.0, STONE);
    let portal = w.quad(1.0, 0.0, 1.0, STONE);
    w.polygons[portal] = w.polygons[portal].clone().portal();
    let untextured = w.quad(2.0, 0.0, 1.0, MISSING);
    let sliver = w.polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], STONE);
    w.tree
        .add_front(0, tile_bounds(0, 0, 1, 1), &[solid, portal, untextured, sliver]);
    let output = compile(&w.build());

    let stats = &output.stats.expand;
    assert_eq!(stats.polygons_emitted, 1);
    assert_eq!(stats.portals_skipped, 1);
    assert_eq!(stats.missing_texture_skipped, 1);
    assert_eq!(stats.degenerate, 1);
    assert_eq!(output.triangle_count(), 2);
}

#[test]
fn atlas_slots_follow_first_use() {
    let world = grid_world(4, |x, y| match (x + y) % 3 {
        0 => GRATE,
        1 => CANAL,
        _ => STONE,
    });
    let output = compile(&world);

    assert_eq!(output.atlas.entries(AtlasCategory::Opaque).len(), 1);
    assert_eq!(output.atlas.entries(AtlasCategory::Transparent).len(), 1);
    assert_eq!(output.atlas.entries(AtlasCategory::Water).len(), 1);
    assert_eq!(output.atlas.water[0].texture_key, "canal");
    assert_eq!(output.atlas.transparent[0].slot, 0);
    assert!((output.atlas.opaque[0].scale.x - 0.5).abs() < EPSILON);

    // same input, same slots and same buffers
    let again = compile(&world);
    assert_eq!(output.atlas, again.atlas);
    assert_eq!(output.chunks, again.chunks);
}

#[test]
fn water_chunks_carry_scroll_animation() {
    let output = compile(&grid_world(4, canal_row(4)));
    let water: Vec<&Chunk> = output.chunks_of(ShaderClass::Water).collect();
    assert!(!water.is_empty());
    for chunk in water {
        assert_eq!(chunk.category(), AtlasCategory::Water);
        assert!(chunk.mesh.animations.iter().all(|a| a.x == 1.0 && a.z == 8.0));
    }
    for chunk in output.chunks_of(ShaderClass::WorldLit) {
        assert!(chunk.mesh.animations.iter().all(|a| a.norm() == 0.0));
    }
}

#[test]
fn merged_leaves_keep_their_winding() {
    // root -> a -> {b, c}: both leaves fold into the root
    let mut w = WorldBuilder::new(tile_bounds(0, 0, 2, 1));
    let left = w.quad(0.0, 0.0, 1.0, STONE);
    let right = w.quad(1.0, 0.0, 1.0, STONE);
    let a = w.tree.add_front(0, tile_bounds(0, 0, 2, 1), &[]);
    w.tree.add_front(a, tile_bounds(0, 0, 1, 1), &[left]);
    w.tree.add_back(a, tile_bounds(1, 0, 1, 1), &[right]);
    let output = compile(&w.build());

    assert_eq!(output.chunks.len(), 1);
    let chunk = &output.chunks[0];
    assert_eq!(chunk.root, 0);
    assert_eq!(chunk.triangle_count(), 4);
    assert_eq!(output.stats.merge_records.len(), 2);
    assert!(output.stats.merge_records.iter().all(|r| r.merged));

    for triangle in chunk.mesh.triangle_positions() {
        let n = face_normal(triangle);
        assert!(n.dot(&Vector3::z()) > 0.0, "triangle {triangle:?} flipped");
    }
    // the right-hand quad was appended last, so it comes first after reversal
    assert!(chunk.mesh.positions[0].x >= 1.0);
}

#[test]
fn lighting_disabled_means_no_merging() {
    let world = grid_world(8, canal_row(8));
    let output = ChunkCompiler::new(
        CompilerConfig::default()
            .with_lighting(false)
            .with_height_clamped_shader(None),
    )
    .compile(&world, &textures(), &constant_lights(0))
    .unwrap();

    let CompileStats {
        roots_after_walk,
        roots_after_merge,
        merge_iterations,
        ref merge_records,
        ..
    } = output.stats;
    assert_eq!(roots_after_walk, 64);
    assert_eq!(roots_after_merge, 64);
    assert_eq!(merge_iterations, 1);
    assert!(merge_records.is_empty());
    assert_eq!(output.chunks.len(), 64);
}

#[test]
fn crowded_regions_stop_merging() {
    let world = grid_world(8, |_, _| STONE);
    let output = ChunkCompiler::default()
        .compile(&world, &textures(), &constant_lights(16))
        .unwrap();
    assert!(output.stats.merge_records.is_empty());
    assert_eq!(output.chunks.len(), 64);

    let output = ChunkCompiler::default()
        .compile(&world, &textures(), &constant_lights(15))
        .unwrap();
    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.chunks[0].root, 0);
    assert_eq!(output.triangle_count(), 128);
}

#[test]
fn empty_leaves_produce_nothing() {
    let mut w = WorldBuilder::new(tile_bounds(0, 0, 1, 1));
    w.tree.add_front(0, tile_bounds(0, 0, 1, 1), &[]);
    let output = compile(&w.build());
    assert!(output.chunks.is_empty());
    assert_eq!(output.triangle_count(), 0);
}

#[test]
fn lone_root_leaf_is_anchored_at_the_root() {
    let mut w = WorldBuilder::new(tile_bounds(0, 0, 1, 1));
    let quad = w.quad(0.0, 0.0, 1.0, STONE);
    let mut world = w.build();
    world.tree = TreeBuilder::new(tile_bounds(0, 0, 1, 1), &[quad]).build();
    let output = compile(&world);
    assert_eq!(output.chunks.len(), 1);
    assert_eq!(output.chunks[0].root, 0);
}

#[test]
fn malformed_polygons_are_fatal() {
    let mut w = WorldBuilder::new(tile_bounds(0, 0, 1, 1));
    let quad = w.quad(0.0, 0.0, 1.0, STONE);
    w.tree.add_front(0, tile_bounds(0, 0, 1, 1), &[quad]);
    let world = w.build();

    let mut bad_position = world.clone();
    bad_position.polygons[quad].position_indices[2] = 99;
    assert_eq!(
        ChunkCompiler::default().compile(&bad_position, &textures(), &no_lights()),
        Err(CompileError::PositionOutOfRange {
            polygon: quad,
            position: 99
        })
    );

    let mut bad_features = world.clone();
    bad_features.polygons[quad].features.pop();
    assert!(matches!(
        ChunkCompiler::default().compile(&bad_features, &textures(), &no_lights()),
        Err(CompileError::FeatureCountMismatch { polygon: 0, positions: 4, features: 3 })
    ));

    let mut bad_material = world;
    bad_material.polygons[quad].material = 42;
    assert!(matches!(
        ChunkCompiler::default().compile(&bad_material, &textures(), &no_lights()),
        Err(CompileError::MaterialOutOfRange { material: 42, .. })
    ));
}

#[test]
fn broken_trees_are_rejected_before_walking() {
    let mut w = WorldBuilder::new(tile_bounds(0, 0, 1, 1));
    let quad = w.quad(0.0, 0.0, 1.0, STONE);
    let leaf = w.tree.add_front(0, tile_bounds(0, 0, 1, 1), &[quad]);
    let world = w.build();

    let mut twice = world.clone();
    twice.tree.nodes[0].back = Some(leaf);
    assert_eq!(
        ChunkCompiler::default().compile(&twice, &textures(), &no_lights()),
        Err(CompileError::Cycle(leaf))
    );

    let mut orphan = world.clone();
    orphan.tree.nodes[leaf].parent = Some(leaf);
    assert!(matches!(
        ChunkCompiler::default().compile(&orphan, &textures(), &no_lights()),
        Err(CompileError::ParentMismatch { node: 1, .. })
    ));

    // back leaf still names the root as parent, but the root forgot it
    let mut w = WorldBuilder::new(tile_bounds(0, 0, 2, 1));
    let front_quad = w.quad(0.0, 0.0, 1.0, STONE);
    let back_quad = w.quad(2.0, 0.0, 1.0, STONE);
    w.tree.add_front(0, tile_bounds(0, 0, 1, 1), &[front_quad]);
    let back = w.tree.add_back(0, tile_bounds(1, 0, 1, 1), &[back_quad]);
    let mut unlinked = w.build();
    unlinked.tree.nodes[0].back = None;
    assert_eq!(
        ChunkCompiler::default().compile(&unlinked, &textures(), &no_lights()),
        Err(CompileError::ParentMismatch {
            node: back,
            expected: None,
            found: Some(0)
        })
    );

    let mut dangling = world.clone();
    dangling.tree.polygon_indices[0] = 7;
    assert_eq!(
        ChunkCompiler::default().compile(&dangling, &textures(), &no_lights()),
        Err(CompileError::PolygonOutOfRange { index: 7, len: 1 })
    );

    let mut empty = world;
    empty.tree = BspTree::default();
    assert_eq!(
        ChunkCompiler::default().compile(&empty, &textures(), &no_lights()),
        Err(CompileError::MissingRoot)
    );
}

#[test]
fn cancelled_compilation_returns_an_error() {
    let world = grid_world(4, |_, _| STONE);
    let token = CancelToken::new();
    let compiler = ChunkCompiler::default().with_cancel_token(token.clone());
    assert!(compiler.compile(&world, &textures(), &no_lights()).is_ok());

    token.cancel();
    assert_eq!(
        compiler.compile(&world, &textures(), &no_lights()),
        Err(CompileError::Cancelled)
    );
}

#[test]
fn invalid_configuration_is_rejected() {
    let world = grid_world(2, |_, _| STONE);
    let result = ChunkCompiler::new(CompilerConfig::default().with_atlas_sizes(0, 1024))
        .compile(&world, &textures(), &no_lights());
    assert!(matches!(result, Err(CompileError::InvalidConfig(_))));
}

#[test]
fn chunk_bounds_cover_their_geometry() {
    let output = compile(&grid_world(4, |_, _| STONE));
    let bounds = output.chunks[0].bounds().unwrap();
    assert_eq!(bounds.mins, Point3::new(0.0, 0.0, 0.0));
    assert_eq!(bounds.maxs, Point3::new(16.0, 16.0, 0.0));
}
