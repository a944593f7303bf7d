// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outline a few hundred instanced meshes one batch at a time, as a frame loop would.
//!
//! Run:
//! - `cargo run -p understory_style_demos --example outline_progress`

use glam::{Affine3A, Vec3};
use understory_scene::{Geometry, Material, Scene, SceneNode};
use understory_style::{ObjectUtils, OutlineOptions, StyleConfig};

fn column() -> Geometry {
    // A unit prism with a triangular cross-section.
    let base = [Vec3::ZERO, Vec3::X, Vec3::Y];
    let top = base.map(|p| p + Vec3::Z);
    let positions = base.iter().chain(&top).copied().collect();
    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 3, 4, 5,
        0, 1, 4, 0, 4, 3,
        1, 2, 5, 1, 5, 4,
        2, 0, 3, 2, 3, 5,
    ];
    Geometry::indexed(positions, indices)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "understory_style=info".into()),
        )
        .init();

    let mut scene = Scene::new();
    let geometry = scene.add_geometry(column());
    let steel = scene.add_material(Material::surface([0.4, 0.45, 0.5]));
    let broken = scene.add_geometry(Geometry::indexed(vec![Vec3::ZERO], vec![0, 0, 7]));

    let grid = scene.insert(None, SceneNode::group("Grid").with_object_id(1));
    for i in 0..300_u32 {
        let mut node = SceneNode::mesh(format!("C{i}"), geometry, steel).with_object_id(100 + i);
        let (x, y) = ((i % 20) as f32, (i / 20) as f32);
        node.local_transform = Affine3A::from_translation(Vec3::new(x * 3.0, y * 3.0, 0.0));
        scene.insert(Some(grid), node);
    }
    // Logged as a warning and skipped.
    scene.insert(Some(grid), SceneNode::mesh("bad import", broken, steel));

    let mut utils = ObjectUtils::new(StyleConfig {
        outline_batch_size: 50,
        ..StyleConfig::default()
    });
    let options = OutlineOptions {
        visible_only: true,
        ..utils.outline_options()
    };

    let mut task = utils.begin_outlines(&scene, grid, options);
    let mut frame = 0;
    while !task.is_finished() {
        let p = utils.step_outlines(&mut scene, &mut task);
        frame += 1;
        println!("frame {frame}: {}/{} meshes, {} outlines", p.processed, p.total, p.created);
    }

    let segments = task
        .created()
        .first()
        .and_then(|&o| scene.get(o))
        .and_then(|o| o.content.geometry())
        .and_then(|g| scene.geometry(g))
        .map_or(0, |g| g.positions.len() / 2);
    println!("each column has {segments} outline segments");

    if let Some(bounds) = utils.bounding_box(&scene, grid, true) {
        println!("grid bounds: {:?} .. {:?}", bounds.min, bounds.max);
    }
    println!("removed {} outlines", utils.remove_outlines_by_id(&mut scene, 1));
}
