// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Isolate storeys of a small building, fade the rest, then undo both.
//!
//! Run:
//! - `RUST_LOG=understory_style=debug cargo run -p understory_style_demos --example floor_filter`

use glam::Vec3;
use understory_scene::{Geometry, Material, NodeId, Scene, SceneNode};
use understory_style::{IdFilter, ObjectUtils};

fn print_tree(scene: &Scene, root: NodeId) {
    for id in scene.descendants(root) {
        let Some(node) = scene.get(id) else { continue };
        let mut depth = 0;
        let mut up = scene.parent_of(id);
        while let Some(p) = up {
            depth += 1;
            up = scene.parent_of(p);
        }
        let opacity = node
            .content
            .material()
            .and_then(|slot| slot.ids().first().copied())
            .and_then(|m| scene.material(m))
            .map(|m| m.opacity);
        println!(
            "{:indent$}{} visible={} opacity={:?}",
            "",
            node.name,
            node.is_visible(),
            opacity,
            indent = depth * 2
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "understory_style=info".into()),
        )
        .init();

    let mut scene = Scene::new();
    let slab = scene.add_geometry(Geometry::indexed(
        vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
        vec![0, 1, 2, 0, 2, 3],
    ));
    let concrete = scene.add_material(Material::surface([0.7, 0.7, 0.7]).with_name("concrete"));

    let building = scene.insert(None, SceneNode::group("Office").with_object_id(1));
    let mut next_id = 10;
    for floor in ["B1F", "1F", "2F", "21F"] {
        let storey = scene.insert(Some(building), SceneNode::group(format!("{floor}(Level)")));
        for part in ["Slab", "Core"] {
            scene.insert(
                Some(storey),
                SceneNode::mesh(format!("{floor}_{part}"), slab, concrete).with_object_id(next_id),
            );
            next_id += 1;
        }
    }

    let mut utils = ObjectUtils::default();
    println!("floors: {:?}", utils.distinct_floors(&scene, &[1]));

    utils.set_visible_for_floors_by_id(&mut scene, 1, &["1F"], true);
    let faded = utils.set_opacity_by_id(&mut scene, 1, Some(0.25), IdFilter::new().exclude(&[12]));
    println!("\n-- 1F isolated, everything but object 12 faded --");
    print_tree(&scene, building);

    utils.revert_opacity(&mut scene, &faded, IdFilter::new());
    utils.revert_visible_for_floors_by_id(&mut scene, 1);
    println!("\n-- reverted --");
    print_tree(&scene, building);
}
