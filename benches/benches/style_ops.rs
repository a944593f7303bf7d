// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::{Affine3A, Vec3};
use understory_scene::{Geometry, Material, NodeId, Scene, SceneNode};
use understory_style::{
    IdFilter, OutlineGenerator, OutlineOptions, StyleStore, find, revert_opacity,
    revert_visible_for_floors, set_opacity, set_visible_for_floors,
};

fn cube() -> Geometry {
    let p = (0..8)
        .map(|i: u32| Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32))
        .collect();
    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 1, 2, 3, 4, 5, 6, 5, 7, 6, 0, 1, 4, 1, 5, 4,
        2, 6, 3, 3, 6, 7, 0, 4, 2, 2, 4, 6, 1, 3, 5, 3, 7, 5,
    ];
    Geometry::indexed(p, indices)
}

/// A tower of `floors` storeys with `per_floor` cubes each, all instancing one geometry and
/// cycling through a handful of shared materials.
fn tower(floors: u32, per_floor: u32) -> (Scene, NodeId) {
    let mut scene = Scene::new();
    let g = scene.add_geometry(cube());
    let materials: Vec<_> = (0..8)
        .map(|i| scene.add_material(Material::surface([i as f32 / 8.0, 0.5, 0.5])))
        .collect();
    let root = scene.insert(None, SceneNode::group("Tower").with_object_id(1));
    let mut next_id = 100;
    for f in 1..=floors {
        let storey = scene.insert(Some(root), SceneNode::group(format!("{f}F(Level)")));
        for i in 0..per_floor {
            let m = materials[(i as usize) % materials.len()];
            let mut node = SceneNode::mesh(format!("Wall-{i}"), g, m)
                .with_object_id(next_id)
                .with_user_data("layer", "A-WALL");
            node.local_transform =
                Affine3A::from_translation(Vec3::new(i as f32 * 2.0, 0.0, f as f32 * 3.0));
            scene.insert(Some(storey), node);
            next_id += 1;
        }
    }
    (scene, root)
}

fn bench_opacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("opacity");
    for &per_floor in &[64_u32, 256] {
        let (scene, root) = tower(20, per_floor);
        group.throughput(Throughput::Elements(u64::from(20 * per_floor)));
        group.bench_function(format!("set_revert_n{}", 20 * per_floor), |b| {
            b.iter_batched(
                || scene.clone(),
                |mut scene| {
                    let infos = set_opacity(&mut scene, root, Some(0.3), IdFilter::new());
                    revert_opacity(&mut scene, &infos, IdFilter::new());
                    black_box(infos.len());
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_wireframe(c: &mut Criterion) {
    let mut group = c.benchmark_group("wireframe");
    let (scene, root) = tower(20, 256);
    let include: Vec<u32> = (100..100 + 20 * 256).step_by(2).collect();
    group.bench_function("set_revert_scoped", |b| {
        b.iter_batched(
            || (scene.clone(), StyleStore::new()),
            |(mut scene, mut store)| {
                let filter = IdFilter::new().include(&include);
                store.set_wireframe(&mut scene, root, filter);
                store.revert_wireframe(&mut scene, root, filter);
                black_box(store);
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_floors(c: &mut Criterion) {
    let mut group = c.benchmark_group("floors");
    let (scene, root) = tower(40, 128);
    group.bench_function("set_revert_two_floors", |b| {
        b.iter_batched(
            || (scene.clone(), StyleStore::new()),
            |(mut scene, mut store)| {
                set_visible_for_floors(&mut scene, &mut store, root, &["3F", "17F"], true);
                revert_visible_for_floors(&mut scene, &mut store, root);
                black_box(store);
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("find_metadata", |b| {
        b.iter(|| black_box(find(&scene, root, "a-wall", None, false).len()));
    });
    group.finish();
}

fn bench_outlines(c: &mut Criterion) {
    let mut group = c.benchmark_group("outlines");
    let (scene, root) = tower(10, 256);
    group.bench_function("create_shared_geometry", |b| {
        b.iter_batched(
            || (scene.clone(), OutlineGenerator::default()),
            |(mut scene, mut generator)| {
                let created =
                    generator.create_outlines(&mut scene, root, OutlineOptions::default(), |_| {});
                black_box(created.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_opacity,
    bench_wireframe,
    bench_floors,
    bench_outlines,
);
criterion_main!(benches);
