// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opacity changes with caller-held undo tokens.

use alloc::vec::Vec;

use understory_scene::{MaterialId, NodeId, NodeKind, Scene, Side};

use crate::filter::IdFilter;
use crate::util::{set_slot_material, slot_material};

/// Snapshot needed to undo one opacity change on one material slot entry.
///
/// Returned by [`set_opacity`] and consumed by [`revert_opacity`]. The caller owns these; the
/// scene keeps no record of them.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialInfo {
    /// The node whose slot was changed.
    pub node: NodeId,
    /// The node's object id at capture time.
    pub object_id: Option<u32>,
    /// Index in the node's material slot.
    pub slot: usize,
    /// The material the slot held before the change.
    pub material: MaterialId,
    /// The copy put in the slot, if the original was not already blending.
    pub cloned_material: Option<MaterialId>,
    /// Opacity of `material` before the change.
    pub opacity: f32,
    /// Whether `material` was blending before the change.
    pub transparent: bool,
    /// Face culling of `material` before the change.
    pub side: Side,
}

/// Set the opacity of every drawable node in the subtree that `filter` admits.
///
/// Materials that are not already blending are copied first, so other nodes sharing them keep
/// their look; materials that already blend are changed in place. `None` resets to fully
/// opaque (while keeping blending enabled).
///
/// Returns one [`MaterialInfo`] per touched slot entry, in traversal order. Pass them to
/// [`revert_opacity`] to undo exactly this call.
pub fn set_opacity(
    scene: &mut Scene,
    root: NodeId,
    opacity: Option<f32>,
    filter: IdFilter<'_>,
) -> Vec<MaterialInfo> {
    let opacity = opacity.unwrap_or(1.0);
    let mut infos = Vec::new();
    for node in filter.select(scene, root, NodeKind::is_drawable) {
        let object_id = scene.get(node).and_then(|n| n.object_id);
        let mut index = 0;
        while let Some(current) = slot_material(scene, node, index) {
            let slot = index;
            index += 1;
            let Some(material) = scene.material(current) else {
                continue;
            };
            let mut info = MaterialInfo {
                node,
                object_id,
                slot,
                material: current,
                cloned_material: None,
                opacity: material.opacity,
                transparent: material.is_transparent(),
                side: material.side,
            };
            let target = if info.transparent {
                current
            } else {
                let Some(copy) = scene.clone_material(current) else {
                    continue;
                };
                set_slot_material(scene, node, slot, copy);
                info.cloned_material = Some(copy);
                copy
            };
            if let Some(m) = scene.material_mut(target) {
                m.set_transparent(true);
                m.opacity = opacity;
            }
            infos.push(info);
        }
    }
    tracing::debug!(opacity, entries = infos.len(), "set_opacity");
    infos
}

/// Undo a [`set_opacity`] call.
///
/// Entries are applied in reverse, so stacked snapshots of a shared material unwind to the
/// oldest state. Entries whose node has been removed, or that `filter` no longer admits, are
/// skipped. Copies made by [`set_opacity`] are put back and discarded only while they still
/// occupy their slot, which makes a second revert with the same snapshots a no-op.
pub fn revert_opacity(scene: &mut Scene, infos: &[MaterialInfo], filter: IdFilter<'_>) {
    let mut reverted = 0_usize;
    for info in infos.iter().rev() {
        let Some(node) = scene.get(info.node) else {
            tracing::trace!(?info.node, "revert_opacity: node removed");
            continue;
        };
        if !filter.includes(node.object_id) {
            continue;
        }
        if let Some(copy) = info.cloned_material {
            if slot_material(scene, info.node, info.slot) != Some(copy) {
                continue;
            }
            set_slot_material(scene, info.node, info.slot, info.material);
            scene.remove_material(copy);
        }
        if let Some(m) = scene.material_mut(info.material) {
            m.opacity = info.opacity;
            m.set_transparent(info.transparent);
            m.side = info.side;
        }
        reverted += 1;
    }
    tracing::debug!(reverted, "revert_opacity");
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use glam::Vec3;
    use understory_scene::{Geometry, Material, SceneNode};

    struct Fixture {
        scene: Scene,
        root: NodeId,
        meshes: [NodeId; 3],
        shared: MaterialId,
    }

    /// Three meshes with ids 10, 20, 30 sharing one opaque material.
    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let g = scene.add_geometry(Geometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]));
        let shared = scene.add_material(Material::surface([0.5, 0.5, 0.5]));
        let root = scene.insert(None, SceneNode::group("root"));
        let meshes = [10, 20, 30].map(|id| {
            scene.insert(Some(root), SceneNode::mesh("m", g, shared).with_object_id(id))
        });
        Fixture {
            scene,
            root,
            meshes,
            shared,
        }
    }

    fn look(scene: &Scene, node: NodeId) -> (f32, bool, Side) {
        let m = scene.material(slot_material(scene, node, 0).unwrap()).unwrap();
        (m.opacity, m.is_transparent(), m.side)
    }

    #[test]
    fn scoped_opacity_round_trip() {
        let Fixture {
            mut scene,
            root,
            meshes,
            shared,
        } = fixture();

        let infos = set_opacity(&mut scene, root, Some(0.3), IdFilter::new().include(&[10, 20]));
        assert_eq!(infos.len(), 2);
        assert_eq!(look(&scene, meshes[0]), (0.3, true, Side::Front));
        assert_eq!(look(&scene, meshes[1]), (0.3, true, Side::Front));
        assert_eq!(look(&scene, meshes[2]), (1.0, false, Side::Front));
        assert_eq!(
            slot_material(&scene, meshes[2], 0),
            Some(shared),
            "untouched node keeps the shared material"
        );
        assert_ne!(slot_material(&scene, meshes[0], 0), Some(shared));

        revert_opacity(&mut scene, &infos, IdFilter::new());
        for node in meshes {
            assert_eq!(look(&scene, node), (1.0, false, Side::Front));
            assert_eq!(slot_material(&scene, node, 0), Some(shared));
        }
        for info in &infos {
            assert!(
                scene.material(info.cloned_material.unwrap()).is_none(),
                "copies are discarded"
            );
        }

        // Second revert is a no-op.
        revert_opacity(&mut scene, &infos, IdFilter::new());
        for node in meshes {
            assert_eq!(look(&scene, node), (1.0, false, Side::Front));
        }
    }

    #[test]
    fn blending_material_is_changed_in_place_and_restored_exactly() {
        let Fixture {
            mut scene,
            root,
            meshes,
            shared,
        } = fixture();
        {
            let m = scene.material_mut(shared).unwrap();
            m.set_transparent(true);
            m.opacity = 0.75;
            m.side = Side::Back;
        }

        let first = set_opacity(&mut scene, root, Some(0.2), IdFilter::new());
        assert!(first.iter().all(|i| i.cloned_material.is_none()));
        assert_eq!(look(&scene, meshes[1]), (0.2, true, Side::Back));

        // Stack a second change; unwinding both must land on the original state.
        let second = set_opacity(&mut scene, root, None, IdFilter::new());
        assert_eq!(look(&scene, meshes[1]), (1.0, true, Side::Back));
        revert_opacity(&mut scene, &second, IdFilter::new());
        assert_eq!(look(&scene, meshes[1]), (0.2, true, Side::Back));
        revert_opacity(&mut scene, &first, IdFilter::new());
        assert_eq!(look(&scene, meshes[1]).0.to_bits(), 0.75_f32.to_bits());
        assert_eq!(look(&scene, meshes[1]), (0.75, true, Side::Back));
    }

    #[test]
    fn removed_nodes_and_filtered_entries_are_skipped() {
        let Fixture {
            mut scene,
            root,
            meshes,
            ..
        } = fixture();
        let infos = set_opacity(&mut scene, root, Some(0.5), IdFilter::new());
        scene.remove(meshes[0]);

        revert_opacity(&mut scene, &infos, IdFilter::new().exclude(&[30]));
        assert_eq!(look(&scene, meshes[1]), (1.0, false, Side::Front));
        assert_eq!(look(&scene, meshes[2]), (0.5, true, Side::Front));

        revert_opacity(&mut scene, &infos, IdFilter::new());
        assert_eq!(look(&scene, meshes[2]), (1.0, false, Side::Front));
    }

    #[test]
    fn groups_and_empty_scopes_produce_nothing() {
        let Fixture {
            mut scene, root, ..
        } = fixture();
        let scoped = set_opacity(&mut scene, root, Some(0.5), IdFilter::new().include(&[99]));
        assert!(scoped.is_empty());
        let group = scene.insert(None, SceneNode::group("empty"));
        assert!(set_opacity(&mut scene, group, Some(0.5), IdFilter::new()).is_empty());
        revert_opacity(&mut scene, &[], IdFilter::new());
    }
}
