// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use understory_scene::{MaterialId, MaterialSlot, NodeId, Scene};

/// The material at `index` in a node's slot.
pub(crate) fn slot_material(scene: &Scene, node: NodeId, index: usize) -> Option<MaterialId> {
    scene
        .get(node)?
        .content
        .material()?
        .ids()
        .get(index)
        .copied()
}

/// Replace the material at `index` in a node's slot. Returns `false` if there is no such entry.
pub(crate) fn set_slot_material(
    scene: &mut Scene,
    node: NodeId,
    index: usize,
    material: MaterialId,
) -> bool {
    let Some(entry) = scene
        .get_mut(node)
        .and_then(|n| n.content.material_mut())
        .and_then(|slot| slot.ids_mut().get_mut(index))
    else {
        return false;
    };
    *entry = material;
    true
}

/// A copy of a node's whole material slot.
pub(crate) fn slot_of(scene: &Scene, node: NodeId) -> Option<MaterialSlot> {
    scene.get(node)?.content.material().cloned()
}

/// Replace a node's whole material slot. Does nothing for groups.
pub(crate) fn replace_slot(scene: &mut Scene, node: NodeId, slot: MaterialSlot) {
    if let Some(current) = scene.get_mut(node).and_then(|n| n.content.material_mut()) {
        *current = slot;
    }
}
