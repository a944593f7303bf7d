// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Revertible material, wireframe and double-sided changes.

use alloc::vec::Vec;

use hashbrown::HashMap;
use smallvec::SmallVec;
use understory_scene::{Material, MaterialFlags, MaterialId, NodeId, NodeKind, Scene, Side};

use crate::filter::IdFilter;
use crate::util::{replace_slot, set_slot_material, slot_material, slot_of};

/// The kinds of revertible change tracked by a [`StyleStore`].
///
/// Each kind has its own record per node, so kinds never overwrite each other.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UndoKind {
    /// [`StyleStore::apply_material`] replaced the node's material slot.
    AppliedMaterial,
    /// [`StyleStore::set_wireframe`] swapped in wireframe materials.
    Wireframe,
    /// [`StyleStore::set_double_sided`] forced double-sided rendering.
    DoubleSided,
    /// Floor filtering changed the node's visible flag.
    FloorVisibility,
}

/// One slot entry replaced by a material-swapping change.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Swap {
    index: usize,
    /// What the entry held before the change.
    original: MaterialId,
    /// What the change put there.
    installed: MaterialId,
}

/// The state captured before one change.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum UndoRecord {
    /// Replaced slot entries.
    Swaps(SmallVec<[Swap; 4]>),
    /// Face culling of each material that was in the slot.
    Sides(SmallVec<[(MaterialId, Side); 4]>),
    /// Visible flag.
    Visible(bool),
}

/// A reverted entry whose installed material was not in its slot at revert time.
#[derive(Copy, Clone, Debug)]
struct Handoff {
    node: NodeId,
    swap: Swap,
    /// The store made `swap.installed` and discards it.
    owned: bool,
}

/// Undo records for style changes, keyed by node and [`UndoKind`].
///
/// Nodes carry no trace of pending changes; everything needed to revert lives here. Records
/// follow two rules:
///
/// - First write wins. Applying the same kind twice keeps the state from before the first
///   application, so one revert returns to the true original.
/// - Reverting consumes the record. Reverting without a record does nothing.
///
/// Material swaps stack with [`set_opacity`](crate::set_opacity) in either order. When a
/// swap is reverted while a later change holds its slot entry, that entry keeps the later
/// change but takes the original's look, and the original itself goes back once the later
/// change is undone. See [`StyleStore::settle`].
///
/// ```rust
/// use understory_scene::{Geometry, Material, Scene, SceneNode};
/// use understory_style::{IdFilter, StyleStore, UndoKind};
///
/// let mut scene = Scene::new();
/// let g = scene.add_geometry(Geometry::default());
/// let red = scene.add_material(Material::surface([1.0, 0.0, 0.0]));
/// let blue = scene.add_material(Material::surface([0.0, 0.0, 1.0]));
/// let mesh = scene.insert(None, SceneNode::mesh("wall", g, red).with_object_id(1));
///
/// let mut store = StyleStore::new();
/// store.apply_material(&mut scene, mesh, blue, IdFilter::new());
/// assert!(store.is_pending(mesh, UndoKind::AppliedMaterial));
///
/// store.revert_applied_material(&mut scene, mesh, IdFilter::new());
/// assert!(!store.is_pending(mesh, UndoKind::AppliedMaterial));
/// ```
#[derive(Clone, Debug, Default)]
pub struct StyleStore {
    records: HashMap<(NodeId, UndoKind), UndoRecord>,
    handoffs: Vec<Handoff>,
    wireframe_color: Option<[f32; 3]>,
}

impl StyleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render wireframes in this color instead of each material's own.
    pub fn with_wireframe_color(mut self, color: Option<[f32; 3]>) -> Self {
        self.wireframe_color = color;
        self
    }

    /// Returns `true` if `node` has a pending change of `kind`.
    pub fn is_pending(&self, node: NodeId, kind: UndoKind) -> bool {
        self.records.contains_key(&(node, kind))
    }

    /// Number of pending changes of `kind`.
    pub fn pending(&self, kind: UndoKind) -> usize {
        self.records.keys().filter(|(_, k)| *k == kind).count()
    }

    /// Number of reverted slot entries still waiting for their original material.
    pub fn unsettled(&self) -> usize {
        self.handoffs.len()
    }

    /// Drop records of nodes that no longer exist.
    pub fn forget_removed(&mut self, scene: &Scene) {
        self.records.retain(|(node, _), _| scene.is_alive(*node));
    }

    /// Finish reverted material swaps whose slot entry was held by a later change.
    ///
    /// Once the later change is undone and the entry holds the swapped-in material again, the
    /// original material goes back and store-made wireframe copies are discarded. Entries of
    /// removed nodes are dropped. Every store method calls this first; call it after
    /// [`revert_opacity`](crate::revert_opacity) when not going through
    /// [`ObjectUtils`](crate::ObjectUtils).
    pub fn settle(&mut self, scene: &mut Scene) {
        self.handoffs.retain(|h| {
            let alive = scene.is_alive(h.node);
            let home =
                alive && slot_material(scene, h.node, h.swap.index) == Some(h.swap.installed);
            if alive && !home {
                return true;
            }
            if home {
                set_slot_material(scene, h.node, h.swap.index, h.swap.original);
            }
            if h.owned {
                scene.remove_material(h.swap.installed);
            }
            false
        });
    }

    /// Save a record unless one of this kind is already pending. Returns whether it was saved.
    pub(crate) fn stash(&mut self, node: NodeId, kind: UndoKind, record: UndoRecord) -> bool {
        match self.records.entry((node, kind)) {
            hashbrown::hash_map::Entry::Occupied(_) => false,
            hashbrown::hash_map::Entry::Vacant(v) => {
                v.insert(record);
                true
            }
        }
    }

    /// Consume a pending record.
    pub(crate) fn take(&mut self, node: NodeId, kind: UndoKind) -> Option<UndoRecord> {
        self.records.remove(&(node, kind))
    }

    // --- material substitution ---

    /// Put `material` in every slot entry of every drawable node in the subtree that `filter`
    /// admits.
    ///
    /// Applying again on top keeps the materials from before the first call and tracks the
    /// newest one.
    pub fn apply_material(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        material: MaterialId,
        filter: IdFilter<'_>,
    ) {
        self.settle(scene);
        let nodes = filter.select(scene, root, NodeKind::is_drawable);
        for &node in &nodes {
            let Some(mut slot) = slot_of(scene, node) else {
                continue;
            };
            if let Some(UndoRecord::Swaps(swaps)) =
                self.records.get_mut(&(node, UndoKind::AppliedMaterial))
            {
                for swap in swaps.iter_mut() {
                    swap.installed = material;
                }
            } else {
                let swaps = slot
                    .ids()
                    .iter()
                    .enumerate()
                    .map(|(index, &original)| Swap {
                        index,
                        original,
                        installed: material,
                    })
                    .collect();
                self.stash(node, UndoKind::AppliedMaterial, UndoRecord::Swaps(swaps));
            }
            for id in slot.ids_mut() {
                *id = material;
            }
            replace_slot(scene, node, slot);
        }
        tracing::debug!(nodes = nodes.len(), "apply_material");
    }

    /// Restore the materials saved by [`StyleStore::apply_material`].
    pub fn revert_applied_material(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        filter: IdFilter<'_>,
    ) {
        self.revert_swaps(scene, root, filter, UndoKind::AppliedMaterial);
    }

    // --- double-sided ---

    /// Render both faces of every drawable node in the subtree that `filter` admits.
    ///
    /// This changes the materials themselves, so other nodes sharing them are affected too.
    pub fn set_double_sided(&mut self, scene: &mut Scene, root: NodeId, filter: IdFilter<'_>) {
        self.settle(scene);
        let nodes = filter.select(scene, root, NodeKind::is_drawable);
        for &node in &nodes {
            let Some(slot) = slot_of(scene, node) else {
                continue;
            };
            let sides = slot
                .ids()
                .iter()
                .filter_map(|&id| Some((id, scene.material(id)?.side)))
                .collect();
            self.stash(node, UndoKind::DoubleSided, UndoRecord::Sides(sides));
            for &id in slot.ids() {
                if let Some(m) = scene.material_mut(id) {
                    m.side = Side::Double;
                }
            }
        }
        tracing::debug!(nodes = nodes.len(), "set_double_sided");
    }

    /// Restore face culling saved by [`StyleStore::set_double_sided`].
    pub fn revert_double_sided(&mut self, scene: &mut Scene, root: NodeId, filter: IdFilter<'_>) {
        self.settle(scene);
        let nodes = filter.select(scene, root, NodeKind::is_drawable);
        // Latest captures first, so a material shared by several nodes ends at its oldest side.
        for &node in nodes.iter().rev() {
            let Some(UndoRecord::Sides(sides)) = self.take(node, UndoKind::DoubleSided) else {
                continue;
            };
            for (id, side) in sides {
                if let Some(m) = scene.material_mut(id) {
                    m.side = side;
                }
            }
        }
    }

    // --- wireframe ---

    /// Draw every mesh in the subtree that `filter` admits as a wireframe.
    ///
    /// Each slot entry gets its own wireframe copy of its current material, discarded again on
    /// revert. Entries that are already wireframe are left alone, and meshes with a pending
    /// wireframe are skipped.
    pub fn set_wireframe(&mut self, scene: &mut Scene, root: NodeId, filter: IdFilter<'_>) {
        self.settle(scene);
        let nodes = filter.select(scene, root, |k| k == NodeKind::Mesh);
        let mut changed = 0_usize;
        for &node in &nodes {
            if self.is_pending(node, UndoKind::Wireframe) {
                continue;
            }
            let Some(mut slot) = slot_of(scene, node) else {
                continue;
            };
            let mut swaps = SmallVec::new();
            for (index, id) in slot.ids_mut().iter_mut().enumerate() {
                if let Some(copy) = self.wireframe_copy(scene, *id) {
                    swaps.push(Swap {
                        index,
                        original: *id,
                        installed: copy,
                    });
                    *id = copy;
                }
            }
            self.stash(node, UndoKind::Wireframe, UndoRecord::Swaps(swaps));
            replace_slot(scene, node, slot);
            changed += 1;
        }
        tracing::debug!(nodes = nodes.len(), changed, "set_wireframe");
    }

    /// Restore the materials saved by [`StyleStore::set_wireframe`].
    pub fn revert_wireframe(&mut self, scene: &mut Scene, root: NodeId, filter: IdFilter<'_>) {
        self.revert_swaps(scene, root, filter, UndoKind::Wireframe);
    }

    fn wireframe_copy(&self, scene: &mut Scene, source: MaterialId) -> Option<MaterialId> {
        if scene.material(source)?.is_wireframe() {
            return None;
        }
        let copy = scene.clone_material(source)?;
        if let Some(m) = scene.material_mut(copy) {
            m.flags.insert(MaterialFlags::WIREFRAME);
            if let Some(color) = self.wireframe_color {
                m.color = color;
            }
        }
        Some(copy)
    }

    fn revert_swaps(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        filter: IdFilter<'_>,
        kind: UndoKind,
    ) {
        self.settle(scene);
        let owned = kind == UndoKind::Wireframe;
        let nodes: Vec<NodeId> = filter.select(scene, root, |_| true);
        let mut reverted = 0_usize;
        for &node in nodes.iter().rev() {
            let Some(UndoRecord::Swaps(swaps)) = self.take(node, kind) else {
                continue;
            };
            for swap in swaps {
                if let Some(current) = slot_material(scene, node, swap.index)
                    && current != swap.installed
                {
                    hand_over(scene, current, swap, owned);
                }
                self.handoffs.push(Handoff { node, swap, owned });
            }
            reverted += 1;
        }
        self.settle(scene);
        tracing::debug!(?kind, reverted, unsettled = self.handoffs.len(), "revert");
    }
}

/// Undo the look of `swap` on an entry that a later change took over.
///
/// `current` keeps its blending and takes the original's look when it was derived from the
/// installed material. A store-made copy gets the original's look too, so putting it back
/// before [`StyleStore::settle`] runs shows the original.
fn hand_over(scene: &mut Scene, current: MaterialId, swap: Swap, owned: bool) {
    let Some(original) = scene.material(swap.original).cloned() else {
        return;
    };
    let derived = match (scene.material(current), scene.material(swap.installed)) {
        (Some(c), Some(i)) => differs_only_in_blending(c, i),
        _ => false,
    };
    if derived {
        rebase(scene, current, &original);
    }
    if owned {
        rebase(scene, swap.installed, &original);
    }
}

/// `true` if `a` equals `b` apart from opacity, transparency and face culling.
fn differs_only_in_blending(a: &Material, b: &Material) -> bool {
    let mut a = a.clone();
    a.opacity = b.opacity;
    a.set_transparent(b.is_transparent());
    a.side = b.side;
    a == *b
}

/// Make `target` look like `original` while keeping its own blending.
fn rebase(scene: &mut Scene, target: MaterialId, original: &Material) {
    if let Some(m) = scene.material_mut(target) {
        let (opacity, transparent, side) = (m.opacity, m.is_transparent(), m.side);
        *m = original.clone();
        m.opacity = opacity;
        m.set_transparent(transparent);
        m.side = side;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opacity::{revert_opacity, set_opacity};
    use alloc::vec;
    use glam::Vec3;
    use understory_scene::{Geometry, SceneNode};

    fn scene() -> (Scene, NodeId, [NodeId; 2], MaterialId) {
        let mut scene = Scene::new();
        let g = scene.add_geometry(Geometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]));
        let m = scene.add_material(Material::surface([0.2, 0.4, 0.6]));
        let root = scene.insert(None, SceneNode::group("root"));
        let a = scene.insert(Some(root), SceneNode::mesh("a", g, m).with_object_id(1));
        let b = scene.insert(Some(root), SceneNode::mesh("b", g, m).with_object_id(2));
        (scene, root, [a, b], m)
    }

    fn material_of(scene: &Scene, node: NodeId) -> &Material {
        scene.material(slot_material(scene, node, 0).unwrap()).unwrap()
    }

    #[test]
    fn wireframe_first_write_wins() {
        let (mut scene, root, [a, b], original) = scene();
        let mut store = StyleStore::new();

        store.set_wireframe(&mut scene, root, IdFilter::new());
        let wire_a = slot_material(&scene, a, 0).unwrap();
        let wire_b = slot_material(&scene, b, 0).unwrap();
        assert!(material_of(&scene, a).is_wireframe());
        assert!(material_of(&scene, b).is_wireframe());
        assert_ne!(wire_a, wire_b, "each entry gets its own copy");

        store.set_wireframe(&mut scene, root, IdFilter::new());
        assert_eq!(slot_material(&scene, a, 0), Some(wire_a), "second call is a no-op");
        assert_eq!(slot_material(&scene, b, 0), Some(wire_b));
        assert_eq!(store.pending(UndoKind::Wireframe), 2);

        store.revert_wireframe(&mut scene, root, IdFilter::new());
        assert_eq!(slot_material(&scene, a, 0), Some(original));
        assert_eq!(slot_material(&scene, b, 0), Some(original));
        assert_eq!(store.pending(UndoKind::Wireframe), 0);
        assert!(scene.material(wire_a).is_none(), "copies are discarded");
        assert!(scene.material(wire_b).is_none());

        // Reverting again is a no-op.
        store.revert_wireframe(&mut scene, root, IdFilter::new());
        assert_eq!(slot_material(&scene, a, 0), Some(original));
    }

    #[test]
    fn wireframe_copy_follows_later_changes_to_its_source() {
        let (mut scene, root, [a, _], original) = scene();
        {
            let m = scene.material_mut(original).unwrap();
            m.set_transparent(true);
            m.opacity = 0.75;
        }
        let mut store = StyleStore::new();

        store.set_wireframe(&mut scene, root, IdFilter::new());
        let first = slot_material(&scene, a, 0).unwrap();
        assert_eq!(material_of(&scene, a).opacity, 0.75);
        store.revert_wireframe(&mut scene, root, IdFilter::new());
        assert!(scene.material(first).is_none(), "reverted copy is discarded");

        // A blending material is faded in place.
        let infos = set_opacity(&mut scene, root, Some(0.2), IdFilter::new());
        assert!(infos.iter().all(|i| i.cloned_material.is_none()));
        store.set_wireframe(&mut scene, root, IdFilter::new());
        let m = material_of(&scene, a);
        assert!(m.is_wireframe());
        assert_eq!(m.opacity, 0.2, "copy is taken from the current source");
    }

    #[test]
    fn wireframe_reverted_under_opacity_keeps_the_fade() {
        let (mut scene, root, [a, _], original) = scene();
        let mut store = StyleStore::new();

        store.set_wireframe(&mut scene, root, IdFilter::new());
        let wire = slot_material(&scene, a, 0).unwrap();
        let infos = set_opacity(&mut scene, root, Some(0.3), IdFilter::new());
        let faded = slot_material(&scene, a, 0).unwrap();
        assert_ne!(faded, wire);

        store.revert_wireframe(&mut scene, root, IdFilter::new());
        assert_eq!(store.pending(UndoKind::Wireframe), 0);
        let m = material_of(&scene, a);
        assert!(!m.is_wireframe(), "wireframe is gone");
        assert_eq!((m.opacity, m.is_transparent()), (0.3, true), "fade survives");
        assert_eq!(m.color, [0.2, 0.4, 0.6]);
        assert_eq!(store.unsettled(), 2);

        revert_opacity(&mut scene, &infos, IdFilter::new());
        store.settle(&mut scene);
        assert_eq!(slot_material(&scene, a, 0), Some(original));
        let m = material_of(&scene, a);
        assert_eq!((m.opacity, m.is_transparent()), (1.0, false));
        assert!(scene.material(faded).is_none(), "opacity copy is discarded");
        assert!(scene.material(wire).is_none(), "wireframe copy is discarded");
        assert_eq!(store.unsettled(), 0);
    }

    #[test]
    fn applied_material_reverted_under_opacity_keeps_the_fade() {
        let (mut scene, root, [a, _], original) = scene();
        let red = scene.add_material(Material::surface([1.0, 0.0, 0.0]));
        let mut store = StyleStore::new();

        store.apply_material(&mut scene, root, red, IdFilter::new());
        let infos = set_opacity(&mut scene, root, Some(0.5), IdFilter::new());
        store.revert_applied_material(&mut scene, root, IdFilter::new());
        let m = material_of(&scene, a);
        assert_eq!(m.color, [0.2, 0.4, 0.6], "original look is back");
        assert_eq!((m.opacity, m.is_transparent()), (0.5, true));

        revert_opacity(&mut scene, &infos, IdFilter::new());
        store.settle(&mut scene);
        assert_eq!(slot_material(&scene, a, 0), Some(original));
        let red = scene.material(red).expect("applied material is not the store's to discard");
        assert_eq!((red.color, red.opacity), ([1.0, 0.0, 0.0], 1.0));
    }

    #[test]
    fn unsettled_entries_of_removed_nodes_are_dropped() {
        let (mut scene, root, [a, _], _) = scene();
        let mut store = StyleStore::new();
        store.set_wireframe(&mut scene, root, IdFilter::new());
        let wire = slot_material(&scene, a, 0).unwrap();
        let _infos = set_opacity(&mut scene, root, Some(0.3), IdFilter::new());
        store.revert_wireframe(&mut scene, root, IdFilter::new());
        assert_eq!(store.unsettled(), 2);

        scene.remove(root);
        store.settle(&mut scene);
        assert_eq!(store.unsettled(), 0);
        assert!(scene.material(wire).is_none());
    }

    #[test]
    fn applied_material_stacks_back_to_original() {
        let (mut scene, root, [a, b], original) = scene();
        let red = scene.add_material(Material::surface([1.0, 0.0, 0.0]));
        let green = scene.add_material(Material::surface([0.0, 1.0, 0.0]));
        let mut store = StyleStore::new();

        store.apply_material(&mut scene, root, red, IdFilter::new().include(&[1]));
        store.apply_material(&mut scene, root, green, IdFilter::new());
        assert_eq!(slot_material(&scene, a, 0), Some(green));
        assert_eq!(slot_material(&scene, b, 0), Some(green));

        store.revert_applied_material(&mut scene, root, IdFilter::new());
        assert_eq!(slot_material(&scene, a, 0), Some(original), "true original, not red");
        assert_eq!(slot_material(&scene, b, 0), Some(original));
    }

    #[test]
    fn double_sided_on_shared_material_restores_oldest_side() {
        let (mut scene, root, [a, _], m) = scene();
        scene.material_mut(m).unwrap().side = Side::Back;
        let mut store = StyleStore::new();

        store.set_double_sided(&mut scene, root, IdFilter::new());
        assert_eq!(material_of(&scene, a).side, Side::Double);
        store.revert_double_sided(&mut scene, root, IdFilter::new());
        assert_eq!(scene.material(m).unwrap().side, Side::Back);
        assert_eq!(store.pending(UndoKind::DoubleSided), 0);
    }

    #[test]
    fn revert_is_scoped_by_filter() {
        let (mut scene, root, [a, b], original) = scene();
        let red = scene.add_material(Material::surface([1.0, 0.0, 0.0]));
        let mut store = StyleStore::new();
        store.apply_material(&mut scene, root, red, IdFilter::new());

        store.revert_applied_material(&mut scene, root, IdFilter::new().exclude(&[2]));
        assert_eq!(slot_material(&scene, a, 0), Some(original));
        assert_eq!(slot_material(&scene, b, 0), Some(red));
        assert!(store.is_pending(b, UndoKind::AppliedMaterial));
    }

    #[test]
    fn kinds_do_not_disturb_each_other() {
        let (mut scene, root, [a, _], original) = scene();
        let mut store = StyleStore::new();

        // Opacity, then wireframe on top, then unwind the wireframe.
        let infos = set_opacity(&mut scene, root, Some(0.4), IdFilter::new());
        let translucent = slot_material(&scene, a, 0).unwrap();
        store.set_wireframe(&mut scene, root, IdFilter::new());
        store.set_double_sided(&mut scene, root, IdFilter::new());
        let wire = slot_material(&scene, a, 0).unwrap();
        store.revert_wireframe(&mut scene, root, IdFilter::new());

        assert_eq!(slot_material(&scene, a, 0), Some(translucent));
        assert!(scene.material(wire).is_none(), "wireframe copy is discarded");
        assert_eq!(store.unsettled(), 0);
        let m = material_of(&scene, a);
        assert_eq!((m.opacity, m.is_transparent()), (0.4, true));
        assert!(store.is_pending(a, UndoKind::DoubleSided));

        store.revert_double_sided(&mut scene, root, IdFilter::new());
        revert_opacity(&mut scene, &infos, IdFilter::new());
        assert_eq!(slot_material(&scene, a, 0), Some(original));
        let m = material_of(&scene, a);
        assert_eq!((m.opacity, m.is_transparent(), m.side), (1.0, false, Side::Front));
    }

    #[test]
    fn forget_removed_drops_stale_records() {
        let (mut scene, root, [a, _], _) = scene();
        let mut store = StyleStore::new();
        store.set_double_sided(&mut scene, root, IdFilter::new());
        scene.remove(a);
        store.forget_removed(&scene);
        assert_eq!(store.pending(UndoKind::DoubleSided), 1);
    }
}
