// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floor filtering.

use alloc::vec::Vec;

use understory_scene::{NodeId, Scene};

use crate::floor::{floor_tokens, match_floors};
use crate::store::{StyleStore, UndoKind, UndoRecord};

/// Classify every node under `root` (inclusive) against `floors`, in pre-order.
///
/// A node matches when its own name carries one of the floor tokens, or when any of its
/// descendants match, which keeps the containers of matching nodes reachable. A node whose name
/// carries no floor token at all also follows its parent, so the parts of a matching storey
/// match with it; a node naming a different floor does not.
pub fn traverse_by_floors<S: AsRef<str>>(
    scene: &Scene,
    root: NodeId,
    floors: &[S],
    mut on_match: impl FnMut(NodeId),
    mut on_unmatch: impl FnMut(NodeId),
) {
    // Pre-order, with each node's parent position.
    let mut order: Vec<(NodeId, Option<usize>)> = Vec::new();
    let mut stack = alloc::vec![(root, None)];
    while let Some((id, parent)) = stack.pop() {
        if !scene.is_alive(id) {
            continue;
        }
        let here = order.len();
        order.push((id, parent));
        for &child in scene.children_of(id).iter().rev() {
            stack.push((child, Some(here)));
        }
    }

    let mut matched: Vec<bool> = Vec::with_capacity(order.len());
    for &(id, parent) in &order {
        let Some(node) = scene.get(id) else {
            matched.push(false);
            continue;
        };
        let m = if floor_tokens(&node.name).is_empty() {
            parent.is_some_and(|p| matched[p])
        } else {
            match_floors(&node.name, floors)
        };
        matched.push(m);
    }
    // Children come after their parents, so a reverse sweep sees every descendant first.
    for i in (0..order.len()).rev() {
        if matched[i]
            && let Some(p) = order[i].1
        {
            matched[p] = true;
        }
    }

    for (&(id, _), &m) in order.iter().zip(&matched) {
        if m { on_match(id) } else { on_unmatch(id) }
    }
}

/// Show the nodes under `root` that belong to any of `floors`.
///
/// Every visited node's visibility is recorded in `store` first (keeping any earlier record),
/// so [`revert_visible_for_floors`] restores the state from before the first call. Matching
/// nodes are made visible. With `make_unmatched_invisible`, the rest are hidden; otherwise
/// they are left as they are.
pub fn set_visible_for_floors<S: AsRef<str>>(
    scene: &mut Scene,
    store: &mut StyleStore,
    root: NodeId,
    floors: &[S],
    make_unmatched_invisible: bool,
) {
    let mut shown = Vec::new();
    let mut hidden = Vec::new();
    traverse_by_floors(scene, root, floors, |id| shown.push(id), |id| hidden.push(id));

    for &id in shown.iter().chain(&hidden) {
        if let Some(visible) = scene.visible(id) {
            store.stash(id, UndoKind::FloorVisibility, UndoRecord::Visible(visible));
        }
    }
    for &id in &shown {
        scene.set_visible(id, true);
    }
    if make_unmatched_invisible {
        for &id in &hidden {
            scene.set_visible(id, false);
        }
    }
    tracing::debug!(
        matched = shown.len(),
        unmatched = hidden.len(),
        "set_visible_for_floors"
    );
}

/// Restore the visibility recorded by [`set_visible_for_floors`] for nodes under `root`.
///
/// Nodes without a record are left alone.
pub fn revert_visible_for_floors(scene: &mut Scene, store: &mut StyleStore, root: NodeId) {
    let nodes: Vec<NodeId> = scene.descendants(root).collect();
    for id in nodes.into_iter().rev() {
        if let Some(UndoRecord::Visible(visible)) = store.take(id, UndoKind::FloorVisibility) {
            scene.set_visible(id, visible);
        }
    }
}
