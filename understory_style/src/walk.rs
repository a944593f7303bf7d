// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subtree search by name, object id, and metadata.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use understory_scene::{NodeId, NodeKind, Scene, SceneNode};

/// Search a subtree for nodes whose text matches `search_text`.
///
/// A node matches when its name, its object id rendered in decimal, or any scalar value in
/// its metadata map contains `search_text`, ignoring case. The walk is depth-first pre-order
/// from `root` (inclusive).
///
/// When `target_ids` is given, the walk only enters objects in that set. A node belongs to the
/// object named by its own object id or, failing that, by its nearest ancestor's. Branches
/// belonging to other objects are skipped without being visited; nodes that belong to no
/// object are walked through but never reported.
///
/// Outline decorations are never reported. With `first_only`, the walk stops at the first
/// match.
pub fn find(
    scene: &Scene,
    root: NodeId,
    search_text: &str,
    target_ids: Option<&[u32]>,
    first_only: bool,
) -> Vec<NodeId> {
    let needle = search_text.to_lowercase();
    let mut out = Vec::new();
    if scene.get(root).is_none() {
        return out;
    }
    let inherited = ancestor_object_id(scene, root);
    let mut stack = alloc::vec![(root, inherited)];
    while let Some((id, inherited)) = stack.pop() {
        let Some(node) = scene.get(id) else {
            continue;
        };
        let owner = node.object_id.or(inherited);
        if let Some(targets) = target_ids {
            match owner {
                Some(owner) if !targets.contains(&owner) => continue,
                None => {
                    push_children(scene, id, owner, &mut stack);
                    continue;
                }
                _ => {}
            }
        }
        if node.kind() != NodeKind::Outline && node_matches(node, &needle) {
            out.push(id);
            if first_only {
                break;
            }
        }
        push_children(scene, id, owner, &mut stack);
    }
    tracing::trace!(matches = out.len(), "find");
    out
}

/// The first node in pre-order matching `search_text`, see [`find`].
pub fn find_first(
    scene: &Scene,
    root: NodeId,
    search_text: &str,
    target_ids: Option<&[u32]>,
) -> Option<NodeId> {
    find(scene, root, search_text, target_ids, true)
        .first()
        .copied()
}

/// Whether a single node's searchable text contains `needle`, which must already be
/// lowercase.
pub(crate) fn node_matches(node: &SceneNode, needle: &str) -> bool {
    if contains_lowercase(&node.name, needle) {
        return true;
    }
    if let Some(id) = node.object_id
        && id.to_string().contains(needle)
    {
        return true;
    }
    node.user_data
        .values()
        .filter(|v| v.is_scalar())
        .any(|v| contains_lowercase(&v.to_string(), needle))
}

fn contains_lowercase(haystack: &str, needle: &str) -> bool {
    let lowered: String = haystack.to_lowercase();
    lowered.contains(needle)
}

fn ancestor_object_id(scene: &Scene, id: NodeId) -> Option<u32> {
    let mut current = scene.parent_of(id);
    while let Some(parent) = current {
        if let Some(object_id) = scene.get(parent).and_then(|n| n.object_id) {
            return Some(object_id);
        }
        current = scene.parent_of(parent);
    }
    None
}

fn push_children(
    scene: &Scene,
    id: NodeId,
    owner: Option<u32>,
    stack: &mut Vec<(NodeId, Option<u32>)>,
) {
    // Reversed so children are visited in their stored order.
    for &child in scene.children_of(id).iter().rev() {
        stack.push((child, owner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use understory_scene::{Geometry, Material, NodeFlags};

    fn scene() -> (Scene, [NodeId; 6]) {
        let mut scene = Scene::new();
        let root = scene.insert(None, SceneNode::group("Site"));
        let a = scene.insert(Some(root), SceneNode::group("Tower A").with_object_id(100));
        let a1 = scene.insert(Some(a), SceneNode::group("5F(Lobby)"));
        let a2 = scene.insert(
            Some(a),
            SceneNode::group("Door").with_user_data("layer", "LOBBY-DOORS"),
        );
        let b = scene.insert(Some(root), SceneNode::group("Tower B").with_object_id(200));
        let b1 = scene.insert(Some(b), SceneNode::group("lobby").with_object_id(201));
        (scene, [root, a, a1, a2, b, b1])
    }

    #[test]
    fn matches_name_id_and_metadata_case_insensitively() {
        let (scene, [root, _, a1, a2, _, b1]) = scene();
        assert_eq!(find(&scene, root, "LoBbY", None, false), vec![a1, a2, b1]);

        let (scene, [root, a, ..]) = self::scene();
        assert_eq!(find(&scene, root, "100", None, false), vec![a]);
    }

    #[test]
    fn first_only_stops_early() {
        let (scene, [root, _, a1, ..]) = scene();
        assert_eq!(find(&scene, root, "lobby", None, true), vec![a1]);
        assert_eq!(find_first(&scene, root, "lobby", None), Some(a1));
        assert_eq!(find_first(&scene, root, "nothing", None), None);
    }

    #[test]
    fn target_ids_prune_other_objects() {
        let (scene, [root, _, _, _, _, b1]) = scene();
        assert_eq!(find(&scene, root, "lobby", Some(&[200, 201]), false), vec![b1]);
        // 201 lives inside 200; without 200 in the set its branch is never entered.
        assert!(find(&scene, root, "lobby", Some(&[201]), false).is_empty());
    }

    #[test]
    fn target_ids_use_nearest_ancestor_when_starting_mid_tree() {
        let (scene, [_, a, a1, ..]) = scene();
        assert_eq!(find(&scene, a1, "lobby", Some(&[100]), false), vec![a1]);
        assert!(find(&scene, a1, "lobby", Some(&[200]), false).is_empty());
        assert_eq!(find(&scene, a, "tower", Some(&[100]), false), vec![a]);
    }

    #[test]
    fn outline_decorations_are_not_reported() {
        let mut scene = Scene::new();
        let g = scene.add_geometry(Geometry::default());
        let m = scene.add_material(Material::line([0.0, 0.0, 0.0]));
        let root = scene.insert(None, SceneNode::group("Site"));
        let wall = scene.insert(Some(root), SceneNode::mesh("Wall", g, m).with_object_id(7));
        let mut outline = SceneNode::lines("Wall", g, m);
        outline.flags.insert(NodeFlags::OUTLINE);
        let outline = scene.insert(Some(wall), outline);
        let plain = scene.insert(Some(wall), SceneNode::lines("Wall trim", g, m));

        assert_eq!(find(&scene, root, "wall", None, false), vec![wall, plain]);
        assert_eq!(find(&scene, root, "7", Some(&[7]), false), vec![wall]);
        assert!(find(&scene, outline, "wall", None, false).is_empty());
    }

    #[test]
    fn stale_root_yields_nothing() {
        let (mut scene, [root, ..]) = scene();
        scene.remove(root);
        assert!(find(&scene, root, "", None, false).is_empty());
    }
}
