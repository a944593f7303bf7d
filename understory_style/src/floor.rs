// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floor tokens parsed from node names.
//!
//! Drawings exported from building CAD tools name their layers after the storey they belong
//! to, for example `5F(Lobby)`, `B1F_Parking` or `[12F] Core`. A floor token is a whole
//! name segment shaped like `[B]<digits>F`, compared without regard to case. Segments are
//! separated by any character that is not ASCII alphanumeric, so brackets, parentheses,
//! underscores, dashes and spaces all delimit.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use smallvec::SmallVec;
use understory_scene::Scene;

/// Extract the floor tokens carried by a name, in order of appearance.
///
/// ```rust
/// use understory_style::floor_tokens;
///
/// assert_eq!(floor_tokens("5F(A)").as_slice(), ["5F"]);
/// assert_eq!(floor_tokens("B1F_Parking-2F").as_slice(), ["B1F", "2F"]);
/// assert!(floor_tokens("F5 Lobby").is_empty());
/// ```
pub fn floor_tokens(name: &str) -> SmallVec<[&str; 2]> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| is_floor_token(segment))
        .collect()
}

/// Returns `true` if `name` carries `floor` as a whole token.
///
/// `"21F(Lobby)"` does not match `"1F"`.
pub fn match_floor(name: &str, floor: &str) -> bool {
    floor_tokens(name)
        .iter()
        .any(|token| token.eq_ignore_ascii_case(floor))
}

/// Returns `true` if `name` carries any of `floors` as a whole token.
pub fn match_floors<S: AsRef<str>>(name: &str, floors: &[S]) -> bool {
    let tokens = floor_tokens(name);
    tokens
        .iter()
        .any(|token| floors.iter().any(|f| token.eq_ignore_ascii_case(f.as_ref())))
}

/// Collect the distinct floor tokens found in the subtrees of the given objects.
///
/// Object ids that do not resolve are ignored. Tokens are normalized to upper case and
/// returned sorted.
pub fn distinct_floors(scene: &Scene, object_ids: &[u32]) -> Vec<String> {
    let mut found = BTreeSet::new();
    for &object_id in object_ids {
        let Some(root) = scene.find_by_object_id(object_id) else {
            tracing::debug!(object_id, "distinct_floors: unknown object");
            continue;
        };
        for id in scene.descendants(root) {
            let Some(node) = scene.get(id) else {
                continue;
            };
            for token in floor_tokens(&node.name) {
                found.insert(token.to_ascii_uppercase());
            }
        }
    }
    found.into_iter().collect()
}

fn is_floor_token(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let Some((last, rest)) = bytes.split_last() else {
        return false;
    };
    if !last.eq_ignore_ascii_case(&b'F') {
        return false;
    }
    let digits = match rest.split_first() {
        Some((first, digits)) if first.eq_ignore_ascii_case(&b'B') => digits,
        _ => rest,
    };
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_scene::SceneNode;

    #[test]
    fn whole_segments_only() {
        assert!(!match_floor("21F(Lobby)", "1F"));
        assert!(match_floor("21F(Lobby)", "21F"));
        assert!(match_floor("5F(A)", "5F"));
        assert!(!match_floor("5F(A)", "4F"));
        assert!(!match_floor("5F(A)", "A"), "non-floor segments are never tokens");
        assert!(match_floor("[5f] core", "5F"), "case-insensitive");
        assert!(!match_floor("5FA", "5F"));
        assert!(!match_floor("F", "F"));
        assert!(!match_floor("BF", "BF"));
    }

    #[test]
    fn basement_tokens() {
        assert!(match_floor("B2F_Parking", "b2f"));
        assert!(!match_floor("B2F_Parking", "2F"));
    }

    #[test]
    fn any_of_several_floors() {
        assert!(match_floors("3F-Stair", &["1F", "3F"]));
        assert!(!match_floors("13F-Stair", &["1F", "3F"]));
        assert!(!match_floors::<&str>("3F-Stair", &[]));
    }

    #[test]
    fn distinct_floors_dedups_across_objects() {
        let mut scene = Scene::new();
        let a = scene.insert(None, SceneNode::group("A").with_object_id(1));
        scene.insert(Some(a), SceneNode::group("1F(Hall)"));
        scene.insert(Some(a), SceneNode::group("2f(Hall)"));
        let b = scene.insert(None, SceneNode::group("B").with_object_id(2));
        scene.insert(Some(b), SceneNode::group("1F_Wall"));
        scene.insert(Some(b), SceneNode::group("B1F_Wall"));

        assert_eq!(distinct_floors(&scene, &[1, 2, 99]), ["1F", "2F", "B1F"]);
        assert_eq!(distinct_floors(&scene, &[2]), ["1F", "B1F"]);
        assert!(distinct_floors(&scene, &[]).is_empty());
    }
}
