// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Include/exclude scoping by object id.

use alloc::vec::Vec;

use understory_scene::{NodeId, NodeKind, Scene};

/// Restricts which nodes an operation touches, by object id.
///
/// Used by every style and outline operation to scope a subtree walk. The filter is evaluated
/// for each node on its own; excluding a group does not exclude its children.
///
/// - A non-empty include list admits only ids it contains. Nodes without an object id are
///   rejected while such a list is present.
/// - An exclude list rejects the ids it contains.
/// - Both lists apply together.
/// - An empty include list is the same as no include list.
///
/// ```rust
/// use understory_style::IdFilter;
///
/// let filter = IdFilter::new().include(&[1, 2]).exclude(&[2]);
/// assert!(filter.includes(Some(1)));
/// assert!(!filter.includes(Some(2)));
/// assert!(!filter.includes(Some(3)));
/// assert!(!filter.includes(None));
///
/// assert!(IdFilter::new().includes(None));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct IdFilter<'a> {
    /// Ids that may participate. `None` or empty means every id.
    pub include: Option<&'a [u32]>,
    /// Ids that must not participate.
    pub exclude: Option<&'a [u32]>,
}

impl<'a> IdFilter<'a> {
    /// Create a new empty filter (includes all nodes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to these ids.
    pub fn include(mut self, ids: &'a [u32]) -> Self {
        self.include = Some(ids);
        self
    }

    /// Reject these ids.
    pub fn exclude(mut self, ids: &'a [u32]) -> Self {
        self.exclude = Some(ids);
        self
    }

    /// Check whether a node with this object id participates.
    pub fn includes(&self, id: Option<u32>) -> bool {
        included(id, self.include, self.exclude)
    }

    /// Live nodes of the subtree at `root`, in pre-order, that this filter admits and whose
    /// kind satisfies `kind`.
    pub(crate) fn select(
        &self,
        scene: &Scene,
        root: NodeId,
        kind: impl Fn(NodeKind) -> bool,
    ) -> Vec<NodeId> {
        scene
            .descendants(root)
            .filter(|&id| {
                scene
                    .get(id)
                    .is_some_and(|n| kind(n.kind()) && self.includes(n.object_id))
            })
            .collect()
    }
}

/// Free-function form of [`IdFilter::includes`].
pub fn included(id: Option<u32>, include: Option<&[u32]>, exclude: Option<&[u32]>) -> bool {
    if let Some(include) = include
        && !include.is_empty()
    {
        match id {
            Some(id) if include.contains(&id) => {}
            _ => return false,
        }
    }
    match (id, exclude) {
        (Some(id), Some(exclude)) => !exclude.contains(&id),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_list_narrows_and_exclude_subtracts() {
        let ids = [Some(1), Some(2), Some(3)];
        let pass = |f: IdFilter<'_>| -> alloc::vec::Vec<u32> {
            ids.iter().filter(|id| f.includes(**id)).flatten().copied().collect()
        };

        assert_eq!(pass(IdFilter::new()), [1, 2, 3]);
        assert_eq!(pass(IdFilter::new().include(&[1, 2])), [1, 2]);
        assert_eq!(pass(IdFilter::new().include(&[1, 2]).exclude(&[2])), [1]);
        assert_eq!(pass(IdFilter::new().exclude(&[3])), [1, 2]);
        assert_eq!(pass(IdFilter::new().include(&[]).exclude(&[])), [1, 2, 3]);
    }

    #[test]
    fn missing_id_only_fails_a_non_empty_include_list() {
        assert!(included(None, None, None));
        assert!(included(None, Some(&[]), Some(&[1])));
        assert!(!included(None, Some(&[1]), None));
    }
}
