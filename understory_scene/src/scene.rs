// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: structure, materials, geometry, lookups.

use alloc::{vec, vec::Vec};
use glam::Affine3A;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::geometry::{Aabb3, Geometry, GeometryId};
use crate::material::{Material, MaterialId};
use crate::types::{NodeFlags, NodeId, NodeKind, SceneNode};

/// A scene graph of named, optionally id-tagged nodes.
///
/// The scene owns three arenas: nodes (generational, see [`NodeId`]), materials, and geometry.
/// Materials and geometry are shared by reference, so several nodes can point at the same
/// [`MaterialId`] or [`GeometryId`]; mutating a shared material affects every node using it.
///
/// ## Example
///
/// ```rust
/// use understory_scene::{Geometry, Material, Scene, SceneNode};
///
/// let mut scene = Scene::new();
/// let building = scene.insert(None, SceneNode::group("Building").with_object_id(1));
/// let geometry = scene.add_geometry(Geometry::default());
/// let material = scene.add_material(Material::surface([0.8, 0.8, 0.8]));
/// let wall = scene.insert(
///     Some(building),
///     SceneNode::mesh("5F(Wall)", geometry, material).with_object_id(2),
/// );
///
/// assert_eq!(scene.find_by_object_id(2), Some(wall));
/// assert_eq!(scene.children_of(building), &[wall]);
/// ```
///
/// [`NodeId`]: crate::NodeId
#[derive(Clone)]
pub struct Scene {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    materials: Vec<Option<Material>>,
    geometries: Vec<Option<Geometry>>,
    /// object id → live nodes carrying it, oldest first
    by_object_id: HashMap<u32, SmallVec<[NodeId; 1]>>,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let materials = self.material_count();
        let geometries = self.geometries.iter().filter(|g| g.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("materials", &materials)
            .field("geometries", &geometries)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: SceneNode,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            materials: Vec::new(),
            geometries: Vec::new(),
            by_object_id: HashMap::new(),
        }
    }

    /// Insert a new node as the last child of `parent` (or as a root if `None`).
    ///
    /// If `parent` is stale the node is inserted as a root.
    pub fn insert(&mut self, parent: Option<NodeId>, data: SceneNode) -> NodeId {
        let object_id = data.object_id;
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, data));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, data)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent
            && self.is_alive(p)
        {
            self.link_parent(id, p);
        }
        if let Some(object_id) = object_id {
            self.by_object_id.entry(object_id).or_default().push(id);
        }
        id
    }

    /// Remove a node (and its subtree) from the scene.
    ///
    /// Materials and geometry referenced by the subtree stay in their arenas.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes[current.idx()].take() else {
                continue;
            };
            stack.extend(node.children.iter().copied());
            if let Some(object_id) = node.data.object_id {
                self.unindex_object_id(object_id, current);
            }
            self.free_list.push(current.idx());
        }
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Node data for a live identifier.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.node_opt(id).map(|n| &n.data)
    }

    /// Mutable node data for a live identifier.
    ///
    /// Changing `object_id` through this accessor does not update the id lookup; use
    /// [`Scene::set_object_id`] for that.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.node_opt_mut(id).map(|n| &mut n.data)
    }

    /// Classify a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(NodeKind::of)
    }

    /// Change a node's object id, keeping the id lookup in sync.
    pub fn set_object_id(&mut self, id: NodeId, object_id: Option<u32>) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        let old = core::mem::replace(&mut node.data.object_id, object_id);
        if let Some(old) = old {
            self.unindex_object_id(old, id);
        }
        if let Some(new) = object_id {
            self.by_object_id.entry(new).or_default().push(id);
        }
    }

    /// Resolve an application object id to a live node.
    ///
    /// When several nodes carry the id, the oldest one still in the scene wins.
    pub fn find_by_object_id(&self, object_id: u32) -> Option<NodeId> {
        self.by_object_id
            .get(&object_id)?
            .iter()
            .copied()
            .find(|&id| self.is_alive(id))
    }

    fn unindex_object_id(&mut self, object_id: u32, id: NodeId) {
        if let Some(ids) = self.by_object_id.get_mut(&object_id) {
            ids.retain(|n| *n != id);
            if ids.is_empty() {
                self.by_object_id.remove(&object_id);
            }
        }
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// All live root nodes, in slot order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                Some(n) if n.parent.is_none() =>
                {
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "NodeId uses 32-bit indices by design."
                    )]
                    Some(NodeId::new(i as u32, n.generation))
                }
                _ => None,
            })
            .collect()
    }

    /// Iterate the subtree rooted at `root` in depth-first pre-order, `root` included.
    ///
    /// Yields nothing for a stale root.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            scene: self,
            stack: if self.is_alive(root) {
                vec![root]
            } else {
                Vec::new()
            },
        }
    }

    /// Set or clear the visible flag of a live node.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.data.flags.set(NodeFlags::VISIBLE, visible);
        }
    }

    /// Returns the node's own visible flag, or `None` for stale ids.
    pub fn visible(&self, id: NodeId) -> Option<bool> {
        self.get(id).map(SceneNode::is_visible)
    }

    /// Returns `true` if the node and all its ancestors are visible.
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.get(node) {
                Some(data) if data.is_visible() => current = self.parent_of(node),
                _ => return false,
            }
        }
        true
    }

    /// Return the local→world transform of a live node.
    pub fn world_transform(&self, id: NodeId) -> Option<Affine3A> {
        let mut tf = self.get(id)?.local_transform;
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            let node = self.node(parent);
            tf = node.data.local_transform * tf;
            current = node.parent;
        }
        Some(tf)
    }

    /// World-space bounds of all drawable geometry in a subtree.
    ///
    /// With `visible_only`, invisible nodes and their subtrees are skipped. Returns `None`
    /// when nothing contributes.
    pub fn subtree_bounds(&self, root: NodeId, visible_only: bool) -> Option<Aabb3> {
        let base = match self.parent_of(root) {
            Some(parent) => self.world_transform(parent)?,
            None => Affine3A::IDENTITY,
        };
        let mut out: Option<Aabb3> = None;
        let mut stack = vec![(root, base)];
        while let Some((id, parent_tf)) = stack.pop() {
            let Some(node) = self.node_opt(id) else {
                continue;
            };
            if visible_only && !node.data.is_visible() {
                continue;
            }
            let tf = parent_tf * node.data.local_transform;
            if let Some(bounds) = node
                .data
                .content
                .geometry()
                .and_then(|g| self.geometry(g))
                .and_then(Geometry::bounds)
            {
                let world = bounds.transformed(tf);
                out = Some(out.map_or(world, |acc| acc.union(world)));
            }
            for &child in node.children.iter().rev() {
                stack.push((child, tf));
            }
        }
        out
    }

    // --- materials ---

    /// Add a material and return its identifier.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(Some(material));
        #[allow(
            clippy::cast_possible_truncation,
            reason = "MaterialId uses 32-bit indices by design."
        )]
        MaterialId((self.materials.len() - 1) as u32)
    }

    /// Add a copy of an existing material, or `None` if `id` is dead.
    pub fn clone_material(&mut self, id: MaterialId) -> Option<MaterialId> {
        let copy = self.material(id)?.clone();
        Some(self.add_material(copy))
    }

    /// Remove a material. Nodes still referencing it will resolve to nothing.
    pub fn remove_material(&mut self, id: MaterialId) -> Option<Material> {
        self.materials.get_mut(id.0 as usize)?.take()
    }

    /// Look up a material.
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)?.as_ref()
    }

    /// Look up a material mutably.
    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0 as usize)?.as_mut()
    }

    /// Number of live materials.
    pub fn material_count(&self) -> usize {
        self.materials.iter().filter(|m| m.is_some()).count()
    }

    // --- geometry ---

    /// Add a geometry buffer and return its identifier.
    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(Some(geometry));
        #[allow(
            clippy::cast_possible_truncation,
            reason = "GeometryId uses 32-bit indices by design."
        )]
        GeometryId((self.geometries.len() - 1) as u32)
    }

    /// Look up a geometry buffer.
    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0 as usize)?.as_ref()
    }

    /// Remove a geometry buffer.
    pub fn remove_geometry(&mut self, id: GeometryId) -> Option<Geometry> {
        self.geometries.get_mut(id.0 as usize)?.take()
    }

    // --- internals ---

    /// Access a node; panics if `id` is stale.
    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        let parent_node = self.node_mut(parent);
        parent_node.children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        let p = self.node_mut(parent);
        p.children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }
}

impl Node {
    fn new(generation: u32, data: SceneNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            data,
        }
    }
}

/// Depth-first pre-order iterator over a subtree, created by [`Scene::descendants`].
#[derive(Clone, Debug)]
pub struct Descendants<'a> {
    scene: &'a Scene,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        // Reversed so children come out in their stored order.
        self.stack
            .extend(self.scene.children_of(id).iter().rev().copied());
        Some(id)
    }
}
