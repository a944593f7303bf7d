// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One entry point for every style operation.

use alloc::string::String;
use alloc::vec::Vec;

use understory_scene::{Aabb3, MaterialId, NodeId, Scene};

use crate::filter::IdFilter;
use crate::opacity::{self, MaterialInfo};
use crate::outline::{self, OutlineGenerator, OutlineOptions, OutlineProgress, OutlineTask};
use crate::store::StyleStore;
use crate::{floor, visibility, walk};

/// Defaults used by [`ObjectUtils`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleConfig {
    /// Color of the shared outline material.
    pub outline_color: [f32; 3],
    /// Color for wireframe materials. `None` keeps each material's own color.
    pub wireframe_color: Option<[f32; 3]>,
    /// Meshes outlined per step.
    pub outline_batch_size: usize,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            outline_color: [0.1, 0.1, 0.1],
            wireframe_color: None,
            outline_batch_size: 64,
        }
    }
}

/// Facade over the style operations of this crate.
///
/// Owns the [`StyleStore`] and [`OutlineGenerator`] so callers only have to keep the scene
/// and any opacity tokens. Every subtree operation has a `*_by_id` twin that first resolves an
/// application object id; an unknown id makes it a no-op.
///
/// ```rust
/// use understory_scene::{Geometry, Material, Scene, SceneNode};
/// use understory_style::{IdFilter, ObjectUtils};
///
/// let mut scene = Scene::new();
/// let g = scene.add_geometry(Geometry::default());
/// let m = scene.add_material(Material::surface([0.5, 0.5, 0.5]));
/// let root = scene.insert(None, SceneNode::group("drawing").with_object_id(1));
/// scene.insert(Some(root), SceneNode::mesh("wall", g, m).with_object_id(2));
///
/// let mut utils = ObjectUtils::default();
/// let tokens = utils.set_opacity_by_id(&mut scene, 1, Some(0.5), IdFilter::new());
/// assert_eq!(tokens.len(), 1);
/// utils.revert_opacity(&mut scene, &tokens, IdFilter::new());
///
/// assert!(utils.set_opacity_by_id(&mut scene, 99, Some(0.5), IdFilter::new()).is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ObjectUtils {
    config: StyleConfig,
    store: StyleStore,
    outlines: OutlineGenerator,
}

impl ObjectUtils {
    /// Create a facade with the given defaults.
    pub fn new(config: StyleConfig) -> Self {
        Self {
            config,
            store: StyleStore::new().with_wireframe_color(config.wireframe_color),
            outlines: OutlineGenerator::new(config.outline_color),
        }
    }

    /// The configuration this facade was created with.
    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Pending undo records.
    pub fn store(&self) -> &StyleStore {
        &self.store
    }

    /// Mutable access to the undo records, e.g. for [`StyleStore::forget_removed`].
    pub fn store_mut(&mut self) -> &mut StyleStore {
        &mut self.store
    }

    // --- lookup ---

    /// Resolve object ids to nodes, skipping unknown ids.
    pub fn objects_by_ids(&self, scene: &Scene, ids: &[u32]) -> Vec<NodeId> {
        ids.iter()
            .filter_map(|&id| scene.find_by_object_id(id))
            .collect()
    }

    /// World-space bounds of the subtree.
    pub fn bounding_box(&self, scene: &Scene, root: NodeId, visible_only: bool) -> Option<Aabb3> {
        scene.subtree_bounds(root, visible_only)
    }

    /// See [`find`](crate::find).
    pub fn find(
        &self,
        scene: &Scene,
        root: NodeId,
        search_text: &str,
        target_ids: Option<&[u32]>,
        first_only: bool,
    ) -> Vec<NodeId> {
        walk::find(scene, root, search_text, target_ids, first_only)
    }

    /// [`ObjectUtils::find`] under the node with `object_id`.
    pub fn find_by_id(
        &self,
        scene: &Scene,
        object_id: u32,
        search_text: &str,
        target_ids: Option<&[u32]>,
        first_only: bool,
    ) -> Vec<NodeId> {
        resolve(scene, object_id)
            .map(|root| walk::find(scene, root, search_text, target_ids, first_only))
            .unwrap_or_default()
    }

    /// See [`distinct_floors`](crate::distinct_floors).
    pub fn distinct_floors(&self, scene: &Scene, object_ids: &[u32]) -> Vec<String> {
        floor::distinct_floors(scene, object_ids)
    }

    // --- opacity ---

    /// See [`set_opacity`](crate::set_opacity).
    pub fn set_opacity(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        opacity: Option<f32>,
        filter: IdFilter<'_>,
    ) -> Vec<MaterialInfo> {
        opacity::set_opacity(scene, root, opacity, filter)
    }

    /// [`ObjectUtils::set_opacity`] under the node with `object_id`.
    pub fn set_opacity_by_id(
        &mut self,
        scene: &mut Scene,
        object_id: u32,
        opacity: Option<f32>,
        filter: IdFilter<'_>,
    ) -> Vec<MaterialInfo> {
        resolve(scene, object_id)
            .map(|root| opacity::set_opacity(scene, root, opacity, filter))
            .unwrap_or_default()
    }

    /// See [`revert_opacity`](crate::revert_opacity). Also settles material swaps that were
    /// reverted underneath the fade.
    pub fn revert_opacity(
        &mut self,
        scene: &mut Scene,
        infos: &[MaterialInfo],
        filter: IdFilter<'_>,
    ) {
        opacity::revert_opacity(scene, infos, filter);
        self.store.settle(scene);
    }

    // --- undo-store backed styles ---

    /// See [`StyleStore::apply_material`].
    pub fn apply_material(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        material: MaterialId,
        filter: IdFilter<'_>,
    ) {
        self.store.apply_material(scene, root, material, filter);
    }

    /// [`ObjectUtils::apply_material`] under the node with `object_id`.
    pub fn apply_material_by_id(
        &mut self,
        scene: &mut Scene,
        object_id: u32,
        material: MaterialId,
        filter: IdFilter<'_>,
    ) {
        if let Some(root) = resolve(scene, object_id) {
            self.store.apply_material(scene, root, material, filter);
        }
    }

    /// See [`StyleStore::revert_applied_material`].
    pub fn revert_applied_material(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        filter: IdFilter<'_>,
    ) {
        self.store.revert_applied_material(scene, root, filter);
    }

    /// [`ObjectUtils::revert_applied_material`] under the node with `object_id`.
    pub fn revert_applied_material_by_id(
        &mut self,
        scene: &mut Scene,
        object_id: u32,
        filter: IdFilter<'_>,
    ) {
        if let Some(root) = resolve(scene, object_id) {
            self.store.revert_applied_material(scene, root, filter);
        }
    }

    /// See [`StyleStore::set_double_sided`].
    pub fn set_double_sided(&mut self, scene: &mut Scene, root: NodeId, filter: IdFilter<'_>) {
        self.store.set_double_sided(scene, root, filter);
    }

    /// [`ObjectUtils::set_double_sided`] under the node with `object_id`.
    pub fn set_double_sided_by_id(
        &mut self,
        scene: &mut Scene,
        object_id: u32,
        filter: IdFilter<'_>,
    ) {
        if let Some(root) = resolve(scene, object_id) {
            self.store.set_double_sided(scene, root, filter);
        }
    }

    /// See [`StyleStore::revert_double_sided`].
    pub fn revert_double_sided(&mut self, scene: &mut Scene, root: NodeId, filter: IdFilter<'_>) {
        self.store.revert_double_sided(scene, root, filter);
    }

    /// [`ObjectUtils::revert_double_sided`] under the node with `object_id`.
    pub fn revert_double_sided_by_id(
        &mut self,
        scene: &mut Scene,
        object_id: u32,
        filter: IdFilter<'_>,
    ) {
        if let Some(root) = resolve(scene, object_id) {
            self.store.revert_double_sided(scene, root, filter);
        }
    }

    /// See [`StyleStore::set_wireframe`].
    pub fn set_wireframe(&mut self, scene: &mut Scene, root: NodeId, filter: IdFilter<'_>) {
        self.store.set_wireframe(scene, root, filter);
    }

    /// [`ObjectUtils::set_wireframe`] under the node with `object_id`.
    pub fn set_wireframe_by_id(&mut self, scene: &mut Scene, object_id: u32, filter: IdFilter<'_>) {
        if let Some(root) = resolve(scene, object_id) {
            self.store.set_wireframe(scene, root, filter);
        }
    }

    /// See [`StyleStore::revert_wireframe`].
    pub fn revert_wireframe(&mut self, scene: &mut Scene, root: NodeId, filter: IdFilter<'_>) {
        self.store.revert_wireframe(scene, root, filter);
    }

    /// [`ObjectUtils::revert_wireframe`] under the node with `object_id`.
    pub fn revert_wireframe_by_id(
        &mut self,
        scene: &mut Scene,
        object_id: u32,
        filter: IdFilter<'_>,
    ) {
        if let Some(root) = resolve(scene, object_id) {
            self.store.revert_wireframe(scene, root, filter);
        }
    }

    // --- outlines ---

    /// Default outline options, with the configured batch size.
    pub fn outline_options(&self) -> OutlineOptions {
        OutlineOptions {
            batch_size: self.config.outline_batch_size,
            ..OutlineOptions::default()
        }
    }

    /// Start an incremental outline job. Drive it with [`ObjectUtils::step_outlines`].
    pub fn begin_outlines(
        &self,
        scene: &Scene,
        root: NodeId,
        options: OutlineOptions,
    ) -> OutlineTask {
        self.outlines.begin(scene, root, options)
    }

    /// Run one batch of an outline job.
    pub fn step_outlines(&mut self, scene: &mut Scene, task: &mut OutlineTask) -> OutlineProgress {
        task.step(scene, &mut self.outlines)
    }

    /// See [`OutlineGenerator::create_outlines`].
    pub fn create_outlines(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        options: OutlineOptions,
        on_progress: impl FnMut(OutlineProgress),
    ) -> Vec<NodeId> {
        self.outlines.create_outlines(scene, root, options, on_progress)
    }

    /// [`ObjectUtils::create_outlines`] under the node with `object_id`.
    pub fn create_outlines_by_id(
        &mut self,
        scene: &mut Scene,
        object_id: u32,
        options: OutlineOptions,
        on_progress: impl FnMut(OutlineProgress),
    ) -> Vec<NodeId> {
        match resolve(scene, object_id) {
            Some(root) => self.outlines.create_outlines(scene, root, options, on_progress),
            None => Vec::new(),
        }
    }

    /// See [`remove_outlines`](crate::remove_outlines).
    pub fn remove_outlines(&mut self, scene: &mut Scene, root: NodeId) -> usize {
        outline::remove_outlines(scene, root)
    }

    /// [`ObjectUtils::remove_outlines`] under the node with `object_id`.
    pub fn remove_outlines_by_id(&mut self, scene: &mut Scene, object_id: u32) -> usize {
        resolve(scene, object_id).map_or(0, |root| outline::remove_outlines(scene, root))
    }

    /// See [`has_outline`](crate::has_outline).
    pub fn has_outline(&self, scene: &Scene, node: NodeId, check_children: bool) -> bool {
        outline::has_outline(scene, node, check_children)
    }

    /// [`ObjectUtils::has_outline`] for the node with `object_id`.
    pub fn has_outline_by_id(&self, scene: &Scene, object_id: u32, check_children: bool) -> bool {
        resolve(scene, object_id)
            .is_some_and(|node| outline::has_outline(scene, node, check_children))
    }

    /// See [`set_outlines_visible`](crate::set_outlines_visible).
    pub fn set_outlines_visible(&mut self, scene: &mut Scene, root: NodeId, visible: bool) {
        outline::set_outlines_visible(scene, root, visible);
    }

    /// [`ObjectUtils::set_outlines_visible`] under the node with `object_id`.
    pub fn set_outlines_visible_by_id(&mut self, scene: &mut Scene, object_id: u32, visible: bool) {
        if let Some(root) = resolve(scene, object_id) {
            outline::set_outlines_visible(scene, root, visible);
        }
    }

    // --- floors ---

    /// See [`set_visible_for_floors`](crate::set_visible_for_floors).
    pub fn set_visible_for_floors<S: AsRef<str>>(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        floors: &[S],
        make_unmatched_invisible: bool,
    ) {
        visibility::set_visible_for_floors(
            scene,
            &mut self.store,
            root,
            floors,
            make_unmatched_invisible,
        );
    }

    /// [`ObjectUtils::set_visible_for_floors`] under the node with `object_id`.
    pub fn set_visible_for_floors_by_id<S: AsRef<str>>(
        &mut self,
        scene: &mut Scene,
        object_id: u32,
        floors: &[S],
        make_unmatched_invisible: bool,
    ) {
        if let Some(root) = resolve(scene, object_id) {
            self.set_visible_for_floors(scene, root, floors, make_unmatched_invisible);
        }
    }

    /// See [`revert_visible_for_floors`](crate::revert_visible_for_floors).
    pub fn revert_visible_for_floors(&mut self, scene: &mut Scene, root: NodeId) {
        visibility::revert_visible_for_floors(scene, &mut self.store, root);
    }

    /// [`ObjectUtils::revert_visible_for_floors`] under the node with `object_id`.
    pub fn revert_visible_for_floors_by_id(&mut self, scene: &mut Scene, object_id: u32) {
        if let Some(root) = resolve(scene, object_id) {
            visibility::revert_visible_for_floors(scene, &mut self.store, root);
        }
    }
}

fn resolve(scene: &Scene, object_id: u32) -> Option<NodeId> {
    let found = scene.find_by_object_id(object_id);
    if found.is_none() {
        tracing::trace!(object_id, "unknown object id");
    }
    found
}
