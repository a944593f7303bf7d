// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outline decorations for meshes.
//!
//! An outline is a line-segment child of a mesh, tagged with [`NodeFlags::OUTLINE`], that
//! draws the mesh's boundary and crease edges. The mesh itself is left untouched, so outlines
//! can be added and removed without interfering with any material state.
//!
//! Generation runs as an [`OutlineTask`] that processes a bounded batch of meshes per
//! [`OutlineTask::step`]. Hosts with a frame loop call `step` once per frame; hosts without
//! one call [`OutlineGenerator::create_outlines`].

use alloc::vec::Vec;
use core::fmt;

use glam::Vec3;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use understory_scene::{
    Geometry, GeometryError, GeometryId, Material, MaterialId, NodeFlags, NodeId, NodeKind,
    Scene, SceneNode,
};

/// Options for [`OutlineGenerator::begin`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlineOptions {
    /// Skip invisible nodes and their subtrees.
    pub visible_only: bool,
    /// Skip meshes that have mesh children.
    pub leaf_meshes_only: bool,
    /// Material for the outlines. Defaults to the generator's shared outline material.
    pub material: Option<MaterialId>,
    /// Edges between faces whose normals differ by more than this many degrees are drawn.
    pub threshold_angle: f32,
    /// Meshes processed per [`OutlineTask::step`].
    pub batch_size: usize,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            visible_only: false,
            leaf_meshes_only: false,
            material: None,
            threshold_angle: 1.0,
            batch_size: 64,
        }
    }
}

/// Why a mesh could not be outlined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutlineError {
    /// The mesh's geometry is not a valid triangle list.
    Geometry(GeometryError),
    /// The mesh refers to geometry that is not in the scene.
    MissingGeometry(GeometryId),
}

impl fmt::Display for OutlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry(e) => write!(f, "malformed mesh geometry: {e}"),
            Self::MissingGeometry(id) => write!(f, "geometry {id:?} is not in the scene"),
        }
    }
}

impl core::error::Error for OutlineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Geometry(e) => Some(e),
            Self::MissingGeometry(_) => None,
        }
    }
}

impl From<GeometryError> for OutlineError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

/// Progress reported after each [`OutlineTask::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutlineProgress {
    /// Candidate meshes handled so far.
    pub processed: usize,
    /// Candidate meshes in the task.
    pub total: usize,
    /// Outline nodes created so far.
    pub created: usize,
}

/// Creates outline decorations and caches their geometry.
///
/// Outline geometry is derived once per source [`GeometryId`] and threshold angle, so meshes
/// instancing the same geometry share one outline buffer.
#[derive(Clone, Debug)]
pub struct OutlineGenerator {
    color: [f32; 3],
    material: Option<MaterialId>,
    /// (source geometry, threshold bits) → outline geometry
    cache: HashMap<(GeometryId, u32), GeometryId>,
}

impl Default for OutlineGenerator {
    fn default() -> Self {
        Self::new([0.0, 0.0, 0.0])
    }
}

impl OutlineGenerator {
    /// Create a generator whose default outline material has `color`.
    pub fn new(color: [f32; 3]) -> Self {
        Self {
            color,
            material: None,
            cache: HashMap::new(),
        }
    }

    /// Snapshot the meshes under `root` that need outlines.
    ///
    /// Meshes added to the scene afterwards are not picked up by the returned task.
    pub fn begin(&self, scene: &Scene, root: NodeId, options: OutlineOptions) -> OutlineTask {
        let mut candidates = Vec::new();
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = scene.get(id) else {
                continue;
            };
            if options.visible_only && !node.is_visible() {
                continue;
            }
            let children = scene.children_of(id);
            if node.kind() == NodeKind::Mesh
                && !(options.leaf_meshes_only
                    && children
                        .iter()
                        .any(|&c| scene.kind(c) == Some(NodeKind::Mesh)))
            {
                candidates.push(id);
            }
            stack.extend(children.iter().rev());
        }
        tracing::debug!(candidates = candidates.len(), "outline task");
        OutlineTask {
            candidates,
            cursor: 0,
            created: Vec::new(),
            options,
        }
    }

    /// Outline every candidate mesh under `root` in one go.
    ///
    /// `on_progress` is called after each batch. Returns the outline nodes created.
    pub fn create_outlines(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        options: OutlineOptions,
        mut on_progress: impl FnMut(OutlineProgress),
    ) -> Vec<NodeId> {
        let mut task = self.begin(scene, root, options);
        while !task.is_finished() {
            on_progress(task.step(scene, self));
        }
        task.into_created()
    }

    /// Add an unnamed outline child to one mesh. Returns `Ok(None)` when the mesh already has
    /// one or has no edges worth drawing.
    pub fn outline_mesh(
        &mut self,
        scene: &mut Scene,
        mesh: NodeId,
        options: &OutlineOptions,
    ) -> Result<Option<NodeId>, OutlineError> {
        let Some(node) = scene.get(mesh) else {
            return Ok(None);
        };
        let Some(source) = node.content.geometry().filter(|_| node.kind() == NodeKind::Mesh)
        else {
            return Ok(None);
        };
        if has_outline(scene, mesh, false) {
            return Ok(None);
        }
        let geometry = self.outline_geometry(scene, source, options.threshold_angle)?;
        if scene.geometry(geometry).is_some_and(|g| g.positions.is_empty()) {
            return Ok(None);
        }
        let material = match options.material {
            Some(m) => m,
            None => self.default_material(scene),
        };
        // Unnamed, so search and floor matching never see it as drawing content.
        let mut outline = SceneNode::lines("", geometry, material);
        outline.flags.insert(NodeFlags::OUTLINE);
        Ok(Some(scene.insert(Some(mesh), outline)))
    }

    fn outline_geometry(
        &mut self,
        scene: &mut Scene,
        source: GeometryId,
        threshold_angle: f32,
    ) -> Result<GeometryId, OutlineError> {
        let key = (source, threshold_angle.to_bits());
        if let Some(&cached) = self.cache.get(&key)
            && scene.geometry(cached).is_some()
        {
            return Ok(cached);
        }
        let geometry = scene
            .geometry(source)
            .ok_or(OutlineError::MissingGeometry(source))?;
        let segments = feature_edges(geometry, threshold_angle)?;
        let id = scene.add_geometry(Geometry::new(segments));
        self.cache.insert(key, id);
        Ok(id)
    }

    fn default_material(&mut self, scene: &mut Scene) -> MaterialId {
        if let Some(id) = self.material
            && scene.material(id).is_some()
        {
            return id;
        }
        let id = scene.add_material(Material::line(self.color).with_name("outline"));
        self.material = Some(id);
        id
    }
}

/// A cooperative outline generation job. See [`OutlineGenerator::begin`].
///
/// Drop the task to cancel it; outlines created so far stay in the scene.
#[derive(Clone, Debug)]
pub struct OutlineTask {
    candidates: Vec<NodeId>,
    cursor: usize,
    created: Vec<NodeId>,
    options: OutlineOptions,
}

impl OutlineTask {
    /// Process the next batch of meshes.
    pub fn step(&mut self, scene: &mut Scene, generator: &mut OutlineGenerator) -> OutlineProgress {
        let end = (self.cursor + self.options.batch_size.max(1)).min(self.candidates.len());
        for &mesh in &self.candidates[self.cursor..end] {
            match generator.outline_mesh(scene, mesh, &self.options) {
                Ok(Some(outline)) => self.created.push(outline),
                Ok(None) => {}
                Err(error) => tracing::warn!(?mesh, %error, "skipping mesh outline"),
            }
        }
        self.cursor = end;
        self.progress()
    }

    /// Returns `true` once every candidate has been processed.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.candidates.len()
    }

    /// Current progress.
    pub fn progress(&self) -> OutlineProgress {
        OutlineProgress {
            processed: self.cursor,
            total: self.candidates.len(),
            created: self.created.len(),
        }
    }

    /// Outline nodes created so far.
    pub fn created(&self) -> &[NodeId] {
        &self.created
    }

    /// Consume the task, returning the outline nodes it created.
    pub fn into_created(self) -> Vec<NodeId> {
        self.created
    }
}

/// Returns `true` if `node` has an outline child, or with `check_children`, if any node in
/// its subtree has one.
pub fn has_outline(scene: &Scene, node: NodeId, check_children: bool) -> bool {
    let is_outline = |id: NodeId| scene.kind(id) == Some(NodeKind::Outline);
    if check_children {
        scene.descendants(node).skip(1).any(is_outline)
    } else {
        scene.children_of(node).iter().copied().any(is_outline)
    }
}

/// Remove every outline decoration in the subtree. Returns how many were removed.
///
/// Cached outline geometry is kept, so outlining the same meshes again is cheap.
pub fn remove_outlines(scene: &mut Scene, root: NodeId) -> usize {
    let outlines: Vec<NodeId> = scene
        .descendants(root)
        .filter(|&id| scene.kind(id) == Some(NodeKind::Outline))
        .collect();
    for &id in &outlines {
        scene.remove(id);
    }
    tracing::debug!(removed = outlines.len(), "remove_outlines");
    outlines.len()
}

/// Show or hide the outline decorations in the subtree, leaving other nodes alone.
pub fn set_outlines_visible(scene: &mut Scene, root: NodeId, visible: bool) {
    let outlines: Vec<NodeId> = scene
        .descendants(root)
        .filter(|&id| scene.kind(id) == Some(NodeKind::Outline))
        .collect();
    for id in outlines {
        scene.set_visible(id, visible);
    }
}

type Quantized = [i64; 3];

/// Positions closer than this are welded.
const WELD_SCALE: f32 = 10_000.0;

#[allow(clippy::cast_possible_truncation, reason = "welding grid, range loss is acceptable")]
fn quantize(p: Vec3) -> Quantized {
    let q = (p * WELD_SCALE).round();
    [q.x as i64, q.y as i64, q.z as i64]
}

struct EdgeFaces {
    start: Vec3,
    end: Vec3,
    first: Vec3,
    second: Option<Vec3>,
    shared: u32,
}

/// Boundary and crease edges of a triangle mesh, as a flat list of segment endpoints.
///
/// Vertices are welded on a fine grid so split vertices (per-face normals, UV seams) do not
/// turn every edge into a boundary. Orientation of the face normals is ignored.
pub(crate) fn feature_edges(
    geometry: &Geometry,
    threshold_degrees: f32,
) -> Result<Vec<Vec3>, GeometryError> {
    let threshold = threshold_degrees.to_radians();
    let mut edges: HashMap<(Quantized, Quantized), EdgeFaces> = HashMap::new();
    for [a, b, c] in geometry.triangles()? {
        let Some(normal) = (b - a).cross(c - a).try_normalize() else {
            continue;
        };
        for (p, q) in [(a, b), (b, c), (c, a)] {
            let (qp, qq) = (quantize(p), quantize(q));
            if qp == qq {
                continue;
            }
            let key = if qp < qq { (qp, qq) } else { (qq, qp) };
            match edges.entry(key) {
                Entry::Occupied(mut e) => {
                    let e = e.get_mut();
                    e.shared += 1;
                    e.second.get_or_insert(normal);
                }
                Entry::Vacant(v) => {
                    v.insert(EdgeFaces {
                        start: p,
                        end: q,
                        first: normal,
                        second: None,
                        shared: 1,
                    });
                }
            }
        }
    }
    let mut out = Vec::new();
    for e in edges.values() {
        let keep = match e.second {
            None => true,
            // Non-manifold edges are always drawn.
            Some(_) if e.shared > 2 => true,
            Some(second) => {
                let second = if e.first.dot(second) < 0.0 {
                    -second
                } else {
                    second
                };
                e.first.angle_between(second) > threshold
            }
        };
        if keep {
            out.push(e.start);
            out.push(e.end);
        }
    }
    Ok(out)
}
