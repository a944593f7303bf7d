// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, flags, content, and metadata.

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;

use glam::Affine3A;
use smallvec::SmallVec;

use crate::geometry::GeometryId;
use crate::material::MaterialId;

/// Identifier for a node in the scene (generational).
///
/// A removed node's identifier never becomes live again: reusing its slot bumps the
/// generation, so holders of old identifiers can detect that the node is gone.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility and decoration tagging.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (it and its subtree are drawn).
        const VISIBLE = 0b0000_0001;
        /// Node is a generated outline decoration of its parent mesh.
        const OUTLINE = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// The material slot of a drawable node.
///
/// Most CAD entities carry a single material; meshes with geometry groups carry one material
/// per group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MaterialSlot {
    /// No material assigned.
    #[default]
    None,
    /// A single material for the whole node.
    Single(MaterialId),
    /// One material per geometry group.
    Multi(SmallVec<[MaterialId; 4]>),
}

impl MaterialSlot {
    /// The materials in this slot, in group order.
    pub fn ids(&self) -> &[MaterialId] {
        match self {
            Self::None => &[],
            Self::Single(id) => core::slice::from_ref(id),
            Self::Multi(ids) => ids,
        }
    }

    /// Mutable access to the materials in this slot.
    pub fn ids_mut(&mut self) -> &mut [MaterialId] {
        match self {
            Self::None => &mut [],
            Self::Single(id) => core::slice::from_mut(id),
            Self::Multi(ids) => ids,
        }
    }

    /// Returns `true` if no material is assigned.
    pub fn is_none(&self) -> bool {
        self.ids().is_empty()
    }
}

/// What a node draws.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NodeContent {
    /// A pure container (group, layer, block reference).
    #[default]
    Empty,
    /// A triangle mesh.
    Mesh {
        /// Triangle geometry.
        geometry: GeometryId,
        /// Surface materials.
        material: MaterialSlot,
    },
    /// Line segments (polylines, hatches and outline decorations).
    LineSegments {
        /// Segment geometry, two positions per segment.
        geometry: GeometryId,
        /// Line materials.
        material: MaterialSlot,
    },
}

impl NodeContent {
    /// The geometry drawn by this content, if any.
    pub fn geometry(&self) -> Option<GeometryId> {
        match self {
            Self::Empty => None,
            Self::Mesh { geometry, .. } | Self::LineSegments { geometry, .. } => Some(*geometry),
        }
    }

    /// The material slot, if this content draws anything.
    pub fn material(&self) -> Option<&MaterialSlot> {
        match self {
            Self::Empty => None,
            Self::Mesh { material, .. } | Self::LineSegments { material, .. } => Some(material),
        }
    }

    /// Mutable material slot, if this content draws anything.
    pub fn material_mut(&mut self) -> Option<&mut MaterialSlot> {
        match self {
            Self::Empty => None,
            Self::Mesh { material, .. } | Self::LineSegments { material, .. } => Some(material),
        }
    }
}

/// Classification of a node, computed from its content and flags.
///
/// Every traversal and style operation goes through [`NodeKind::of`] rather than probing
/// node fields directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Container without drawable content.
    Group,
    /// Triangle mesh.
    Mesh,
    /// Line segments that are part of the drawing.
    Lines,
    /// Line segments generated as an outline decoration.
    Outline,
}

impl NodeKind {
    /// Classify a node.
    pub fn of(node: &SceneNode) -> Self {
        match node.content {
            NodeContent::Empty => Self::Group,
            NodeContent::Mesh { .. } => Self::Mesh,
            NodeContent::LineSegments { .. } if node.flags.contains(NodeFlags::OUTLINE) => {
                Self::Outline
            }
            NodeContent::LineSegments { .. } => Self::Lines,
        }
    }

    /// Whether style operations (opacity, material swaps) apply to this kind.
    ///
    /// Outline decorations are excluded; they are managed by the outline generator.
    pub fn is_drawable(self) -> bool {
        matches!(self, Self::Mesh | Self::Lines)
    }
}

/// A value in a node's metadata map.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Nested map. Not a scalar; ignored by text search.
    Map(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    /// Returns `true` for scalar values.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Map(_))
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Per-node data.
#[derive(Clone, Debug)]
pub struct SceneNode {
    /// Application object id (for example a DXF entity handle). Not every node has one.
    pub object_id: Option<u32>,
    /// Display name. Floor tokens are parsed from this.
    pub name: String,
    /// Transform relative to the parent.
    pub local_transform: Affine3A,
    /// Visibility and decoration flags.
    pub flags: NodeFlags,
    /// What the node draws.
    pub content: NodeContent,
    /// Free-form metadata carried over from the drawing.
    pub user_data: BTreeMap<String, MetaValue>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            object_id: None,
            name: String::new(),
            local_transform: Affine3A::IDENTITY,
            flags: NodeFlags::default(),
            content: NodeContent::Empty,
            user_data: BTreeMap::new(),
        }
    }
}

impl SceneNode {
    /// A named container node.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A named mesh node with a single material.
    pub fn mesh(name: impl Into<String>, geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            content: NodeContent::Mesh {
                geometry,
                material: MaterialSlot::Single(material),
            },
            ..Self::default()
        }
    }

    /// A named line-segments node with a single material.
    pub fn lines(name: impl Into<String>, geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            content: NodeContent::LineSegments {
                geometry,
                material: MaterialSlot::Single(material),
            },
            ..Self::default()
        }
    }

    /// Set the application object id.
    pub fn with_object_id(mut self, id: u32) -> Self {
        self.object_id = Some(id);
        self
    }

    /// Add a metadata entry.
    pub fn with_user_data(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.user_data.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if the node's own visible flag is set.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Classify this node.
    pub fn kind(&self) -> NodeKind {
        NodeKind::of(self)
    }
}
