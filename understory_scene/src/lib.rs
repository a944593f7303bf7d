// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scene --heading-base-level=0

//! Understory Scene: a generational 3D scene graph for CAD and drawing viewers.
//!
//! Understory Scene models the part of a renderer's scene that style and visibility tools
//! operate on, and nothing more:
//!
//! - A hierarchy of nodes, each with an optional application object id, a name, a local
//!   transform, flags, drawable content, and a free-form metadata map.
//! - A material arena. Materials are shared by reference, so mutating one affects every node
//!   that uses it. Cloning a material before mutating it is the caller's decision.
//! - A geometry arena. Meshes that instance the same block share one geometry buffer.
//!
//! It does not draw anything. A renderer is expected to mirror this scene into GPU resources.
//!
//! ## API overview
//!
//! - [`Scene`]: container managing nodes, materials and geometry.
//! - [`SceneNode`]: per-node data. See [`SceneNode::flags`] for visibility and outline tagging.
//! - [`NodeKind`]: the one classification of a node (group, mesh, lines, outline) every
//!   consumer should use instead of probing fields.
//! - [`NodeId`]: generational handle of a node. Removed nodes never come back to life.
//! - [`Material`] / [`MaterialId`], [`Geometry`] / [`GeometryId`].
//!
//! Key operations:
//! - [`Scene::insert`] → [`NodeId`], [`Scene::remove`] (whole subtree).
//! - [`Scene::find_by_object_id`] resolves an application id.
//! - [`Scene::descendants`] iterates a subtree in depth-first pre-order.
//! - [`Scene::clone_material`] / [`Scene::remove_material`] for copy-on-write styling.
//! - [`Scene::subtree_bounds`] computes world-space bounds of drawable content.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod geometry;
mod material;
mod scene;
mod types;

pub use geometry::{Aabb3, Geometry, GeometryError, GeometryId};
pub use material::{Material, MaterialFlags, MaterialId, Side};
pub use scene::{Descendants, Scene};
pub use types::{MaterialSlot, MetaValue, NodeContent, NodeFlags, NodeId, NodeKind, SceneNode};
