// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_style --heading-base-level=0

//! Understory Style: revertible visual states over an Understory scene.
//!
//! CAD viewers constantly restyle parts of a drawing: fade everything except a selection,
//! show a storey on its own, switch a block to wireframe, outline the walls. Each of these is
//! transient and must be undone exactly, even when several are stacked on the same nodes or
//! on materials that many nodes share. This crate is the bookkeeping for that.
//!
//! Every operation takes a subtree root and, where it makes sense, an [`IdFilter`] that scopes
//! it by application object id.
//!
//! ## Styles and their undo
//!
//! - [`set_opacity`] returns [`MaterialInfo`] tokens that the caller hands back to
//!   [`revert_opacity`]. Shared materials are copied before they are faded.
//! - [`StyleStore`] keeps undo records for material substitution, wireframe, double-sided
//!   rendering and floor visibility, keyed by node and [`UndoKind`]. The first change of a
//!   kind is the one remembered, so a single revert always returns to the original.
//!
//! ## Outlines
//!
//! [`OutlineGenerator`] derives the boundary and crease edges of each mesh and attaches them
//! as a line-segment child tagged as an outline. Work is split into an [`OutlineTask`] that
//! processes a batch of meshes per [`OutlineTask::step`], so large drawings can be outlined
//! across frames. Meshes sharing geometry share the derived outline geometry.
//!
//! ## Search and floors
//!
//! - [`find`] searches names, object ids and metadata, optionally pruned to a set of objects.
//! - [`floor_tokens`] and [`match_floor`] read storey labels like `5F` or `B1F` out of names.
//!   Matching is by whole token, so `1F` never matches `21F(Lobby)`.
//! - [`set_visible_for_floors`] shows one or more storeys, with
//!   [`revert_visible_for_floors`] to undo.
//!
//! [`ObjectUtils`] bundles all of the above behind one value that owns the undo store and
//! outline generator, and adds `*_by_id` variants that start from an object id.
//!
//! ## Example
//!
//! ```rust
//! use understory_scene::{Geometry, Material, Scene, SceneNode};
//! use understory_style::{IdFilter, revert_opacity, set_opacity};
//!
//! let mut scene = Scene::new();
//! let g = scene.add_geometry(Geometry::default());
//! let shared = scene.add_material(Material::surface([0.7, 0.7, 0.7]));
//! let root = scene.insert(None, SceneNode::group("plan"));
//! let a = scene.insert(Some(root), SceneNode::mesh("a", g, shared).with_object_id(10));
//! let b = scene.insert(Some(root), SceneNode::mesh("b", g, shared).with_object_id(20));
//!
//! // Fade everything except object 20.
//! let tokens = set_opacity(&mut scene, root, Some(0.2), IdFilter::new().exclude(&[20]));
//! assert_eq!(tokens.len(), 1);
//!
//! revert_opacity(&mut scene, &tokens, IdFilter::new());
//! # let _ = (a, b);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod filter;
mod floor;
mod opacity;
mod outline;
mod store;
mod util;
mod utils;
mod visibility;
mod walk;

pub use filter::{IdFilter, included};
pub use floor::{distinct_floors, floor_tokens, match_floor, match_floors};
pub use opacity::{MaterialInfo, revert_opacity, set_opacity};
pub use outline::{
    OutlineError, OutlineGenerator, OutlineOptions, OutlineProgress, OutlineTask, has_outline,
    remove_outlines, set_outlines_visible,
};
pub use store::{StyleStore, UndoKind};
pub use utils::{ObjectUtils, StyleConfig};
pub use visibility::{revert_visible_for_floors, set_visible_for_floors, traverse_by_floors};
pub use walk::{find, find_first};
