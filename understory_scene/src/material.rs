// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Materials: the style state the scene draws with.

use alloc::string::String;

/// Identifier for a material in the scene's material arena.
///
/// Material slots are never reused, so an identifier of a removed material stays dead.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MaterialId(pub(crate) u32);

/// Which faces of a surface are rendered.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Side {
    /// Front faces only.
    #[default]
    Front,
    /// Back faces only.
    Back,
    /// Both faces; back-face culling disabled.
    Double,
}

bitflags::bitflags! {
    /// Material rendering flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u8 {
        /// Alpha blending enabled; `opacity` is honored.
        const TRANSPARENT = 0b0000_0001;
        /// Surfaces render as triangle edges.
        const WIREFRAME   = 0b0000_0010;
        /// Line material (for line segments rather than surfaces).
        const LINE        = 0b0000_0100;
    }
}

/// A material.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Debug name.
    pub name: String,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Opacity in `0.0..=1.0`. Only honored when [`MaterialFlags::TRANSPARENT`] is set.
    pub opacity: f32,
    /// Face culling mode.
    pub side: Side,
    /// Rendering flags.
    pub flags: MaterialFlags,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            side: Side::Front,
            flags: MaterialFlags::empty(),
        }
    }
}

impl Material {
    /// An opaque surface material.
    pub fn surface(color: [f32; 3]) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// A line material.
    pub fn line(color: [f32; 3]) -> Self {
        Self {
            color,
            flags: MaterialFlags::LINE,
            ..Self::default()
        }
    }

    /// Set the debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the face culling mode.
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Enable blending with the given opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.flags |= MaterialFlags::TRANSPARENT;
        self
    }

    /// Returns `true` if blending is enabled.
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(MaterialFlags::TRANSPARENT)
    }

    /// Enable or disable blending.
    pub fn set_transparent(&mut self, transparent: bool) {
        self.flags.set(MaterialFlags::TRANSPARENT, transparent);
    }

    /// Returns `true` if this material renders triangle edges.
    pub fn is_wireframe(&self) -> bool {
        self.flags.contains(MaterialFlags::WIREFRAME)
    }
}
