// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry buffers and bounds.

use alloc::vec::Vec;
use core::fmt;

use glam::{Affine3A, Vec3};

/// Identifier for a geometry buffer in the scene's geometry arena.
///
/// Several nodes may reference the same geometry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct GeometryId(pub(crate) u32);

/// Vertex data for meshes and line segments.
///
/// For meshes, positions are read as a triangle list, through `indices` when present.
/// For line segments, positions are read pairwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Optional index buffer.
    pub indices: Option<Vec<u32>>,
}

/// Errors produced when reading geometry as a triangle list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryError {
    /// The index (or vertex) count is not a multiple of three.
    NotTriangleList(usize),
    /// An index refers past the end of the position buffer.
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of positions available.
        len: usize,
    },
    /// The geometry holds no triangles.
    Empty,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotTriangleList(n) => write!(f, "{n} vertices do not form a triangle list"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} positions")
            }
            Self::Empty => f.write_str("geometry has no triangles"),
        }
    }
}

impl core::error::Error for GeometryError {}

impl Geometry {
    /// Non-indexed geometry.
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            indices: None,
        }
    }

    /// Indexed geometry.
    pub fn indexed(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices: Some(indices),
        }
    }

    /// Read this geometry as a list of triangles, validating indices up front.
    pub fn triangles(&self) -> Result<Vec<[Vec3; 3]>, GeometryError> {
        let tris = match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(GeometryError::NotTriangleList(indices.len()));
                }
                let len = self.positions.len();
                let mut out = Vec::with_capacity(indices.len() / 3);
                for tri in indices.chunks_exact(3) {
                    let mut corners = [Vec3::ZERO; 3];
                    for (corner, &index) in corners.iter_mut().zip(tri) {
                        *corner = *self
                            .positions
                            .get(index as usize)
                            .ok_or(GeometryError::IndexOutOfRange { index, len })?;
                    }
                    out.push(corners);
                }
                out
            }
            None => {
                if self.positions.len() % 3 != 0 {
                    return Err(GeometryError::NotTriangleList(self.positions.len()));
                }
                self.positions
                    .chunks_exact(3)
                    .map(|t| [t[0], t[1], t[2]])
                    .collect()
            }
        };
        if tris.is_empty() {
            return Err(GeometryError::Empty);
        }
        Ok(tris)
    }

    /// Local-space bounds of all positions, or `None` when empty.
    pub fn bounds(&self) -> Option<Aabb3> {
        let mut it = self.positions.iter().copied();
        let first = it.next()?;
        Some(it.fold(Aabb3::new(first, first), |acc, p| acc.including(p)))
    }
}

/// Axis-aligned 3D bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb3 {
    /// Create a box from two corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The smallest box containing `self` and `p`.
    #[must_use]
    pub fn including(self, p: Vec3) -> Self {
        Self::new(self.min.min(p), self.max.max(p))
    }

    /// The smallest box containing both boxes.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Transform by an affine map and return a conservative axis-aligned box.
    #[must_use]
    pub fn transformed(self, affine: Affine3A) -> Self {
        let mut out: Option<Self> = None;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = affine.transform_point3(corner);
            out = Some(match out {
                Some(b) => b.including(p),
                None => Self::new(p, p),
            });
        }
        out.unwrap_or(self)
    }
}
