// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared triangle geometry referenced by the compact object holders.

use glam::{Vec2, Vec3};

use crate::primitive::{Triangle, clip_triangle_bounds, intersect_triangle, triangle_hit};
use crate::types::{Aabb3, Ray, SurfaceHit};

/// Indexed triangle mesh: vertex buffers plus index triples.
///
/// Compact holders keep only triangle indices into a mesh and rebuild full
/// triangles on demand, so the mesh must outlive (and stay unmodified for) any
/// structure compiled over it. The borrow checker enforces this for holders
/// that borrow it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Per-vertex texture coordinates. May be empty.
    pub uvs: Vec<Vec2>,
    /// Vertex index triples, one per triangle.
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create a mesh without texture coordinates.
    pub fn new(positions: Vec<Vec3>, indices: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            uvs: Vec::new(),
            indices,
        }
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Vertex positions of triangle `tri`.
    #[inline]
    pub fn positions_of(&self, tri: u32) -> [Vec3; 3] {
        let [a, b, c] = self.indices[tri as usize];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Texture coordinates of triangle `tri`; the defaults of [`Triangle::new`] without UVs.
    pub fn uvs_of(&self, tri: u32) -> [Vec2; 3] {
        if self.uvs.is_empty() {
            return [Vec2::ZERO, Vec2::X, Vec2::Y];
        }
        let [a, b, c] = self.indices[tri as usize];
        [
            self.uvs[a as usize],
            self.uvs[b as usize],
            self.uvs[c as usize],
        ]
    }

    /// Reconstruct the full triangle `tri`.
    pub fn triangle(&self, tri: u32) -> Triangle {
        Triangle::with_uvs(self.positions_of(tri), self.uvs_of(tri))
    }

    /// Bounds of triangle `tri`.
    pub fn triangle_bounds(&self, tri: u32) -> Aabb3 {
        Aabb3::from_iter_points(self.positions_of(tri))
    }

    /// Bounds of triangle `tri` clipped to `clip`.
    pub fn triangle_clipped_bounds(&self, tri: u32, clip: &Aabb3) -> Option<Aabb3> {
        clip_triangle_bounds(&self.positions_of(tri), clip)
    }

    /// Nearest hit of `ray` with triangle `tri`.
    pub fn intersect(&self, tri: u32, ray: &Ray) -> Option<SurfaceHit> {
        triangle_hit(&self.positions_of(tri), &self.uvs_of(tri), ray)
    }

    /// Whether `ray` hits triangle `tri` without computing surface data.
    pub fn occludes(&self, tri: u32, ray: &Ray) -> bool {
        intersect_triangle(&self.positions_of(tri), ray).is_some()
    }

    /// Bytes held by the vertex and index buffers.
    pub fn memory_usage(&self) -> usize {
        size_of_val(self.positions.as_slice())
            + size_of_val(self.uvs.as_slice())
            + size_of_val(self.indices.as_slice())
    }

    /// A `n`×`n` grid of quads in the `z = 0` plane spanning `[0, size]²`, two triangles per quad.
    pub fn plane_grid(n: u32, size: f32) -> Self {
        let n = n.max(1);
        let step = size / n as f32;
        let mut positions = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
        let mut uvs = Vec::with_capacity(positions.capacity());
        for y in 0..=n {
            for x in 0..=n {
                positions.push(Vec3::new(x as f32 * step, y as f32 * step, 0.0));
                uvs.push(Vec2::new(x as f32 / n as f32, y as f32 / n as f32));
            }
        }
        let mut indices = Vec::with_capacity((2 * n * n) as usize);
        let row = n + 1;
        for y in 0..n {
            for x in 0..n {
                let i = y * row + x;
                indices.push([i, i + 1, i + row]);
                indices.push([i + 1, i + row + 1, i + row]);
            }
        }
        Self {
            positions,
            uvs,
            indices,
        }
    }
}
