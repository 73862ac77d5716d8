// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact holders that store triangle indices and borrow the shared [`TriangleMesh`].

use core::fmt::Debug;

use crate::holder::ObjectHolder;
use crate::mesh::TriangleMesh;
use crate::types::{Aabb3, Ray, RayHit};

static EMPTY_MESH: TriangleMesh = TriangleMesh {
    positions: Vec::new(),
    uvs: Vec::new(),
    indices: Vec::new(),
};

/// One `u32` triangle index per object; geometry is rebuilt from the shared mesh.
pub struct CompactHolder<'g> {
    mesh: &'g TriangleMesh,
    triangles: Vec<u32>,
}

impl Default for CompactHolder<'_> {
    fn default() -> Self {
        Self {
            mesh: &EMPTY_MESH,
            triangles: Vec::new(),
        }
    }
}

impl Debug for CompactHolder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompactHolder")
            .field("triangles", &self.triangles.len())
            .field("mesh_triangles", &self.mesh.triangle_count())
            .finish()
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Triangle indices are u32 throughout the mesh format."
)]
fn all_triangles(mesh: &TriangleMesh) -> Vec<u32> {
    (0..mesh.triangle_count() as u32).collect()
}

impl<'g> CompactHolder<'g> {
    /// Hold every triangle of `mesh`.
    pub fn new(mesh: &'g TriangleMesh) -> Self {
        Self {
            mesh,
            triangles: all_triangles(mesh),
        }
    }

    /// Hold the given subset of `mesh`'s triangles.
    pub fn with_triangles(mesh: &'g TriangleMesh, triangles: Vec<u32>) -> Self {
        debug_assert!(
            triangles
                .iter()
                .all(|&t| (t as usize) < mesh.triangle_count()),
            "triangle index out of range for the shared mesh"
        );
        Self { mesh, triangles }
    }

    /// The shared mesh.
    pub fn mesh(&self) -> &'g TriangleMesh {
        self.mesh
    }

    /// Mesh triangle index of object `index`.
    pub fn triangle(&self, index: usize) -> u32 {
        self.triangles[index]
    }
}

impl ObjectHolder for CompactHolder<'_> {
    fn size(&self) -> usize {
        self.triangles.len()
    }

    fn object_bounds(&self, index: usize) -> Aabb3 {
        self.mesh.triangle_bounds(self.triangles[index])
    }

    fn object_clipped_bounds(&self, index: usize, clip: &Aabb3) -> Option<Aabb3> {
        self.mesh
            .triangle_clipped_bounds(self.triangles[index], clip)
    }

    fn did_hit_object(&self, index: usize, ray: &Ray) -> Option<RayHit> {
        let surface = self.mesh.intersect(self.triangles[index], ray)?;
        Some(RayHit::from_surface(ray, index, surface))
    }

    fn does_occlude(&self, index: usize, ray: &Ray) -> bool {
        self.mesh.occludes(self.triangles[index], ray)
    }

    fn clear(&mut self) {
        self.triangles = Vec::new();
    }

    fn memory_usage(&self) -> usize {
        size_of_val(self.triangles.as_slice())
    }
}

/// Compact triangle records plus a back-reference per triangle to the
/// higher-level object (instance, baked group) it came from.
///
/// Hit records carry the back-reference in [`RayHit::extra`].
pub struct BakedHolder<'g> {
    mesh: &'g TriangleMesh,
    triangles: Vec<u32>,
    owners: Vec<u32>,
}

impl Default for BakedHolder<'_> {
    fn default() -> Self {
        Self {
            mesh: &EMPTY_MESH,
            triangles: Vec::new(),
            owners: Vec::new(),
        }
    }
}

impl Debug for BakedHolder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BakedHolder")
            .field("triangles", &self.triangles.len())
            .field("owners", &self.owners.len())
            .field("mesh_triangles", &self.mesh.triangle_count())
            .finish()
    }
}

impl<'g> BakedHolder<'g> {
    /// Hold `triangles` of `mesh`, with `owners[i]` the back-reference of `triangles[i]`.
    pub fn new(mesh: &'g TriangleMesh, triangles: Vec<u32>, owners: Vec<u32>) -> Self {
        debug_assert_eq!(
            triangles.len(),
            owners.len(),
            "every baked triangle needs exactly one back-reference"
        );
        Self {
            mesh,
            triangles,
            owners,
        }
    }

    /// Hold every triangle of `mesh`, all owned by `owner`.
    pub fn with_owner(mesh: &'g TriangleMesh, owner: u32) -> Self {
        let triangles = all_triangles(mesh);
        let owners = vec![owner; triangles.len()];
        Self {
            mesh,
            triangles,
            owners,
        }
    }

    /// Append a triangle with its back-reference.
    pub fn push(&mut self, triangle: u32, owner: u32) {
        self.triangles.push(triangle);
        self.owners.push(owner);
    }

    /// Back-reference of object `index`.
    pub fn owner(&self, index: usize) -> Option<u32> {
        self.owners.get(index).copied()
    }
}

impl ObjectHolder for BakedHolder<'_> {
    fn size(&self) -> usize {
        self.triangles.len()
    }

    fn extra_size(&self) -> usize {
        self.owners.len()
    }

    fn object_bounds(&self, index: usize) -> Aabb3 {
        self.mesh.triangle_bounds(self.triangles[index])
    }

    fn object_clipped_bounds(&self, index: usize, clip: &Aabb3) -> Option<Aabb3> {
        self.mesh
            .triangle_clipped_bounds(self.triangles[index], clip)
    }

    fn did_hit_object(&self, index: usize, ray: &Ray) -> Option<RayHit> {
        let surface = self.mesh.intersect(self.triangles[index], ray)?;
        let hit = RayHit::from_surface(ray, index, surface);
        Some(match self.owner(index) {
            Some(owner) => hit.with_extra(owner as usize),
            None => hit,
        })
    }

    fn does_occlude(&self, index: usize, ray: &Ray) -> bool {
        self.mesh.occludes(self.triangles[index], ray)
    }

    fn clear(&mut self) {
        self.triangles = Vec::new();
        self.owners = Vec::new();
    }

    fn memory_usage(&self) -> usize {
        size_of_val(self.triangles.as_slice()) + size_of_val(self.owners.as_slice())
    }
}
