// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object holders: interchangeable backing stores for the primitives a tree references.
//!
//! - [`RefHolder`]: borrowed references to primitives owned elsewhere.
//! - [`ValueHolder`]: owned primitive values.
//! - [`IndexHolder`]: zero-copy view of a primitive slice; stores nothing per object.
//! - [`CompactHolder`]: one `u32` triangle index per object plus a shared [`TriangleMesh`](crate::TriangleMesh).
//! - [`BakedHolder`]: like [`CompactHolder`], with a parallel array of back-references
//!   to the higher-level objects the triangles were baked from.
//!
//! Structures are generic over the holder, so the per-candidate tests in the
//! traversal loop are monomorphized and free of dynamic dispatch.

mod mesh;
mod primitives;

pub use mesh::{BakedHolder, CompactHolder};
pub use primitives::{IndexHolder, RefHolder, ValueHolder};

use crate::texture::OpacityTexture;
use crate::types::{Aabb3, MotionBounds, Ray, RayHit, Selection, Shutter};

/// Transparent layers an alpha-tested query skips through per primitive.
pub const MAX_ALPHA_LAYERS: usize = 8;

/// Relative step past a transparent hit before testing again.
const ALPHA_STEP: f32 = 1e-4;

/// Uniform contract over all primitive stores.
///
/// Indices passed to the per-object methods must be below [`ObjectHolder::size`].
pub trait ObjectHolder: Sync {
    /// Number of primary objects.
    fn size(&self) -> usize;

    /// Number of secondary elements (back-references); zero for holders without them.
    fn extra_size(&self) -> usize {
        0
    }

    /// Bounds of object `index`, from whichever collaborator owns its geometry.
    fn object_bounds(&self, index: usize) -> Aabb3;

    /// Bounds of object `index` over a shutter window.
    fn object_motion_bounds(&self, index: usize, _shutter: Shutter) -> MotionBounds {
        MotionBounds::Static(self.object_bounds(index))
    }

    /// Bounds of the part of object `index` inside `clip`.
    fn object_clipped_bounds(&self, index: usize, clip: &Aabb3) -> Option<Aabb3>;

    /// Nearest hit of `ray` with object `index`.
    fn did_hit_object(&self, index: usize, ray: &Ray) -> Option<RayHit>;

    /// Whether `ray` hits object `index`. May stop before computing surface data.
    fn does_occlude(&self, index: usize, ray: &Ray) -> bool;

    /// Nearest hit of `ray` with object `index` whose opacity in `texture` is at least
    /// [`ALPHA_CUTOFF`](crate::texture::ALPHA_CUTOFF). Transparent hits are skipped.
    fn did_hit_object_alpha<X: OpacityTexture + ?Sized>(
        &self,
        index: usize,
        ray: &Ray,
        texture: &X,
    ) -> Option<RayHit> {
        let mut rest = *ray;
        for _ in 0..MAX_ALPHA_LAYERS {
            let hit = self.did_hit_object(index, &rest)?;
            if !texture.is_transparent(hit.uv) {
                return Some(hit);
            }
            let next = hit.t + ALPHA_STEP * hit.t.abs().max(1.0);
            rest = rest.with_interval(next, rest.t_max);
        }
        None
    }

    /// Alpha-tested occlusion.
    fn does_occlude_alpha<X: OpacityTexture + ?Sized>(
        &self,
        index: usize,
        ray: &Ray,
        texture: &X,
    ) -> bool {
        self.did_hit_object_alpha(index, ray, texture).is_some()
    }

    /// Progressive selection: level `0` tests the object's box only, higher levels
    /// run the exact test.
    fn did_hit_object_lazy(&self, index: usize, ray: &Ray, sub_level: u32) -> Option<Selection> {
        if sub_level == 0 {
            let (t, _) = ray.intersect_aabb(&self.object_bounds(index))?;
            Some(Selection {
                primitive: index,
                t,
                level: 0,
                exact: false,
            })
        } else {
            let hit = self.did_hit_object(index, ray)?;
            Some(Selection {
                primitive: index,
                t: hit.t,
                level: sub_level,
                exact: true,
            })
        }
    }

    /// Release owned storage. The holder reports size `0` afterwards.
    fn clear(&mut self);

    /// Bytes owned directly by the holder; `0` where that needs a walk of the contents.
    fn memory_usage(&self) -> usize {
        0
    }
}
