// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strata Accel: ray-query acceleration structures for a renderer.
//!
//! An [`Accel`] pairs an [`ObjectHolder`] (where the primitives live) with a
//! [`Structure`] (how they are organized) and answers:
//!
//! - nearest hit ([`Accel::did_hit_object`]) and occlusion ([`Accel::does_occlude`]);
//! - alpha-tested variants that see through cut-out texels of an [`OpacityTexture`];
//! - progressive selection for interactive picking ([`Accel::get_hit_object_lazy`]);
//! - per-object bounds, including shutter-window and clipped variants.
//!
//! Holders come in five flavours: borrowed references ([`RefHolder`]), owned values
//! ([`ValueHolder`]), a zero-copy slice view ([`IndexHolder`]), and two compact
//! triangle holders over a shared [`TriangleMesh`] ([`CompactHolder`], [`BakedHolder`]).
//! Structures are generic over the holder, so per-candidate tests are
//! monomorphized into the traversal loop.
//!
//! The default structure is a [`Bvh`] built with a binned surface area
//! heuristic. Above [`BuildConfig::parallel_threshold`] objects, the top levels
//! of the build fan out across the rayon pool; each worker builds its subtrees
//! in a private arena with a private partitioner, and finished subtrees are
//! spliced into one contiguous node array through blocks reserved from shared
//! counters.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use strata_accel::{Accel, AxisBox, BuildOverrides, Ray, ValueHolder};
//!
//! let boxes = vec![
//!     AxisBox::new(Vec3::ZERO, Vec3::ONE),
//!     AxisBox::new(Vec3::new(10.0, 0.0, 0.0), Vec3::ONE),
//! ];
//! let mut accel: Accel<ValueHolder<AxisBox>> = Accel::new();
//! accel.compile(ValueHolder::new(boxes), &BuildOverrides::default());
//!
//! let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
//! let hit = accel.did_hit_object(&ray).unwrap();
//! assert_eq!(hit.primitive, 0);
//! assert!((hit.t - 4.5).abs() < 1e-5);
//! ```
//!
//! ## Choosing a holder
//!
//! - [`RefHolder`]: the primitives already live elsewhere and outlive the accelerator.
//! - [`ValueHolder`]: the accelerator should own them.
//! - [`IndexHolder`]: a slice is at hand and nothing per object needs storing.
//! - [`CompactHolder`] / [`BakedHolder`]: large triangle meshes; four bytes per
//!   triangle (eight with back-references) instead of a full triangle record.
//!
//! ### Float semantics
//!
//! Objects with non-finite bounds are left out of the build with a warning.
//! Queries never panic on misses; "no hit", "not occluded", and "unsupported"
//! all come back as `None` or `false`. Use [`Accel::capabilities`] to tell
//! them apart.

pub mod accel;
pub mod build;
pub mod config;
pub mod holder;
pub mod mesh;
pub mod primitive;
pub mod stats;
pub mod structure;
pub mod structures;
pub mod texture;
pub mod types;

pub use accel::Accel;
pub use build::{BuildContext, MedianPartitioner, Partitioner, SahPartitioner};
pub use config::{BuildConfig, BuildFlags, BuildOverrides, SplitMethod};
pub use holder::{BakedHolder, CompactHolder, IndexHolder, ObjectHolder, RefHolder, ValueHolder};
pub use mesh::TriangleMesh;
pub use primitive::{AxisBox, MovingSphere, PointSplat, Primitive, Sphere, Triangle};
pub use stats::TreeStats;
pub use structure::{Capabilities, Structure};
pub use structures::{Bvh, LinearScan};
pub use texture::{AlphaMask, ConstantOpacity, OpacityTexture};
pub use types::{Aabb3, Axis, MotionBounds, Ray, RayHit, Selection, Shutter, SurfaceHit};

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn mesh_holders_and_primitive_holders_agree() {
        let mesh = TriangleMesh::plane_grid(8, 8.0);
        let triangles: Vec<Triangle> = (0..mesh.triangle_count() as u32)
            .map(|t| mesh.triangle(t))
            .collect();

        let mut compact: Accel<CompactHolder<'_>> = Accel::new();
        compact.compile(CompactHolder::new(&mesh), &BuildOverrides::default());
        let mut values: Accel<ValueHolder<Triangle>> = Accel::new();
        values.compile(ValueHolder::new(triangles), &BuildOverrides::default());

        for i in 0..20 {
            let f = i as f32 * 0.37;
            let ray = Ray::new(Vec3::new(f % 8.0, (f * 1.3) % 8.0, 3.0), Vec3::NEG_Z);
            let a = compact.did_hit_object(&ray).map(|h| (h.primitive, h.t));
            let b = values.did_hit_object(&ray).map(|h| h.t);
            assert_eq!(a.map(|x| x.1), b);
            assert_eq!(compact.does_occlude(&ray), values.does_occlude(&ray));
        }
    }

    #[test]
    fn empty_compile_never_hits() {
        let mut accel: Accel<ValueHolder<Sphere>> = Accel::new();
        accel.compile(ValueHolder::default(), &BuildOverrides::default());
        assert!(accel.is_compiled());
        for d in [Vec3::X, Vec3::Y, Vec3::NEG_Z] {
            let ray = Ray::new(Vec3::ZERO, d);
            assert!(accel.did_hit_object(&ray).is_none());
            assert!(!accel.does_occlude(&ray));
        }
        assert!(accel.stats().is_single_leaf());
    }
}
