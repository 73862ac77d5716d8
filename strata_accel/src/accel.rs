// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public [`Accel`] API: a holder paired with a structure built over it.

use core::fmt::Debug;

use crate::config::{BuildConfig, BuildFlags, BuildOverrides};
use crate::holder::{ObjectHolder, RefHolder};
use crate::primitive::Primitive;
use crate::stats::TreeStats;
use crate::structure::{Capabilities, Structure};
use crate::structures::Bvh;
use crate::texture::OpacityTexture;
use crate::types::{Aabb3, MotionBounds, Ray, RayHit, Selection, Shutter};

/// An acceleration structure: one [`ObjectHolder`] plus a [`Structure`] built over it.
///
/// The accelerator is either empty or compiled. Compiling builds a fresh
/// structure and swaps it in once complete, so a half-built tree is never
/// observable. Queries take `&self` and may run from any number of threads;
/// compiling and clearing take `&mut self`.
pub struct Accel<H: ObjectHolder, S: Structure = Bvh> {
    holder: H,
    structure: S,
    config: BuildConfig,
    compiled: bool,
}

impl<H: ObjectHolder + Default, S: Structure> Default for Accel<H, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ObjectHolder + Debug, S: Structure> Debug for Accel<H, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Accel")
            .field("holder", &self.holder)
            .field("structure", &self.structure)
            .field("compiled", &self.compiled)
            .finish_non_exhaustive()
    }
}

impl<H: ObjectHolder + Default, S: Structure> Accel<H, S> {
    /// Create an empty accelerator with an empty holder.
    pub fn new() -> Self {
        Self::with_holder(H::default())
    }
}

impl<H: ObjectHolder, S: Structure> Accel<H, S> {
    /// Create an empty accelerator around `holder`. Call
    /// [`compile_from_internal_objects`](Self::compile_from_internal_objects) to build.
    pub fn with_holder(holder: H) -> Self {
        Self {
            holder,
            structure: S::default(),
            config: BuildConfig::default(),
            compiled: false,
        }
    }

    /// Replace the holder and build over its objects.
    pub fn compile(&mut self, holder: H, overrides: &BuildOverrides) {
        self.holder = holder;
        self.compile_from_internal_objects(overrides);
    }

    /// Build over the objects already in the holder.
    pub fn compile_from_internal_objects(&mut self, overrides: &BuildOverrides) {
        let config = BuildConfig::derive(self.holder.size(), overrides);
        let mut fresh = S::default();
        fresh.build(&self.holder, &config);
        log::debug!(
            "compiled {} objects ({} extra) into {:?}",
            self.holder.size(),
            self.holder.extra_size(),
            fresh.stats()
        );
        self.structure = fresh;
        self.config = config;
        self.compiled = true;
    }

    /// Release the holder's storage and the structure. The accelerator is empty afterwards.
    pub fn clear(&mut self) {
        self.holder.clear();
        self.structure.clear();
        self.config = BuildConfig::default();
        self.compiled = false;
    }

    /// Whether a compile has completed since construction or the last clear.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// The holder.
    pub fn holder(&self) -> &H {
        &self.holder
    }

    /// Mutable access to the holder.
    ///
    /// Changing the holder invalidates the structure, so the accelerator drops
    /// back to empty; recompile with
    /// [`compile_from_internal_objects`](Self::compile_from_internal_objects).
    pub fn holder_mut(&mut self) -> &mut H {
        if self.compiled {
            self.structure.clear();
            self.compiled = false;
        }
        &mut self.holder
    }

    /// The structure.
    pub fn structure(&self) -> &S {
        &self.structure
    }

    /// Configuration of the last compile.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Queries the structure answers for real.
    pub fn capabilities(&self) -> Capabilities {
        self.structure.capabilities()
    }

    /// Nearest hit along `ray`.
    pub fn did_hit_object(&self, ray: &Ray) -> Option<RayHit> {
        if !self.compiled {
            return None;
        }
        self.structure.did_hit_object(&self.holder, ray)
    }

    /// Whether anything blocks `ray`.
    pub fn does_occlude(&self, ray: &Ray) -> bool {
        self.compiled && self.structure.does_occlude(&self.holder, ray)
    }

    /// Nearest hit along `ray`, passing through texels of `texture` below the alpha cutoff.
    ///
    /// Returns `None` if the structure has no alpha support; see [`Accel::capabilities`].
    pub fn did_hit_object_alpha<X: OpacityTexture + ?Sized>(
        &self,
        ray: &Ray,
        texture: &X,
    ) -> Option<RayHit> {
        if !self.compiled {
            return None;
        }
        self.structure
            .did_hit_object_alpha(&self.holder, ray, texture)
    }

    /// Alpha-tested occlusion. `false` if the structure has no alpha support.
    pub fn does_occlude_alpha<X: OpacityTexture + ?Sized>(&self, ray: &Ray, texture: &X) -> bool {
        self.compiled
            && self
                .structure
                .does_occlude_alpha(&self.holder, ray, texture)
    }

    /// Progressive selection for picking.
    ///
    /// `sub_level` `0` tests object boxes only; higher levels run exact tests.
    /// Returns `None` if the structure has no lazy support.
    pub fn get_hit_object_lazy(&self, ray: &Ray, sub_level: u32) -> Option<Selection> {
        if !self.compiled {
            return None;
        }
        self.structure.hit_object_lazy(&self.holder, ray, sub_level)
    }

    /// Bounds of object `index`.
    pub fn object_boundary_box(&self, index: usize) -> Aabb3 {
        self.holder.object_bounds(index)
    }

    /// Bounds of object `index` over the compiled shutter window.
    ///
    /// Moving primitives report one box per shutter bound; everything else reports one box.
    pub fn object_boundary_box_motion(&self, index: usize) -> MotionBounds {
        self.object_boundary_box_over(index, self.config.shutter)
    }

    /// Bounds of object `index` over an explicit shutter window.
    pub fn object_boundary_box_over(&self, index: usize, shutter: Shutter) -> MotionBounds {
        self.holder.object_motion_bounds(index, shutter)
    }

    /// Bounds of the part of object `index` inside `clip`, or `None` if none of it is.
    pub fn object_boundary_box_clipped(&self, index: usize, clip: &Aabb3) -> Option<Aabb3> {
        self.holder.object_clipped_bounds(index, clip)
    }

    /// Bounds of everything compiled.
    pub fn bounds(&self) -> Aabb3 {
        self.structure.bounds()
    }

    /// Number of objects in the holder.
    pub fn size(&self) -> usize {
        self.holder.size()
    }

    /// Number of secondary elements in the holder.
    pub fn extra_size(&self) -> usize {
        self.holder.extra_size()
    }

    /// Bytes owned by the holder and the structure, where they can be reported cheaply.
    pub fn memory_usage(&self) -> usize {
        self.holder.memory_usage() + self.structure.memory_usage()
    }

    /// Shape summary of the compiled structure.
    pub fn stats(&self) -> TreeStats {
        self.structure.stats()
    }
}

impl<'a, P: Primitive, S: Structure> Accel<RefHolder<'a, P>, S> {
    /// Build over borrowed primitives.
    pub fn compile_from_pointers(&mut self, objects: &[&'a P], overrides: &BuildOverrides) {
        self.compile(RefHolder::new(objects.to_vec()), overrides);
    }

    /// Build over borrowed primitives, bounding each over the `shutter` window.
    pub fn compile_from_pointers_with_motion(
        &mut self,
        objects: &[&'a P],
        shutter: Shutter,
        overrides: &BuildOverrides,
    ) {
        let overrides = BuildOverrides {
            shutter,
            flags: overrides.flags | BuildFlags::MOTION_BLUR,
            ..*overrides
        };
        self.compile_from_pointers(objects, &overrides);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::{BakedHolder, IndexHolder, ValueHolder};
    use crate::mesh::TriangleMesh;
    use crate::primitive::{AxisBox, MovingSphere, Sphere, Triangle};
    use crate::structures::LinearScan;
    use crate::texture::ConstantOpacity;
    use glam::Vec3;

    #[test]
    fn lifecycle_empty_compiled_empty() {
        let spheres = [Sphere::new(Vec3::ZERO, 1.0)];
        let mut acc: Accel<IndexHolder<'_, Sphere>> = Accel::new();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(!acc.is_compiled());
        assert!(acc.did_hit_object(&ray).is_none());

        acc.compile(IndexHolder::new(&spheres), &BuildOverrides::default());
        assert!(acc.is_compiled());
        assert!(acc.does_occlude(&ray));

        acc.clear();
        assert!(!acc.is_compiled());
        assert_eq!(acc.size(), 0);
        assert!(!acc.does_occlude(&ray));
    }

    #[test]
    fn two_unit_boxes() {
        let boxes = vec![
            AxisBox::new(Vec3::ZERO, Vec3::ONE),
            AxisBox::new(Vec3::new(10.0, 0.0, 0.0), Vec3::ONE),
        ];
        let mut acc: Accel<ValueHolder<AxisBox>> = Accel::new();
        acc.compile(ValueHolder::new(boxes), &BuildOverrides::default());
        let hit = acc
            .did_hit_object(&Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X))
            .unwrap();
        assert_eq!(hit.primitive, 0);
        assert!((hit.t - 4.5).abs() < 1e-5);
    }

    #[test]
    fn compile_from_pointers_and_motion() {
        let m = MovingSphere {
            center0: Vec3::ZERO,
            center1: Vec3::X * 4.0,
            time0: 0.0,
            time1: 1.0,
            radius: 0.5,
        };
        let mut acc: Accel<RefHolder<'_, MovingSphere>> = Accel::new();
        acc.compile_from_pointers_with_motion(
            &[&m],
            Shutter::new(0.25, 0.75),
            &BuildOverrides::default(),
        );
        assert!(acc.config().motion_blur());
        assert!(acc.config().flags.contains(BuildFlags::PARALLEL));
        match acc.object_boundary_box_motion(0) {
            MotionBounds::Sampled { open, close } => {
                assert!((open.centroid().x - 1.0).abs() < 1e-5);
                assert!((close.centroid().x - 3.0).abs() < 1e-5);
            }
            MotionBounds::Static(_) => panic!("moving sphere should report two boxes"),
        }

        let s = Sphere::new(Vec3::ZERO, 1.0);
        let mut plain: Accel<RefHolder<'_, Sphere>> = Accel::new();
        plain.compile_from_pointers(&[&s], &BuildOverrides::default());
        assert!(matches!(
            plain.object_boundary_box_motion(0),
            MotionBounds::Static(_)
        ));
        assert_eq!(plain.size(), 1);
    }

    #[test]
    fn clipped_boxes_use_the_owning_geometry() {
        let mesh = TriangleMesh::new(
            vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0)],
            vec![[0, 1, 2]],
        );
        let mut acc: Accel<BakedHolder<'_>> = Accel::new();
        acc.compile(BakedHolder::with_owner(&mesh, 3), &BuildOverrides::default());
        let clip = Aabb3::new(Vec3::new(1.0, -1.0, -1.0), Vec3::new(5.0, 5.0, 1.0));
        let c = acc.object_boundary_box_clipped(0, &clip).unwrap();
        assert!(acc.object_boundary_box(0).contains_aabb(&c));
        assert!((c.min.x - 1.0).abs() < 1e-5);
        assert!((c.max.x - 4.0).abs() < 1e-5);
        assert!((c.max.y - 3.0).abs() < 1e-5);
        assert_eq!(acc.extra_size(), 1);
        let far = Aabb3::new(Vec3::splat(10.0), Vec3::splat(11.0));
        assert!(acc.object_boundary_box_clipped(0, &far).is_none());

        let tri = Triangle::new(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0));
        let tris = [tri];
        let mut by_value: Accel<IndexHolder<'_, Triangle>> = Accel::new();
        by_value.compile(IndexHolder::new(&tris), &BuildOverrides::default());
        assert_eq!(by_value.object_boundary_box_clipped(0, &clip), Some(c));
    }

    #[test]
    fn linear_scan_reports_missing_capabilities() {
        let spheres = vec![Sphere::new(Vec3::Z * 3.0, 1.0)];
        let mut acc: Accel<ValueHolder<Sphere>, LinearScan> = Accel::new();
        acc.compile(ValueHolder::new(spheres), &BuildOverrides::default());
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(acc.did_hit_object(&ray).is_some());
        assert!(acc.did_hit_object_alpha(&ray, &ConstantOpacity(1.0)).is_none());
        assert!(acc.get_hit_object_lazy(&ray, 0).is_none());
        assert!(!acc.capabilities().contains(Capabilities::LAZY));
    }

    #[test]
    fn holder_mut_drops_back_to_empty() {
        let mut acc: Accel<ValueHolder<Sphere>> = Accel::new();
        acc.compile(
            ValueHolder::new(vec![Sphere::new(Vec3::Z * 3.0, 1.0)]),
            &BuildOverrides::default(),
        );
        acc.holder_mut().push(Sphere::new(Vec3::Z * 1.5, 0.25));
        assert!(!acc.is_compiled());
        acc.compile_from_internal_objects(&BuildOverrides::default());
        let hit = acc.did_hit_object(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_eq!(hit.primitive, 1);
        assert!(acc.memory_usage() > 0);
        assert_eq!(acc.stats().object_refs, 2);
    }
}
