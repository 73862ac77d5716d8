// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear scan: tests every object. Useful as a baseline and for tiny batches.

use crate::config::BuildConfig;
use crate::holder::ObjectHolder;
use crate::stats::TreeStats;
use crate::structure::{Capabilities, Structure};
use crate::types::{Aabb3, Ray, RayHit};

/// Structure that tests every object on every query.
///
/// Only nearest-hit and occlusion are implemented; alpha and lazy queries fall
/// back to the trait's "no hit" defaults. Objects with non-finite bounds are
/// left out, as in [`Bvh`](crate::Bvh).
#[derive(Clone, Debug, Default)]
pub struct LinearScan {
    objects: Vec<u32>,
    bounds: Aabb3,
}

impl Structure for LinearScan {
    fn capabilities(&self) -> Capabilities {
        Capabilities::NEAREST | Capabilities::OCCLUSION
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Holder indices are u32, as in the flat tree."
    )]
    fn build<H: ObjectHolder>(&mut self, holder: &H, _config: &BuildConfig) {
        self.objects.clear();
        self.bounds = Aabb3::EMPTY;
        for i in 0..holder.size() {
            let b = holder.object_bounds(i);
            if b.is_finite() {
                self.objects.push(i as u32);
                self.bounds = self.bounds.union(b);
            }
        }
        let skipped = holder.size() - self.objects.len();
        if skipped > 0 {
            log::warn!("{skipped} objects with non-finite bounds left out of the scan");
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn bounds(&self) -> Aabb3 {
        self.bounds
    }

    fn did_hit_object<H: ObjectHolder>(&self, holder: &H, ray: &Ray) -> Option<RayHit> {
        let mut ray = *ray;
        let mut best = None;
        for &i in &self.objects {
            if let Some(hit) = holder.did_hit_object(i as usize, &ray) {
                ray.t_max = hit.t;
                best = Some(hit);
            }
        }
        best
    }

    fn does_occlude<H: ObjectHolder>(&self, holder: &H, ray: &Ray) -> bool {
        self.objects
            .iter()
            .any(|&i| holder.does_occlude(i as usize, ray))
    }

    fn stats(&self) -> TreeStats {
        TreeStats {
            node_count: 1,
            leaf_count: 1,
            max_leaf_size: self.objects.len(),
            empty_leaves: usize::from(self.objects.is_empty()),
            object_refs: self.objects.len(),
            ..TreeStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::ValueHolder;
    use crate::primitive::Sphere;
    use crate::texture::ConstantOpacity;
    use glam::Vec3;

    #[test]
    fn scans_for_the_nearest() {
        let h = ValueHolder::new(vec![
            Sphere::new(Vec3::new(0.0, 0.0, 8.0), 1.0),
            Sphere::new(Vec3::new(0.0, 0.0, 3.0), 1.0),
        ]);
        let mut s = LinearScan::default();
        s.build(&h, &BuildConfig::default());
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let hit = s.did_hit_object(&h, &ray).unwrap();
        assert_eq!(hit.primitive, 1);
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!(s.does_occlude(&h, &ray));
        assert!(s.stats().is_single_leaf());
    }

    #[test]
    fn non_finite_objects_are_left_out_like_the_bvh() {
        let h = ValueHolder::new(vec![
            Sphere::new(Vec3::Z * 3.0, f32::INFINITY),
            Sphere::new(Vec3::new(0.0, 0.0, 6.0), 1.0),
        ]);
        let mut s = LinearScan::default();
        s.build(&h, &BuildConfig::default());
        let mut bvh = crate::Bvh::default();
        bvh.build(&h, &BuildConfig::default());
        assert_eq!(s.stats().object_refs, 1);
        assert!(s.bounds().is_finite());

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let hit = s.did_hit_object(&h, &ray).unwrap();
        assert_eq!(hit.primitive, 1);
        assert_eq!(Some(hit), bvh.did_hit_object(&h, &ray));
        assert!(s.does_occlude(&h, &ray));
        assert!(!s.does_occlude(&h, &Ray::new(Vec3::ZERO, Vec3::NEG_Z)));
    }

    #[test]
    fn unsupported_queries_report_no_hit() {
        let h = ValueHolder::new(vec![Sphere::new(Vec3::Z * 3.0, 1.0)]);
        let mut s = LinearScan::default();
        s.build(&h, &BuildConfig::default());
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(!s.capabilities().contains(Capabilities::ALPHA));
        assert!(s.did_hit_object_alpha(&h, &ray, &ConstantOpacity(1.0)).is_none());
        assert!(!s.does_occlude_alpha(&h, &ray, &ConstantOpacity(1.0)));
        assert!(s.hit_object_lazy(&h, &ray, 1).is_none());
    }
}
