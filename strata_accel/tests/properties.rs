// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for compiled accelerators against brute-force answers.

use glam::Vec3;
use proptest::prelude::*;
use strata_accel::{
    Aabb3, Accel, AxisBox, BuildFlags, BuildOverrides, IndexHolder, LinearScan, MovingSphere,
    PointSplat, Primitive, Ray, Shutter, Sphere, Triangle, ValueHolder,
};

fn vec3(range: f32) -> impl Strategy<Value = Vec3> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn sphere() -> impl Strategy<Value = Sphere> {
    (vec3(20.0), 0.1_f32..3.0).prop_map(|(c, r)| Sphere::new(c, r))
}

fn triangle() -> impl Strategy<Value = Triangle> {
    (vec3(20.0), vec3(3.0), vec3(3.0)).prop_map(|(a, e1, e2)| Triangle::new(a, a + e1, a + e2))
}

fn ray() -> impl Strategy<Value = Ray> {
    (vec3(30.0), vec3(1.0))
        .prop_filter("direction must be non-degenerate", |(_, d)| d.length() > 0.1)
        .prop_map(|(o, d)| Ray::new(o, d))
}

fn axis_box() -> impl Strategy<Value = AxisBox> {
    (vec3(20.0), (0.1_f32..4.0, 0.1_f32..4.0, 0.1_f32..4.0))
        .prop_map(|(c, (x, y, z))| AxisBox::new(c, Vec3::new(x, y, z)))
}

fn moving_sphere() -> impl Strategy<Value = MovingSphere> {
    (vec3(20.0), vec3(4.0), 0.1_f32..2.0).prop_map(|(c, step, radius)| MovingSphere {
        center0: c,
        center1: c + step,
        time0: 0.0,
        time1: 1.0,
        radius,
    })
}

fn point_splat() -> impl Strategy<Value = PointSplat> {
    (vec3(20.0), 0.1_f32..2.0).prop_map(|(position, radius)| PointSplat { position, radius })
}

/// Ray with a finite `[t_min, t_max]` window and a sample time in `[0, 1]`.
fn bounded_ray() -> impl Strategy<Value = Ray> {
    (ray(), 0.0_f32..10.0, 0.0_f32..40.0, 0.0_f32..1.0)
        .prop_map(|(r, t_min, len, time)| r.with_interval(t_min, t_min + len).with_time(time))
}

fn overrides() -> impl Strategy<Value = BuildOverrides> {
    (1_usize..8, any::<bool>(), any::<bool>()).prop_map(|(leaf, median, parallel)| {
        BuildOverrides {
            max_leaf_size: leaf,
            median_split: median,
            parallel_threshold: 16,
            flags: if parallel {
                BuildFlags::PARALLEL
            } else {
                BuildFlags::empty()
            },
            ..BuildOverrides::default()
        }
    })
}

fn brute_nearest<P: Primitive>(prims: &[P], ray: &Ray) -> Option<f32> {
    prims
        .iter()
        .filter_map(|p| p.intersect(ray))
        .map(|h| h.t)
        .reduce(f32::min)
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-3 * a.abs().max(1.0)
}

/// Compile `prims` and compare every ray's nearest hit and occlusion against brute force.
fn agrees_with_brute_force<P: Primitive>(
    prims: &[P],
    rays: &[Ray],
    o: &BuildOverrides,
) -> Result<(), TestCaseError> {
    let mut accel: Accel<IndexHolder<'_, P>> = Accel::new();
    accel.compile(IndexHolder::new(prims), o);
    for r in rays {
        let expected = brute_nearest(prims, r);
        let got = accel.did_hit_object(r);
        match (expected, got) {
            (None, None) => {}
            (Some(t), Some(hit)) => {
                prop_assert!(close(t, hit.t), "expected {t}, got {}", hit.t);
                prop_assert!(r.accepts(hit.t), "{} outside [{}, {}]", hit.t, r.t_min, r.t_max);
            }
            (e, g) => prop_assert!(false, "brute force {e:?} vs accel {g:?}"),
        }
        prop_assert_eq!(got.is_some(), accel.does_occlude(r));
    }
    Ok(())
}

proptest! {
    #[test]
    fn nearest_hit_matches_brute_force(
        spheres in prop::collection::vec(sphere(), 1..200),
        rays in prop::collection::vec(ray(), 1..16),
        o in overrides(),
    ) {
        let mut accel: Accel<IndexHolder<'_, Sphere>> = Accel::new();
        accel.compile(IndexHolder::new(&spheres), &o);
        for r in &rays {
            let expected = brute_nearest(&spheres, r);
            let got = accel.did_hit_object(r);
            match (expected, got) {
                (None, None) => {}
                (Some(t), Some(hit)) => {
                    prop_assert!(close(t, hit.t), "expected {t}, got {}", hit.t);
                    prop_assert!(spheres[hit.primitive].intersect(r).is_some());
                }
                (e, g) => prop_assert!(false, "brute force {e:?} vs accel {g:?}"),
            }
            prop_assert_eq!(expected.is_some(), accel.does_occlude(r));
        }
    }

    #[test]
    fn boxes_match_brute_force(
        boxes in prop::collection::vec(axis_box(), 1..150),
        rays in prop::collection::vec(bounded_ray(), 1..16),
        o in overrides(),
    ) {
        agrees_with_brute_force(&boxes, &rays, &o)?;
    }

    #[test]
    fn rays_starting_inside_boxes_exit_through_the_nearest_face(
        boxes in prop::collection::vec(axis_box(), 1..100),
        starts in prop::collection::vec(
            (any::<prop::sample::Index>(), vec3(1.0), 0.0_f32..30.0),
            1..16,
        ),
        o in overrides(),
    ) {
        let rays: Vec<Ray> = starts
            .iter()
            .filter(|(_, d, _)| d.length() > 0.1)
            .map(|(i, d, len)| {
                let b = boxes[i.index(boxes.len())].bounds;
                Ray::new(b.centroid(), *d).with_interval(0.0, *len)
            })
            .collect();
        agrees_with_brute_force(&boxes, &rays, &o)?;
    }

    #[test]
    fn spheres_match_brute_force_on_bounded_rays(
        spheres in prop::collection::vec(sphere(), 1..150),
        rays in prop::collection::vec(bounded_ray(), 1..16),
        o in overrides(),
    ) {
        agrees_with_brute_force(&spheres, &rays, &o)?;
    }

    #[test]
    fn moving_spheres_match_brute_force_at_the_ray_time(
        spheres in prop::collection::vec(moving_sphere(), 1..150),
        rays in prop::collection::vec(bounded_ray(), 1..16),
        o in overrides(),
        motion in any::<bool>(),
    ) {
        let o = if motion {
            BuildOverrides {
                flags: o.flags | BuildFlags::MOTION_BLUR,
                shutter: Shutter::new(0.0, 1.0),
                ..o
            }
        } else {
            o
        };
        agrees_with_brute_force(&spheres, &rays, &o)?;
    }

    #[test]
    fn splats_match_brute_force(
        splats in prop::collection::vec(point_splat(), 1..150),
        rays in prop::collection::vec(bounded_ray(), 1..16),
        o in overrides(),
    ) {
        agrees_with_brute_force(&splats, &rays, &o)?;
    }

    #[test]
    fn triangles_match_brute_force_on_bounded_rays(
        tris in prop::collection::vec(triangle(), 1..150),
        rays in prop::collection::vec(bounded_ray(), 1..16),
        o in overrides(),
    ) {
        agrees_with_brute_force(&tris, &rays, &o)?;
    }

    #[test]
    fn triangles_match_linear_scan(
        tris in prop::collection::vec(triangle(), 1..150),
        rays in prop::collection::vec(ray(), 1..16),
        o in overrides(),
    ) {
        let mut bvh: Accel<IndexHolder<'_, Triangle>> = Accel::new();
        bvh.compile(IndexHolder::new(&tris), &o);
        let mut scan: Accel<IndexHolder<'_, Triangle>, LinearScan> = Accel::new();
        scan.compile(IndexHolder::new(&tris), &o);
        for r in &rays {
            let a = bvh.did_hit_object(r).map(|h| h.t);
            let b = scan.did_hit_object(r).map(|h| h.t);
            match (a, b) {
                (None, None) => {}
                (Some(x), Some(y)) => prop_assert!(close(x, y), "{x} vs {y}"),
                other => prop_assert!(false, "mismatch {other:?}"),
            }
        }
    }

    #[test]
    fn queries_are_idempotent(
        spheres in prop::collection::vec(sphere(), 0..100),
        r in ray(),
    ) {
        let mut accel: Accel<ValueHolder<Sphere>> = Accel::new();
        accel.compile(ValueHolder::new(spheres), &BuildOverrides::default());
        let first = accel.did_hit_object(&r);
        let occluded = accel.does_occlude(&r);
        for _ in 0..3 {
            prop_assert_eq!(accel.did_hit_object(&r), first);
            prop_assert_eq!(accel.does_occlude(&r), occluded);
        }
    }

    #[test]
    fn boundary_boxes_contain_their_primitives(
        tris in prop::collection::vec(triangle(), 1..50),
        clip_min in vec3(20.0),
        clip_size in vec3(10.0),
    ) {
        let mut accel: Accel<IndexHolder<'_, Triangle>> = Accel::new();
        accel.compile(IndexHolder::new(&tris), &BuildOverrides::default());
        let clip = Aabb3::from_points(clip_min, clip_min + clip_size.abs());
        for (i, t) in tris.iter().enumerate() {
            let b = accel.object_boundary_box(i);
            for p in t.positions {
                prop_assert!(b.contains_point(p));
            }
            prop_assert!(accel.object_boundary_box_motion(i).union().contains_aabb(&b));
            if let Some(c) = accel.object_boundary_box_clipped(i, &clip) {
                let slack = Aabb3::new(b.min - Vec3::splat(1e-3), b.max + Vec3::splat(1e-3));
                prop_assert!(slack.contains_aabb(&c));
            }
        }
    }

    #[test]
    fn empty_compile_never_hits(r in ray()) {
        let mut accel: Accel<ValueHolder<Sphere>> = Accel::new();
        accel.compile(ValueHolder::default(), &BuildOverrides::default());
        prop_assert!(accel.did_hit_object(&r).is_none());
        prop_assert!(!accel.does_occlude(&r));
    }

    #[test]
    fn at_or_below_leaf_threshold_is_one_leaf(
        leaf in 1_usize..16,
        spheres in prop::collection::vec(sphere(), 1..16),
    ) {
        prop_assume!(spheres.len() <= leaf);
        let mut accel: Accel<IndexHolder<'_, Sphere>> = Accel::new();
        accel.compile(IndexHolder::new(&spheres), &BuildOverrides::with_max_leaf_size(leaf));
        let s = accel.stats();
        prop_assert!(s.is_single_leaf());
        prop_assert_eq!(s.interior_nodes, 0);
        prop_assert_eq!(s.object_refs, spheres.len());
    }

    #[test]
    fn parallel_and_serial_builds_group_objects_identically(
        spheres in prop::collection::vec(sphere(), 1..300),
    ) {
        let build = |flags| {
            let mut accel: Accel<IndexHolder<'_, Sphere>> = Accel::new();
            accel.compile(
                IndexHolder::new(&spheres),
                &BuildOverrides {
                    parallel_threshold: 8,
                    flags,
                    ..BuildOverrides::default()
                },
            );
            let mut sets = accel.structure().tree().leaf_sets();
            sets.sort();
            sets
        };
        prop_assert_eq!(build(BuildFlags::PARALLEL), build(BuildFlags::empty()));
    }
}
