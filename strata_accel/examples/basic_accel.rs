// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Strata Accel: compile a holder, then query it.

use glam::Vec3;
use strata_accel::{Accel, AxisBox, BuildOverrides, Ray, ValueHolder};

fn main() {
    let boxes = vec![
        AxisBox::new(Vec3::ZERO, Vec3::ONE),
        AxisBox::new(Vec3::new(10.0, 0.0, 0.0), Vec3::ONE),
    ];
    let mut accel: Accel<ValueHolder<AxisBox>> = Accel::new();
    accel.compile(ValueHolder::new(boxes), &BuildOverrides::default());

    let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
    match accel.did_hit_object(&ray) {
        Some(hit) => println!("hit box {} at t={} (normal {:?})", hit.primitive, hit.t, hit.normal),
        None => println!("miss"),
    }

    // Past the first box the ray still finds the second.
    let later = ray.with_interval(6.0, f32::INFINITY);
    println!("occluded after t=6: {}", accel.does_occlude(&later));
    println!("stats: {:?}", accel.stats());
}
