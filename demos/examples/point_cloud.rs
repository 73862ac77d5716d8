// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point cloud.
//!
//! Scatter coloured point samples over a surface, bucket them in a
//! [`PointGrid`] for colour lookups, and pick individual splats with a
//! progressively refined accelerator query.
//!
//! Run:
//! - `RUST_LOG=info cargo run -p strata_demos --example point_cloud`

use glam::Vec3;
use strata_accel::{Accel, BuildOverrides, PointSplat, Ray, ValueHolder};
use strata_pointgrid::{PointGrid, PointSample};

fn main() {
    env_logger::init();

    // A wavy surface sampled on a jittered lattice, coloured by height.
    let mut samples = Vec::new();
    let mut splats = Vec::new();
    for j in 0..64 {
        for i in 0..64 {
            let x = i as f32 * 0.25 + ((i * 7 + j * 3) % 5) as f32 * 0.02;
            let y = j as f32 * 0.25 + ((i * 3 + j * 11) % 7) as f32 * 0.02;
            let z = (x * 0.7).sin() * (y * 0.5).cos();
            let p = Vec3::new(x, y, z);
            let colour = Vec3::new(0.5 + 0.5 * z, 0.3, 0.5 - 0.5 * z);
            samples.push(PointSample::new(p, colour));
            splats.push(PointSplat {
                position: p,
                radius: 0.1,
            });
        }
    }

    let mut grid = PointGrid::new();
    grid.set_missing_colour(Vec3::new(1.0, 0.0, 1.0));
    if let Err(err) = grid.build(samples, 0.5) {
        log::error!("point grid build failed: {err}");
        return;
    }
    println!(
        "grid: {} samples in {:?} cells, {} bytes",
        grid.sample_count(),
        grid.resolution(),
        grid.memory_usage()
    );
    for q in [Vec3::new(2.0, 2.0, 0.0), Vec3::new(8.0, 12.0, 0.5), Vec3::splat(-4.0)] {
        println!(
            "colour at {q}: nearest {} / filtered {}",
            grid.lookup_colour(q, 0.0),
            grid.lookup_colour(q, 0.4)
        );
    }

    let mut accel: Accel<ValueHolder<PointSplat>> = Accel::new();
    accel.compile(ValueHolder::new(splats), &BuildOverrides::default());
    let ray = Ray::new(Vec3::new(5.0, 5.0, 4.0), Vec3::NEG_Z);
    for level in 0..3 {
        match accel.get_hit_object_lazy(&ray, level) {
            Some(sel) => println!(
                "pick level {level}: splat {} at t={:.3} (exact: {})",
                sel.primitive, sel.t, sel.exact
            ),
            None => println!("pick level {level}: nothing"),
        }
    }
}
