// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shaded spheres.
//!
//! Compile a field of spheres, then trace primary and shadow rays and print
//! the result as ASCII art.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p strata_demos --example shaded_spheres`

use glam::Vec3;
use strata_accel::{Accel, BuildFlags, BuildOverrides, IndexHolder, Ray, Sphere};

const WIDTH: usize = 72;
const HEIGHT: usize = 32;
const RAMP: &[u8] = b" .:-=+*#%@";

fn main() {
    env_logger::init();

    // A ground sphere plus a ring of smaller ones.
    let mut spheres = vec![Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 999.0)];
    for i in 0..24 {
        let a = i as f32 / 24.0 * std::f32::consts::TAU;
        let r = 3.0 + (i % 3) as f32;
        spheres.push(Sphere::new(Vec3::new(a.cos() * r, 0.0, a.sin() * r), 0.6));
    }
    spheres.push(Sphere::new(Vec3::new(0.0, 1.5, 0.0), 1.5));

    let mut accel: Accel<IndexHolder<'_, Sphere>> = Accel::new();
    accel.compile(
        IndexHolder::new(&spheres),
        &BuildOverrides {
            max_leaf_size: 2,
            flags: BuildFlags::PARALLEL,
            ..BuildOverrides::default()
        },
    );
    log::info!("compiled {} spheres: {:?}", accel.size(), accel.stats());

    let eye = Vec3::new(0.0, 4.0, -12.0);
    let light = Vec3::new(-8.0, 12.0, -6.0);
    for row in 0..HEIGHT {
        let mut line = String::with_capacity(WIDTH);
        for col in 0..WIDTH {
            let u = (col as f32 + 0.5) / WIDTH as f32 * 2.0 - 1.0;
            let v = 1.0 - (row as f32 + 0.5) / HEIGHT as f32 * 2.0;
            let dir = Vec3::new(u * 1.2, v * 0.6 - 0.25, 1.0).normalize();
            let ray = Ray::new(eye, dir);
            let shade = match accel.did_hit_object(&ray) {
                None => 0.0,
                Some(hit) => {
                    let to_light = light - hit.point;
                    let dist = to_light.length();
                    let l = to_light / dist;
                    let shadow =
                        Ray::new(hit.point + hit.normal * 1e-3, l).with_interval(0.0, dist);
                    if accel.does_occlude(&shadow) {
                        0.1
                    } else {
                        hit.normal.dot(l).max(0.1)
                    }
                }
            };
            let i = ((shade * (RAMP.len() - 1) as f32).round() as usize).min(RAMP.len() - 1);
            line.push(RAMP[i] as char);
        }
        println!("{line}");
    }
}
