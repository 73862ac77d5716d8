// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Alpha cutout.
//!
//! A triangle-mesh sheet with a checkerboard opacity mask hovers above a
//! solid floor. Alpha-tested queries see through the cut-out squares.
//!
//! Run:
//! - `cargo run -p strata_demos --example alpha_cutout`

use glam::Vec3;
use strata_accel::{Accel, AlphaMask, BakedHolder, BuildOverrides, Ray, TriangleMesh};

fn main() {
    env_logger::init();

    // Two stacked sheets in one mesh: owner 0 is the cut-out sheet, owner 1 the floor.
    let sheet = TriangleMesh::plane_grid(16, 16.0);
    let mut positions = sheet.positions.clone();
    let mut uvs = sheet.uvs.clone();
    let mut indices = sheet.indices.clone();
    let base = positions.len() as u32;
    positions.extend(sheet.positions.iter().map(|p| *p - Vec3::Z * 2.0));
    uvs.extend(sheet.uvs.iter().copied());
    indices.extend(sheet.indices.iter().map(|t| t.map(|i| i + base)));
    let mesh = TriangleMesh {
        positions,
        uvs,
        indices,
    };

    let per_sheet = sheet.triangle_count() as u32;
    let triangles: Vec<u32> = (0..mesh.triangle_count() as u32).collect();
    let owners = triangles.iter().map(|t| t / per_sheet).collect();
    let holder = BakedHolder::new(&mesh, triangles, owners);
    let mut accel: Accel<BakedHolder<'_>> = Accel::new();
    accel.compile(holder, &BuildOverrides::default());

    // Opaque on even checker squares, clear on odd ones.
    let mask = AlphaMask::from_fn(8, 8, |x, y| if (x + y) % 2 == 0 { 1.0 } else { 0.0 });

    let mut counts = [0_usize; 3];
    for y in 0..32 {
        for x in 0..32 {
            let o = Vec3::new(x as f32 * 0.5 + 0.25, y as f32 * 0.5 + 0.25, 5.0);
            let ray = Ray::new(o, Vec3::NEG_Z);
            match accel.did_hit_object_alpha(&ray, &mask).and_then(|h| h.extra) {
                Some(0) => counts[0] += 1,
                Some(_) => counts[1] += 1,
                None => counts[2] += 1,
            }
        }
    }
    println!("sheet hits: {}", counts[0]);
    println!("floor hits through cutouts: {}", counts[1]);
    println!("misses: {}", counts[2]);

    let ray = Ray::new(Vec3::new(8.1, 8.1, 5.0), Vec3::NEG_Z);
    println!(
        "opaque query occluded: {}, alpha query occluded: {}",
        accel.does_occlude(&ray),
        accel.does_occlude_alpha(&ray, &mask)
    );
    println!("{:?}", accel.stats());
}
