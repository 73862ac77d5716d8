// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use strata_pointgrid::{PointGrid, PointSample};

fn gen_samples(n: usize) -> Vec<PointSample> {
    let mut x = 0x1234_5678_9ABC_DEF0_u64;
    let mut next = move || {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        ((x >> 40) as f32) / ((1u64 << 24) as f32)
    };
    (0..n)
        .map(|_| {
            let p = Vec3::new(next(), next(), next()) * 100.0;
            PointSample::new(p, p / 100.0)
        })
        .collect()
}

fn bench_pointgrid(c: &mut Criterion) {
    let mut group = c.benchmark_group("pointgrid");
    let samples = gen_samples(200_000);
    group.bench_function("build_200k", |b| {
        b.iter(|| {
            let mut g = PointGrid::new();
            g.build(samples.clone(), 2.0).unwrap();
            black_box(g.resolution());
        })
    });

    let mut grid = PointGrid::new();
    grid.build(samples.clone(), 2.0).unwrap();
    let queries: Vec<Vec3> = samples.iter().take(10_000).map(|s| s.position + 0.3).collect();
    group.throughput(Throughput::Elements(queries.len() as u64));
    for radius in [0.0_f32, 1.0] {
        group.bench_function(format!("lookup_r{radius}"), |b| {
            b.iter(|| {
                let sum: Vec3 = queries.iter().map(|&q| grid.lookup_colour(q, radius)).sum();
                black_box(sum);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pointgrid);
criterion_main!(benches);
