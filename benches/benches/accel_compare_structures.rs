// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use strata_accel::{
    Accel, BuildFlags, BuildOverrides, CompactHolder, IndexHolder, LinearScan, Ray, RefHolder,
    Sphere, TriangleMesh, ValueHolder,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
    fn next_vec3(&mut self, scale: f32) -> Vec3 {
        Vec3::new(self.next_f32(), self.next_f32(), self.next_f32()) * scale
    }
}

fn gen_spheres(count: usize, extent: f32) -> Vec<Sphere> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| Sphere::new(rng.next_vec3(extent), 0.2 + rng.next_f32()))
        .collect()
}

fn gen_clustered_spheres(n_clusters: usize, per_cluster: usize, spread: f32) -> Vec<Sphere> {
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let c = rng.next_vec3(500.0);
        for _ in 0..per_cluster {
            let d = (rng.next_vec3(1.0) - Vec3::splat(0.5)) * spread;
            out.push(Sphere::new(c + d, 0.5));
        }
    }
    out
}

fn gen_rays(count: usize, extent: f32) -> Vec<Ray> {
    let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
    (0..count)
        .map(|_| {
            let origin = rng.next_vec3(extent);
            let dir = rng.next_vec3(2.0) - Vec3::ONE;
            Ray::new(origin, dir.normalize_or(Vec3::X))
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[1_000usize, 10_000, 100_000] {
        let spheres = gen_spheres(n, 200.0);
        group.throughput(Throughput::Elements(n as u64));
        for (name, flags) in [("serial", BuildFlags::empty()), ("parallel", BuildFlags::PARALLEL)] {
            let overrides = BuildOverrides {
                parallel_threshold: 1024,
                flags,
                ..BuildOverrides::default()
            };
            group.bench_function(format!("bvh_sah_{name}_n{n}"), |b| {
                b.iter_batched(
                    Accel::<IndexHolder<'_, Sphere>>::new,
                    |mut accel| {
                        accel.compile(IndexHolder::new(&spheres), &overrides);
                        black_box(accel.stats().node_count);
                    },
                    BatchSize::LargeInput,
                )
            });
        }
        let median = BuildOverrides {
            median_split: true,
            ..BuildOverrides::default()
        };
        group.bench_function(format!("bvh_median_n{n}"), |b| {
            b.iter_batched(
                Accel::<IndexHolder<'_, Sphere>>::new,
                |mut accel| {
                    accel.compile(IndexHolder::new(&spheres), &median);
                    black_box(accel.stats().node_count);
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");
    let rays = gen_rays(1_000, 200.0);
    group.throughput(Throughput::Elements(rays.len() as u64));
    for &n in &[1_000usize, 50_000] {
        let spheres = gen_spheres(n, 200.0);
        let mut bvh: Accel<IndexHolder<'_, Sphere>> = Accel::new();
        bvh.compile(IndexHolder::new(&spheres), &BuildOverrides::default());
        group.bench_function(format!("bvh_n{n}"), |b| {
            b.iter(|| {
                let hits = rays.iter().filter_map(|r| bvh.did_hit_object(r)).count();
                black_box(hits);
            })
        });
        if n <= 1_000 {
            let mut scan: Accel<IndexHolder<'_, Sphere>, LinearScan> = Accel::new();
            scan.compile(IndexHolder::new(&spheres), &BuildOverrides::default());
            group.bench_function(format!("linear_n{n}"), |b| {
                b.iter(|| {
                    let hits = rays.iter().filter_map(|r| scan.did_hit_object(r)).count();
                    black_box(hits);
                })
            });
        }
    }
    let clustered = gen_clustered_spheres(64, 512, 30.0);
    let mut bvh: Accel<IndexHolder<'_, Sphere>> = Accel::new();
    bvh.compile(IndexHolder::new(&clustered), &BuildOverrides::default());
    let rays = gen_rays(1_000, 500.0);
    group.bench_function("bvh_clustered", |b| {
        b.iter(|| {
            let hits = rays.iter().filter(|r| bvh.does_occlude(r)).count();
            black_box(hits);
        })
    });
    group.finish();
}

fn bench_holders(c: &mut Criterion) {
    let mut group = c.benchmark_group("holders");
    let mesh = TriangleMesh::plane_grid(128, 128.0);
    let triangles: Vec<_> = (0..mesh.triangle_count() as u32)
        .map(|t| mesh.triangle(t))
        .collect();
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    let rays: Vec<Ray> = (0..2_000)
        .map(|_| {
            let o = rng.next_vec3(128.0) + Vec3::Z * 10.0;
            Ray::new(o, Vec3::new(0.1, 0.05, -1.0))
        })
        .collect();
    group.throughput(Throughput::Elements(rays.len() as u64));

    let mut compact: Accel<CompactHolder<'_>> = Accel::new();
    compact.compile(CompactHolder::new(&mesh), &BuildOverrides::default());
    group.bench_function("compact_mesh", |b| {
        b.iter(|| black_box(rays.iter().filter_map(|r| compact.did_hit_object(r)).count()))
    });

    let mut values: Accel<ValueHolder<strata_accel::Triangle>> = Accel::new();
    values.compile(ValueHolder::new(triangles.clone()), &BuildOverrides::default());
    group.bench_function("owned_triangles", |b| {
        b.iter(|| black_box(rays.iter().filter_map(|r| values.did_hit_object(r)).count()))
    });

    let refs: Vec<&strata_accel::Triangle> = triangles.iter().collect();
    let mut by_ref: Accel<RefHolder<'_, strata_accel::Triangle>> = Accel::new();
    by_ref.compile_from_pointers(&refs, &BuildOverrides::default());
    group.bench_function("borrowed_triangles", |b| {
        b.iter(|| black_box(rays.iter().filter_map(|r| by_ref.did_hit_object(r)).count()))
    });
    group.finish();
}

/// Criterion settings for this group, with build logs routed through `env_logger`.
fn configured() -> Criterion {
    let _ = env_logger::builder().is_test(true).try_init();
    Criterion::default()
}

criterion_group! {
    name = benches;
    config = configured();
    targets = bench_build, bench_nearest, bench_holders
}
criterion_main!(benches);
