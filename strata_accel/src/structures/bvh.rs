// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding volume hierarchy built in parallel and traversed near-child first.

use core::fmt::Debug;

use rayon::prelude::*;

use crate::build::{
    BuildContext, BuildItem, BuildReport, FlatKind, FlatTree, MedianPartitioner, SahPartitioner,
};
use crate::config::{BuildConfig, SplitMethod};
use crate::holder::ObjectHolder;
use crate::stats::TreeStats;
use crate::structure::{Capabilities, Structure};
use crate::texture::OpacityTexture;
use crate::types::{Aabb3, Ray, RayHit, Selection};

/// Binary BVH over holder indices.
///
/// The tree lives in two flat arrays: nodes addressed by `u32` index and the
/// object indices referenced by leaves. Queries keep a small explicit stack and
/// visit the child whose box the ray enters first, so the nearest hit shrinks
/// the interval before the far child is considered.
#[derive(Default)]
pub struct Bvh {
    tree: FlatTree,
    report: BuildReport,
    motion_blur: bool,
}

impl Debug for Bvh {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bvh")
            .field("nodes", &self.tree.nodes().len())
            .field("objects", &self.tree.object_count())
            .field("motion_blur", &self.motion_blur)
            .finish_non_exhaustive()
    }
}

impl Bvh {
    /// The flat tree.
    pub fn tree(&self) -> &FlatTree {
        &self.tree
    }

    /// Summary of the last build.
    pub fn report(&self) -> BuildReport {
        self.report
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Holder indices are u32 in the flat tree."
    )]
    fn collect_items<H: ObjectHolder>(holder: &H, config: &BuildConfig) -> Vec<BuildItem> {
        let motion = config.motion_blur();
        let shutter = config.shutter;
        (0..holder.size())
            .into_par_iter()
            .map(|i| {
                let bounds = if motion {
                    holder.object_motion_bounds(i, shutter).union()
                } else {
                    holder.object_bounds(i)
                };
                BuildItem::new(i as u32, bounds)
            })
            .collect()
    }

    /// Walk the tree nearest-first, letting `test` shrink the interval with each accepted result.
    fn nearest<R>(
        &self,
        ray: &Ray,
        t_of: impl Fn(&R) -> f32,
        mut test: impl FnMut(usize, &Ray) -> Option<R>,
    ) -> Option<R> {
        let mut ray = *ray;
        let mut best = None;
        let root = self.tree.root();
        let (t_root, _) = ray.intersect_aabb(&self.tree.node(root).bounds)?;
        let mut stack: Vec<(u32, f32)> = Vec::with_capacity(64);
        stack.push((root, t_root));
        while let Some((i, t_entry)) = stack.pop() {
            if t_entry > ray.t_max {
                continue;
            }
            match self.tree.node(i).kind {
                FlatKind::Leaf { first, count } => {
                    for &o in self.tree.leaf_objects(first, count) {
                        if let Some(r) = test(o as usize, &ray) {
                            ray.t_max = t_of(&r);
                            best = Some(r);
                        }
                    }
                }
                FlatKind::Interior { left, right, .. } => {
                    let tl = ray.intersect_aabb(&self.tree.node(left).bounds);
                    let tr = ray.intersect_aabb(&self.tree.node(right).bounds);
                    match (tl, tr) {
                        (Some((a, _)), Some((b, _))) => {
                            // Far child first so the near one pops next.
                            if a <= b {
                                stack.push((right, b));
                                stack.push((left, a));
                            } else {
                                stack.push((left, a));
                                stack.push((right, b));
                            }
                        }
                        (Some((a, _)), None) => stack.push((left, a)),
                        (None, Some((b, _))) => stack.push((right, b)),
                        (None, None) => {}
                    }
                }
            }
        }
        best
    }

    /// Walk the tree until `test` accepts any candidate.
    fn any(&self, ray: &Ray, mut test: impl FnMut(usize, &Ray) -> bool) -> bool {
        let root = self.tree.root();
        if ray.intersect_aabb(&self.tree.node(root).bounds).is_none() {
            return false;
        }
        let mut stack: Vec<u32> = Vec::with_capacity(64);
        stack.push(root);
        while let Some(i) = stack.pop() {
            match self.tree.node(i).kind {
                FlatKind::Leaf { first, count } => {
                    if self
                        .tree
                        .leaf_objects(first, count)
                        .iter()
                        .any(|&o| test(o as usize, ray))
                    {
                        return true;
                    }
                }
                FlatKind::Interior { left, right, .. } => {
                    for child in [right, left] {
                        if ray.intersect_aabb(&self.tree.node(child).bounds).is_some() {
                            stack.push(child);
                        }
                    }
                }
            }
        }
        false
    }
}

impl Structure for Bvh {
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn build<H: ObjectHolder>(&mut self, holder: &H, config: &BuildConfig) {
        let items = Self::collect_items(holder, config);
        let (tree, report) = match config.split_method {
            SplitMethod::Sah { .. } => {
                BuildContext::<'_, SahPartitioner>::new(*config).build(items)
            }
            SplitMethod::Median => {
                BuildContext::<'_, MedianPartitioner>::new(*config).build(items)
            }
        };
        self.tree = tree;
        self.report = report;
        self.motion_blur = config.motion_blur();
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn bounds(&self) -> Aabb3 {
        self.tree.bounds()
    }

    fn did_hit_object<H: ObjectHolder>(&self, holder: &H, ray: &Ray) -> Option<RayHit> {
        self.nearest(ray, |h: &RayHit| h.t, |i, r| holder.did_hit_object(i, r))
    }

    fn does_occlude<H: ObjectHolder>(&self, holder: &H, ray: &Ray) -> bool {
        self.any(ray, |i, r| holder.does_occlude(i, r))
    }

    fn did_hit_object_alpha<H: ObjectHolder, X: OpacityTexture + ?Sized>(
        &self,
        holder: &H,
        ray: &Ray,
        texture: &X,
    ) -> Option<RayHit> {
        self.nearest(ray, |h: &RayHit| h.t, |i, r| {
            holder.did_hit_object_alpha(i, r, texture)
        })
    }

    fn does_occlude_alpha<H: ObjectHolder, X: OpacityTexture + ?Sized>(
        &self,
        holder: &H,
        ray: &Ray,
        texture: &X,
    ) -> bool {
        self.any(ray, |i, r| holder.does_occlude_alpha(i, r, texture))
    }

    fn hit_object_lazy<H: ObjectHolder>(
        &self,
        holder: &H,
        ray: &Ray,
        sub_level: u32,
    ) -> Option<Selection> {
        self.nearest(ray, |s: &Selection| s.t, |i, r| {
            holder.did_hit_object_lazy(i, r, sub_level)
        })
    }

    fn stats(&self) -> TreeStats {
        TreeStats {
            worker_count: self.report.workers as usize,
            ..self.tree.stats()
        }
    }

    fn memory_usage(&self) -> usize {
        self.tree.memory_usage()
    }
}
