// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Split-plane selection for the builder.

use glam::Vec3;

use crate::config::{BuildConfig, SplitMethod};
use crate::types::{Aabb3, Axis};

/// One object as seen by the builder: its holder index, bounds, and centroid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BuildItem {
    /// Holder index.
    pub index: u32,
    /// Bounds used for the build.
    pub bounds: Aabb3,
    /// Centroid of `bounds`.
    pub centroid: Vec3,
}

impl BuildItem {
    /// Item for holder index `index` with the given bounds.
    pub fn new(index: u32, bounds: Aabb3) -> Self {
        Self {
            index,
            bounds,
            centroid: bounds.centroid(),
        }
    }
}

/// Bounds of a run of items.
pub fn items_bounds(items: &[BuildItem]) -> Aabb3 {
    items
        .iter()
        .fold(Aabb3::EMPTY, |acc, it| acc.union(it.bounds))
}

fn centroid_bounds(items: &[BuildItem]) -> Aabb3 {
    Aabb3::from_iter_points(items.iter().map(|it| it.centroid))
}

/// Outcome of partitioning a run of items.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Split {
    /// Stop here and emit a leaf.
    Leaf,
    /// Items were reordered so `[..mid]` lies on the low side of `axis` and `[mid..]` on the high side.
    ///
    /// Both sides are non-empty.
    At {
        /// Split axis.
        axis: Axis,
        /// Count of items on the low side.
        mid: usize,
    },
}

/// Split-plane selection with private scratch space.
///
/// Each build worker owns one partitioner. Partitioning depends only on the
/// items it is handed, so a subtree comes out the same whichever worker builds it.
pub trait Partitioner: Send {
    /// Partitioner for the given configuration.
    fn from_config(config: &BuildConfig) -> Self
    where
        Self: Sized;

    /// Reorder `items` around a split plane, or decide that they form a leaf.
    ///
    /// `bounds` is the union of the items' bounds; `depth` is the depth of the
    /// node being built.
    fn partition(&mut self, items: &mut [BuildItem], bounds: &Aabb3, depth: usize) -> Split;
}

#[derive(Copy, Clone, Debug)]
struct Bucket {
    count: usize,
    bounds: Aabb3,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            count: 0,
            bounds: Aabb3::EMPTY,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The scaled offset is clamped to [0, buckets) before use."
)]
#[inline]
fn bucket_of(value: f32, min: f32, scale: f32, buckets: usize) -> usize {
    let b = ((value - min) * scale).max(0.0) as usize;
    b.min(buckets - 1)
}

/// Binned surface area heuristic over all three axes.
///
/// Items are binned by centroid; prefix and suffix sweeps over the buckets give
/// every candidate plane's child counts and areas in one pass per axis.
#[derive(Debug)]
pub struct SahPartitioner {
    buckets: usize,
    max_leaf_size: usize,
    max_depth: usize,
    traversal_cost: f32,
    intersection_cost: f32,
    scratch: Vec<Bucket>,
    right_area: Vec<(usize, f32)>,
}

impl SahPartitioner {
    fn leaf_stop(&self, n: usize, depth: usize) -> bool {
        n <= self.max_leaf_size || depth >= self.max_depth
    }
}

impl Partitioner for SahPartitioner {
    fn from_config(config: &BuildConfig) -> Self {
        let buckets = match config.split_method {
            SplitMethod::Sah { buckets } => buckets.max(2),
            SplitMethod::Median => crate::config::DEFAULT_SAH_BUCKETS,
        };
        Self {
            buckets,
            max_leaf_size: config.max_leaf_size.max(1),
            max_depth: config.max_depth,
            traversal_cost: config.traversal_cost,
            intersection_cost: config.intersection_cost,
            scratch: Vec::with_capacity(buckets),
            right_area: Vec::with_capacity(buckets),
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "Counts only weight the cost estimate."
    )]
    fn partition(&mut self, items: &mut [BuildItem], bounds: &Aabb3, depth: usize) -> Split {
        let n = items.len();
        if self.leaf_stop(n, depth) {
            return Split::Leaf;
        }
        let cb = centroid_bounds(items);
        let extent = cb.extent();
        let area = bounds.surface_area();
        let inv_area = if area > 0.0 { area.recip() } else { 0.0 };

        // (cost, axis, last bucket on the low side)
        let mut best: Option<(f32, Axis, usize)> = None;
        for axis in Axis::ALL {
            let a = axis.index();
            if extent[a] <= 0.0 {
                continue;
            }
            let nb = self.buckets;
            let scale = nb as f32 / extent[a];
            self.scratch.clear();
            self.scratch.resize(nb, Bucket::default());
            for it in items.iter() {
                let b = &mut self.scratch[bucket_of(it.centroid[a], cb.min[a], scale, nb)];
                b.count += 1;
                b.bounds = b.bounds.union(it.bounds);
            }

            // Suffix sweep: right_area[i] describes buckets (i + 1)..nb.
            self.right_area.clear();
            self.right_area.resize(nb, (0, 0.0));
            let mut acc = Bucket::default();
            for i in (1..nb).rev() {
                acc.count += self.scratch[i].count;
                acc.bounds = acc.bounds.union(self.scratch[i].bounds);
                self.right_area[i - 1] = (acc.count, acc.bounds.surface_area());
            }

            let mut left = Bucket::default();
            for i in 0..nb - 1 {
                left.count += self.scratch[i].count;
                left.bounds = left.bounds.union(self.scratch[i].bounds);
                let (nr, ar) = self.right_area[i];
                if left.count == 0 || nr == 0 {
                    continue;
                }
                let nl = left.count;
                let cost = if inv_area > 0.0 {
                    self.traversal_cost
                        + self.intersection_cost
                            * (nl as f32 * left.bounds.surface_area() + nr as f32 * ar)
                            * inv_area
                } else {
                    // Degenerate node: prefer balanced counts.
                    (nl as f32 - nr as f32).abs()
                };
                if best.is_none_or(|(c, _, _)| cost < c) {
                    best = Some((cost, axis, i));
                }
            }
        }

        let Some((_, axis, last)) = best else {
            return Split::Leaf;
        };
        let a = axis.index();
        let nb = self.buckets;
        let scale = nb as f32 / extent[a];
        let mut mid = 0;
        for i in 0..n {
            if bucket_of(items[i].centroid[a], cb.min[a], scale, nb) <= last {
                items.swap(i, mid);
                mid += 1;
            }
        }
        debug_assert!(mid > 0 && mid < n, "SAH split left one side empty");
        Split::At { axis, mid }
    }
}

/// Equal-count split along the widest centroid axis.
#[derive(Debug)]
pub struct MedianPartitioner {
    max_leaf_size: usize,
    max_depth: usize,
}

impl Partitioner for MedianPartitioner {
    fn from_config(config: &BuildConfig) -> Self {
        Self {
            max_leaf_size: config.max_leaf_size.max(1),
            max_depth: config.max_depth,
        }
    }

    fn partition(&mut self, items: &mut [BuildItem], _bounds: &Aabb3, depth: usize) -> Split {
        let n = items.len();
        if n <= self.max_leaf_size || depth >= self.max_depth {
            return Split::Leaf;
        }
        let cb = centroid_bounds(items);
        let axis = cb.largest_axis();
        let a = axis.index();
        if cb.extent()[a] <= 0.0 {
            return Split::Leaf;
        }
        let mid = n / 2;
        items.select_nth_unstable_by(mid, |l, r| l.centroid[a].total_cmp(&r.centroid[a]));
        Split::At { axis, mid }
    }
}
