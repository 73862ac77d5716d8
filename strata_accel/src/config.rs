// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build configuration: defaults, sentinel-zero overrides, and feature flags.

use crate::types::Shutter;

/// Upper bound on tree depth used when the caller does not override it.
///
/// This is generous for every practical scene; partitioning stops far earlier
/// because leaves form once no productive split remains.
pub const MAX_DEPTH_CAP: usize = 64;

/// Default number of SAH buckets per axis.
pub const DEFAULT_SAH_BUCKETS: usize = 12;

bitflags::bitflags! {
    /// Build feature flags. Copied verbatim from [`BuildOverrides`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BuildFlags: u8 {
        /// Fan the top levels of the build out across the rayon pool.
        const PARALLEL    = 0b0000_0001;
        /// Bound primitives over the shutter window instead of at a single instant.
        const MOTION_BLUR = 0b0000_0010;
    }
}

impl Default for BuildFlags {
    fn default() -> Self {
        Self::PARALLEL
    }
}

/// How the partitioner picks split planes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SplitMethod {
    /// Binned surface area heuristic using the configured cost constants.
    Sah {
        /// Candidate planes per axis.
        buckets: usize,
    },
    /// Equal-count split along the widest centroid axis.
    Median,
}

impl Default for SplitMethod {
    fn default() -> Self {
        Self::Sah {
            buckets: DEFAULT_SAH_BUCKETS,
        }
    }
}

/// Read-only build parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BuildConfig {
    /// Recursion depth at which the builder always emits a leaf.
    pub max_depth: usize,
    /// Largest item count a leaf may hold before the builder keeps splitting.
    pub max_leaf_size: usize,
    /// Relative cost of visiting an interior node.
    pub traversal_cost: f32,
    /// Relative cost of one primitive intersection test.
    pub intersection_cost: f32,
    /// Split plane selection.
    pub split_method: SplitMethod,
    /// Item count at or above which the top levels build in parallel.
    pub parallel_threshold: usize,
    /// Feature flags.
    pub flags: BuildFlags,
    /// Shutter window for motion-blurred builds.
    pub shutter: Shutter,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::for_item_count(0)
    }
}

/// Default maximum depth for `item_count` items.
///
/// Currently a fixed cap independent of the count.
pub fn default_max_depth(_item_count: usize) -> usize {
    MAX_DEPTH_CAP
}

impl BuildConfig {
    /// Defaults for a batch of `item_count` items.
    pub fn for_item_count(item_count: usize) -> Self {
        Self {
            max_depth: default_max_depth(item_count),
            max_leaf_size: 4,
            traversal_cost: 0.125,
            intersection_cost: 1.0,
            split_method: SplitMethod::default(),
            parallel_threshold: 4096,
            flags: BuildFlags::default(),
            shutter: Shutter::default(),
        }
    }

    /// Defaults for `item_count` items with `overrides` applied field by field.
    ///
    /// Zero-valued override fields keep the default; flags are copied as given.
    pub fn derive(item_count: usize, overrides: &BuildOverrides) -> Self {
        let mut c = Self::for_item_count(item_count);
        if overrides.max_depth != 0 {
            c.max_depth = overrides.max_depth;
        }
        if overrides.max_leaf_size != 0 {
            c.max_leaf_size = overrides.max_leaf_size;
        }
        if overrides.traversal_cost > 0.0 {
            c.traversal_cost = overrides.traversal_cost;
        }
        if overrides.intersection_cost > 0.0 {
            c.intersection_cost = overrides.intersection_cost;
        }
        if overrides.median_split {
            c.split_method = SplitMethod::Median;
        } else if overrides.sah_buckets != 0 {
            c.split_method = SplitMethod::Sah {
                buckets: overrides.sah_buckets.max(2),
            };
        }
        if overrides.parallel_threshold != 0 {
            c.parallel_threshold = overrides.parallel_threshold;
        }
        if overrides.shutter.open != 0.0 || overrides.shutter.close != 0.0 {
            c.shutter = Shutter::new(overrides.shutter.open, overrides.shutter.close);
        }
        c.flags = overrides.flags;
        c
    }

    /// Whether motion-blurred bounds are used during the build.
    pub fn motion_blur(&self) -> bool {
        self.flags.contains(BuildFlags::MOTION_BLUR)
    }
}

/// Caller overrides for [`BuildConfig::derive`]. Zero means "use the default".
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BuildOverrides {
    /// Override for [`BuildConfig::max_depth`].
    pub max_depth: usize,
    /// Override for [`BuildConfig::max_leaf_size`].
    pub max_leaf_size: usize,
    /// Override for [`BuildConfig::traversal_cost`].
    pub traversal_cost: f32,
    /// Override for [`BuildConfig::intersection_cost`].
    pub intersection_cost: f32,
    /// SAH bucket count; ignored when `median_split` is set.
    pub sah_buckets: usize,
    /// Use [`SplitMethod::Median`] instead of SAH.
    pub median_split: bool,
    /// Override for [`BuildConfig::parallel_threshold`].
    pub parallel_threshold: usize,
    /// Shutter window; `[0, 0]` keeps the default.
    pub shutter: Shutter,
    /// Feature flags, copied verbatim.
    pub flags: BuildFlags,
}

impl Default for BuildOverrides {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_leaf_size: 0,
            traversal_cost: 0.0,
            intersection_cost: 0.0,
            sah_buckets: 0,
            median_split: false,
            parallel_threshold: 0,
            shutter: Shutter {
                open: 0.0,
                close: 0.0,
            },
            flags: BuildFlags::default(),
        }
    }
}

impl BuildOverrides {
    /// Overrides with only the leaf size set.
    pub fn with_max_leaf_size(max_leaf_size: usize) -> Self {
        Self {
            max_leaf_size,
            ..Self::default()
        }
    }
}
