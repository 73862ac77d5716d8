// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid over point samples, stored as one bulk cell array.

use core::fmt::Debug;

use glam::Vec3;
use strata_accel::Aabb3;

/// Linear RGB colour.
pub type Colour = Vec3;

/// Upper bound on the number of cells a single build may allocate.
pub const MAX_CELLS: usize = 1 << 26;

/// Samples blended by a filtered lookup.
const FILTER_TAPS: usize = 4;

/// Candidates an unfiltered lookup keeps before picking the nearest.
const NEAREST_TAPS: usize = 2;

/// Errors from [`PointGrid::build`].
#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum GridError {
    /// The cell size was zero, negative, or not finite.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    /// The samples span more cells than [`MAX_CELLS`] at the requested cell size.
    #[error("grid of {0} cells exceeds the limit of {max}", max = MAX_CELLS)]
    TooManyCells(usize),
}

/// A coloured point sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointSample {
    /// Position.
    pub position: Vec3,
    /// Colour carried by the sample.
    pub colour: Colour,
}

impl PointSample {
    /// Create a sample.
    pub const fn new(position: Vec3, colour: Colour) -> Self {
        Self { position, colour }
    }
}

/// Uniform grid of cells, each listing the samples whose position falls inside it.
///
/// Cells are stored compressed: `offsets[c]..offsets[c + 1]` is the run of
/// `indices` belonging to cell `c`. Lookups are cell-local and never look into
/// neighbouring cells, so a sample just across a cell boundary can lose to a
/// farther one inside the cell.
pub struct PointGrid {
    bounds: Aabb3,
    cell_size: f32,
    resolution: [usize; 3],
    samples: Vec<PointSample>,
    offsets: Vec<u32>,
    indices: Vec<u32>,
    missing: Colour,
    built: bool,
}

impl Default for PointGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for PointGrid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PointGrid")
            .field("bounds", &self.bounds)
            .field("cell_size", &self.cell_size)
            .field("resolution", &self.resolution)
            .field("samples", &self.samples.len())
            .field("built", &self.built)
            .finish_non_exhaustive()
    }
}

impl PointGrid {
    /// Create an empty grid. Lookups return the missing colour (black) until built.
    pub fn new() -> Self {
        Self {
            bounds: Aabb3::EMPTY,
            cell_size: 0.0,
            resolution: [0; 3],
            samples: Vec::new(),
            offsets: Vec::new(),
            indices: Vec::new(),
            missing: Colour::ZERO,
            built: false,
        }
    }

    /// Colour returned when a lookup resolves to an empty cell.
    pub fn set_missing_colour(&mut self, colour: Colour) {
        self.missing = colour;
    }

    /// The colour returned for empty cells.
    pub fn missing_colour(&self) -> Colour {
        self.missing
    }

    /// Whether [`PointGrid::build`] has succeeded since construction or the last clear.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Cells per axis.
    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Bounds of the samples.
    pub fn bounds(&self) -> Aabb3 {
        self.bounds
    }

    /// Number of samples held.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Drop all samples and cells. The missing colour is kept.
    pub fn clear(&mut self) {
        let missing = self.missing;
        *self = Self::new();
        self.missing = missing;
    }

    /// Bucket `points` into cells of edge `cell_size`, replacing any previous contents.
    ///
    /// Resolution per axis is `ceil(extent / cell_size)`, at least one. Samples
    /// with non-finite positions are kept out of the cells.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "Resolution is a ceil of a non-negative finite ratio, checked against MAX_CELLS."
    )]
    pub fn build(&mut self, points: Vec<PointSample>, cell_size: f32) -> Result<(), GridError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GridError::InvalidCellSize(cell_size));
        }
        let bounds = Aabb3::from_iter_points(
            points
                .iter()
                .map(|s| s.position)
                .filter(|p| p.is_finite()),
        );
        let extent = bounds.extent();
        let mut resolution = [1_usize; 3];
        let mut cells = 1_usize;
        for (a, r) in resolution.iter_mut().enumerate() {
            let n = (extent[a] / cell_size).ceil();
            if n > MAX_CELLS as f32 {
                return Err(GridError::TooManyCells(usize::MAX));
            }
            *r = (n as usize).max(1);
            cells = cells.saturating_mul(*r);
        }
        if cells > MAX_CELLS {
            return Err(GridError::TooManyCells(cells));
        }

        self.clear();
        self.bounds = bounds;
        self.cell_size = cell_size;
        self.resolution = resolution;

        let mut cell_of: Vec<Option<usize>> = Vec::with_capacity(points.len());
        let mut counts = vec![0_u32; cells + 1];
        let mut skipped = 0_usize;
        for s in &points {
            if s.position.is_finite() {
                let c = self.cell_index(s.position);
                counts[c + 1] += 1;
                cell_of.push(Some(c));
            } else {
                skipped += 1;
                cell_of.push(None);
            }
        }
        if skipped > 0 {
            log::warn!("{skipped} point samples with non-finite positions left out of the grid");
        }
        for c in 0..cells {
            counts[c + 1] += counts[c];
        }
        let mut cursor = counts.clone();
        let mut indices = vec![0_u32; counts[cells] as usize];
        for (i, c) in cell_of.iter().enumerate() {
            if let Some(c) = *c {
                indices[cursor[c] as usize] = i as u32;
                cursor[c] += 1;
            }
        }

        self.offsets = counts;
        self.indices = indices;
        self.samples = points;
        self.built = true;
        log::debug!(
            "point grid: {} samples in {:?} cells of size {cell_size}",
            self.samples.len(),
            self.resolution
        );
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Offsets are clamped into [0, resolution) before use."
    )]
    fn cell_index(&self, p: Vec3) -> usize {
        let rel = (p - self.bounds.min) / self.cell_size;
        let idx: [usize; 3] = core::array::from_fn(|a| {
            (rel[a].max(0.0).floor() as usize).min(self.resolution[a] - 1)
        });
        (idx[2] * self.resolution[1] + idx[1]) * self.resolution[0] + idx[0]
    }

    fn cell_samples(&self, cell: usize) -> &[u32] {
        let start = self.offsets[cell] as usize;
        let end = self.offsets[cell + 1] as usize;
        &self.indices[start..end]
    }

    /// Up to `N` samples of `cell` nearest to `p`, ascending by squared distance.
    fn nearest_in_cell<const N: usize>(&self, cell: usize, p: Vec3) -> ([(f32, u32); N], usize) {
        let mut best = [(f32::INFINITY, 0_u32); N];
        let mut len = 0;
        for &i in self.cell_samples(cell) {
            let d2 = self.samples[i as usize].position.distance_squared(p);
            if len < N {
                best[len] = (d2, i);
                len += 1;
            } else if d2 < best[N - 1].0 {
                best[N - 1] = (d2, i);
            } else {
                continue;
            }
            // Insertion step keeps the taps sorted.
            let mut j = len - 1;
            while j > 0 && best[j].0 < best[j - 1].0 {
                best.swap(j, j - 1);
                j -= 1;
            }
        }
        (best, len)
    }

    /// Colour at `position`.
    ///
    /// The position is clamped into the grid bounds first. With a positive
    /// `filter_radius` the four nearest samples of the cell are blended, each
    /// weighted by `1 - d / d_far` where `d_far` is the farthest of the four.
    /// With a zero radius the nearest sample's colour is returned. Empty cells
    /// and unbuilt grids return the missing colour.
    #[allow(
        clippy::cast_precision_loss,
        reason = "At most four taps are averaged."
    )]
    pub fn lookup_colour(&self, position: Vec3, filter_radius: f32) -> Colour {
        if !self.built || self.indices.is_empty() {
            return self.missing;
        }
        let p = self.bounds.clamp_point(position);
        let cell = self.cell_index(p);
        if filter_radius > 0.0 {
            let (taps, len) = self.nearest_in_cell::<FILTER_TAPS>(cell, p);
            if len == 0 {
                return self.missing;
            }
            let taps = &taps[..len];
            let far = taps[len - 1].0.sqrt();
            let mut sum = Colour::ZERO;
            let mut weight = 0.0;
            if far > 0.0 {
                for &(d2, i) in taps {
                    let w = 1.0 - d2.sqrt() / far;
                    sum += self.samples[i as usize].colour * w;
                    weight += w;
                }
            }
            if weight > f32::EPSILON {
                sum / weight
            } else {
                let total: Colour = taps.iter().map(|&(_, i)| self.samples[i as usize].colour).sum();
                total / len as f32
            }
        } else {
            let (taps, len) = self.nearest_in_cell::<NEAREST_TAPS>(cell, p);
            if len == 0 {
                self.missing
            } else {
                self.samples[taps[0].1 as usize].colour
            }
        }
    }

    /// Bytes held by samples and cells.
    pub fn memory_usage(&self) -> usize {
        size_of_val(self.samples.as_slice())
            + size_of_val(self.offsets.as_slice())
            + size_of_val(self.indices.as_slice())
    }
}
