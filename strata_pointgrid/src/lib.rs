// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strata Point Grid: a uniform grid over coloured point samples.
//!
//! Point-cloud and baked-lighting passes hand in a batch of [`PointSample`]s and
//! look colours back up by position. [`PointGrid::build`] buckets every sample
//! into one cell of a uniform grid; [`PointGrid::lookup_colour`] clamps the query
//! into the sampled bounds and searches only the cell it lands in.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use strata_pointgrid::{PointGrid, PointSample};
//!
//! let red = Vec3::new(1.0, 0.0, 0.0);
//! let mut grid = PointGrid::new();
//! grid.build(
//!     vec![
//!         PointSample::new(Vec3::ZERO, red),
//!         PointSample::new(Vec3::X, Vec3::Y),
//!         PointSample::new(Vec3::X * 2.0, Vec3::Z),
//!     ],
//!     1.0,
//! )?;
//! assert_eq!(grid.resolution(), [2, 1, 1]);
//! assert_eq!(grid.lookup_colour(Vec3::new(0.1, 0.0, 0.0), 0.0), red);
//! # Ok::<(), strata_pointgrid::GridError>(())
//! ```
//!
//! The search never crosses into neighbouring cells. Pick a cell size large
//! enough that most cells hold several samples.

mod grid;

pub use grid::{Colour, GridError, MAX_CELLS, PointGrid, PointSample};
