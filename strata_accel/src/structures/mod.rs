// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structure implementations.
//!
//! - [`Bvh`]: binary BVH with a parallel binned-SAH (or median) build. Answers every query kind.
//! - [`LinearScan`]: tests every object; nearest-hit and occlusion only.

pub mod bvh;
pub mod linear;

pub use bvh::Bvh;
pub use linear::LinearScan;
