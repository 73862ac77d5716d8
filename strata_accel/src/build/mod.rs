// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree construction.
//!
//! - [`node`]: temporary build-tree nodes and per-worker arenas.
//! - [`partition`]: split-plane selection ([`SahPartitioner`], [`MedianPartitioner`]).
//! - [`context`]: parallel coordination and splicing into the final arrays.
//! - [`flat`]: the compact read-only tree that queries traverse.

pub mod context;
pub mod flat;
pub mod node;
pub mod partition;

pub use context::{BuildContext, BuildReport, Counters, Reservation, WorkerState};
pub use flat::{FlatKind, FlatNode, FlatTree};
pub use node::{BuildNode, NodeArena, NodeRef};
pub use partition::{BuildItem, MedianPartitioner, Partitioner, SahPartitioner, Split};
