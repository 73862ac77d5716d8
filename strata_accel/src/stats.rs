// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostic summary of a compiled tree, returned by [`Accel::stats`](crate::Accel::stats).

/// Shape of a compiled tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Total nodes reachable from the root.
    pub node_count: usize,
    /// Leaves, including empty ones.
    pub leaf_count: usize,
    /// Interior nodes.
    pub interior_nodes: usize,
    /// Depth of the deepest node; the root is at depth `0`.
    pub max_depth: usize,
    /// Largest leaf.
    pub max_leaf_size: usize,
    /// Leaves holding no objects.
    pub empty_leaves: usize,
    /// Object references stored across all leaves.
    pub object_refs: usize,
    /// Build workers that took part in the last compile.
    pub worker_count: usize,
}

impl TreeStats {
    /// True if the tree is a single leaf.
    pub fn is_single_leaf(&self) -> bool {
        self.node_count == 1 && self.interior_nodes == 0
    }

    /// Mean objects per non-empty leaf. Returns `None` if there are none.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Diagnostic ratio; exactness is not required."
    )]
    pub fn mean_leaf_size(&self) -> Option<f32> {
        let filled = self.leaf_count - self.empty_leaves;
        (filled > 0).then(|| self.object_refs as f32 / filled as f32)
    }
}
