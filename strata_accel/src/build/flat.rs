// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact read-only tree produced once a build completes.

use crate::build::node::{BuildNode, NodeArena, NodeRef};
use crate::stats::TreeStats;
use crate::types::{Aabb3, Axis};

/// Node payload of the flat tree. Children and object ranges are integer indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlatKind {
    /// Interior node; `left` is the child on the low side of `axis`.
    Interior {
        /// Split axis.
        axis: Axis,
        /// Index of the low-side child.
        left: u32,
        /// Index of the high-side child.
        right: u32,
    },
    /// Leaf covering `objects[first..first + count]`.
    Leaf {
        /// Offset into the object array.
        first: u32,
        /// Number of objects.
        count: u32,
    },
}

/// One node of the flat tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlatNode {
    /// Bounds of everything below.
    pub bounds: Aabb3,
    /// Payload.
    pub kind: FlatKind,
}

impl FlatNode {
    /// The empty leaf.
    pub const EMPTY_LEAF: Self = Self {
        bounds: Aabb3::EMPTY,
        kind: FlatKind::Leaf { first: 0, count: 0 },
    };

    /// Whether this is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, FlatKind::Leaf { .. })
    }

    /// Shift child indices by `node_base` and object offsets by `object_base`.
    pub(crate) fn rebase(&mut self, node_base: u32, object_base: u32) {
        match &mut self.kind {
            FlatKind::Interior { left, right, .. } => {
                *left += node_base;
                *right += node_base;
            }
            FlatKind::Leaf { first, count } => {
                if *count > 0 {
                    *first += object_base;
                }
            }
        }
    }
}

/// Contiguous node and object arrays with a root index.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatTree {
    pub(crate) nodes: Vec<FlatNode>,
    pub(crate) objects: Vec<u32>,
    pub(crate) root: u32,
}

impl Default for FlatTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl FlatTree {
    /// Tree with a single empty leaf.
    pub fn empty() -> Self {
        Self {
            nodes: vec![FlatNode::EMPTY_LEAF],
            objects: Vec::new(),
            root: 0,
        }
    }

    /// Index of the root node.
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Node at `index`.
    #[inline]
    pub fn node(&self, index: u32) -> &FlatNode {
        &self.nodes[index as usize]
    }

    /// All nodes, in storage order.
    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    /// Holder indices of a leaf.
    #[inline]
    pub fn leaf_objects(&self, first: u32, count: u32) -> &[u32] {
        let first = first as usize;
        &self.objects[first..first + count as usize]
    }

    /// Bounds of the whole tree.
    pub fn bounds(&self) -> Aabb3 {
        self.node(self.root).bounds
    }

    /// Number of objects referenced by leaves.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Leaf object sets, each sorted, listed in depth-first order.
    pub fn leaf_sets(&self) -> Vec<Vec<u32>> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(i) = stack.pop() {
            match self.node(i).kind {
                FlatKind::Interior { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
                FlatKind::Leaf { first, count } => {
                    let mut set = self.leaf_objects(first, count).to_vec();
                    set.sort_unstable();
                    out.push(set);
                }
            }
        }
        out
    }

    /// Shape summary of the tree.
    pub fn stats(&self) -> TreeStats {
        let mut s = TreeStats::default();
        let mut stack = vec![(self.root, 0_usize)];
        while let Some((i, depth)) = stack.pop() {
            s.node_count += 1;
            s.max_depth = s.max_depth.max(depth);
            match self.node(i).kind {
                FlatKind::Interior { left, right, .. } => {
                    s.interior_nodes += 1;
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
                FlatKind::Leaf { count, .. } => {
                    s.leaf_count += 1;
                    s.max_leaf_size = s.max_leaf_size.max(count as usize);
                    if count == 0 {
                        s.empty_leaves += 1;
                    }
                }
            }
        }
        s.object_refs = self.objects.len();
        s
    }

    /// Bytes held by the node and object arrays.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * size_of::<FlatNode>() + self.objects.capacity() * size_of::<u32>()
    }
}

/// Flatten the arena subtree at `root` into local, zero-based arrays.
///
/// Nodes are laid out depth first with the root at index `0`.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Node and object counts are bounded by the u32 holder index space."
)]
pub(crate) fn flatten(arena: &NodeArena, root: NodeRef) -> (Vec<FlatNode>, Vec<u32>) {
    fn visit(arena: &NodeArena, r: NodeRef, nodes: &mut Vec<FlatNode>, objects: &mut Vec<u32>) -> u32 {
        let slot = nodes.len() as u32;
        let node = arena.get(r);
        nodes.push(FlatNode::EMPTY_LEAF);
        let kind = match node {
            BuildNode::Interior {
                axis, left, right, ..
            } => {
                let l = visit(arena, *left, nodes, objects);
                let r = visit(arena, *right, nodes, objects);
                FlatKind::Interior {
                    axis: *axis,
                    left: l,
                    right: r,
                }
            }
            BuildNode::Leaf { objects: ids, .. } => {
                let first = objects.len() as u32;
                objects.extend_from_slice(ids);
                FlatKind::Leaf {
                    first,
                    count: ids.len() as u32,
                }
            }
            BuildNode::EmptyLeaf => FlatKind::Leaf { first: 0, count: 0 },
        };
        nodes[slot as usize] = FlatNode {
            bounds: node.bounds(),
            kind,
        };
        slot
    }

    let mut nodes = Vec::new();
    let mut objects = Vec::new();
    visit(arena, root, &mut nodes, &mut objects);
    (nodes, objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn empty_tree_has_one_empty_leaf() {
        let t = FlatTree::empty();
        let s = t.stats();
        assert_eq!(s.node_count, 1);
        assert_eq!(s.leaf_count, 1);
        assert_eq!(s.empty_leaves, 1);
        assert!(t.bounds().is_empty());
        assert_eq!(t.leaf_sets(), vec![Vec::<u32>::new()]);
    }

    #[test]
    fn flatten_lays_out_depth_first() {
        let mut arena = NodeArena::new(0);
        let b = Aabb3::new(Vec3::ZERO, Vec3::ONE);
        let mut l = BuildNode::default();
        l.set_leaf(&[2, 0], b);
        let mut r = BuildNode::default();
        r.set_leaf(&[1], b);
        let lr = arena.alloc(l);
        let rr = arena.alloc(r);
        let mut root = BuildNode::default();
        root.set_interior(Axis::X, b, lr, rr);
        let root = arena.alloc(root);

        let (nodes, objects) = flatten(&arena, root);
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[0].kind,
            FlatKind::Interior {
                axis: Axis::X,
                left: 1,
                right: 2
            }
        );
        assert_eq!(nodes[1].kind, FlatKind::Leaf { first: 0, count: 2 });
        assert_eq!(nodes[2].kind, FlatKind::Leaf { first: 2, count: 1 });
        assert_eq!(objects, vec![2, 0, 1]);
    }

    #[test]
    fn rebase_shifts_indices() {
        let mut n = FlatNode {
            bounds: Aabb3::EMPTY,
            kind: FlatKind::Interior {
                axis: Axis::Z,
                left: 1,
                right: 2,
            },
        };
        n.rebase(10, 100);
        assert_eq!(
            n.kind,
            FlatKind::Interior {
                axis: Axis::Z,
                left: 11,
                right: 12
            }
        );
        let mut leaf = FlatNode {
            bounds: Aabb3::EMPTY,
            kind: FlatKind::Leaf { first: 3, count: 2 },
        };
        leaf.rebase(10, 100);
        assert_eq!(leaf.kind, FlatKind::Leaf { first: 103, count: 2 });
    }
}
