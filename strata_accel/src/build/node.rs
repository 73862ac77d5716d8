// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Temporary build-tree nodes and the per-worker arena they live in.

use crate::build::partition::BuildItem;
use crate::types::{Aabb3, Axis};

/// Reference to a node in one worker's [`NodeArena`].
///
/// The reserved [`NodeRef::EMPTY_LEAF`] value names the build context's shared
/// canonical empty leaf, which belongs to no arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    arena: u32,
    index: u32,
}

impl NodeRef {
    /// The canonical empty leaf.
    pub const EMPTY_LEAF: Self = Self {
        arena: u32::MAX,
        index: u32::MAX,
    };

    const fn new(arena: u32, index: u32) -> Self {
        Self { arena, index }
    }

    /// Whether this refers to the canonical empty leaf.
    pub const fn is_empty_leaf(self) -> bool {
        self.arena == u32::MAX
    }

    /// Arena that owns the node.
    pub const fn arena(self) -> u32 {
        self.arena
    }

    const fn get(self) -> usize {
        self.index as usize
    }
}

/// A node of the temporary build tree.
///
/// Accessors assume the caller knows the node's state; calling an interior-only
/// accessor on a leaf (or the reverse) asserts in debug builds and returns a
/// neutral value otherwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum BuildNode {
    /// Leaf with no objects and no buffer.
    #[default]
    EmptyLeaf,
    /// Interior node splitting along `axis`. Owns both children.
    Interior {
        /// Split axis.
        axis: Axis,
        /// Bounds of everything below.
        bounds: Aabb3,
        /// Child on the low side of the split.
        left: NodeRef,
        /// Child on the high side of the split.
        right: NodeRef,
    },
    /// Leaf owning an exactly-sized buffer of holder indices.
    Leaf {
        /// Bounds of the leaf's objects.
        bounds: Aabb3,
        /// Holder indices.
        objects: Box<[u32]>,
    },
}

impl BuildNode {
    /// The shared canonical empty leaf.
    pub const EMPTY_LEAF: Self = Self::EmptyLeaf;

    /// Become an interior node.
    pub fn set_interior(&mut self, axis: Axis, bounds: Aabb3, left: NodeRef, right: NodeRef) {
        *self = Self::Interior {
            axis,
            bounds,
            left,
            right,
        };
    }

    /// Become a leaf holding a copy of `indices`.
    pub fn set_leaf(&mut self, indices: &[u32], bounds: Aabb3) {
        *self = Self::Leaf {
            bounds,
            objects: indices.into(),
        };
    }

    /// Become a leaf holding the indices of `items[start..start + count]`.
    pub fn set_leaf_range(&mut self, items: &[BuildItem], start: usize, count: usize, bounds: Aabb3) {
        *self = Self::Leaf {
            bounds,
            objects: items[start..start + count].iter().map(|i| i.index).collect(),
        };
    }

    /// Become the canonical empty leaf, dropping any owned buffer.
    pub fn set_empty_static_leaf(&mut self) {
        *self = Self::EmptyLeaf;
    }

    /// Whether this is a leaf (including the empty leaf).
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Interior { .. })
    }

    /// Split axis of an interior node.
    pub fn axis(&self) -> Axis {
        match self {
            Self::Interior { axis, .. } => *axis,
            _ => {
                debug_assert!(false, "axis() called on a leaf");
                Axis::X
            }
        }
    }

    /// Low-side child of an interior node.
    pub fn left_child(&self) -> NodeRef {
        match self {
            Self::Interior { left, .. } => *left,
            _ => {
                debug_assert!(false, "left_child() called on a leaf");
                NodeRef::EMPTY_LEAF
            }
        }
    }

    /// High-side child of an interior node.
    pub fn right_child(&self) -> NodeRef {
        match self {
            Self::Interior { right, .. } => *right,
            _ => {
                debug_assert!(false, "right_child() called on a leaf");
                NodeRef::EMPTY_LEAF
            }
        }
    }

    /// Holder indices of a leaf; empty for the empty leaf.
    pub fn objects(&self) -> &[u32] {
        match self {
            Self::Leaf { objects, .. } => objects,
            Self::EmptyLeaf => &[],
            Self::Interior { .. } => {
                debug_assert!(false, "objects() called on an interior node");
                &[]
            }
        }
    }

    /// Exchange the children of an interior node.
    pub fn swap_children(&mut self) {
        match self {
            Self::Interior { left, right, .. } => core::mem::swap(left, right),
            _ => debug_assert!(false, "swap_children() called on a leaf"),
        }
    }

    /// Bounds of the node; empty for the empty leaf.
    pub fn bounds(&self) -> Aabb3 {
        match self {
            Self::Interior { bounds, .. } | Self::Leaf { bounds, .. } => *bounds,
            Self::EmptyLeaf => Aabb3::EMPTY,
        }
    }
}

/// Storage for the canonical empty leaf shared by every arena.
pub(crate) static EMPTY_LEAF_NODE: BuildNode = BuildNode::EMPTY_LEAF;

/// Bump arena of build nodes owned by one worker.
///
/// Nodes are never freed individually; the arena is dropped as a whole when the
/// build context finishes.
#[derive(Debug)]
pub struct NodeArena {
    id: u32,
    nodes: Vec<BuildNode>,
}

impl NodeArena {
    /// Create an empty arena with the given identity.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            nodes: Vec::new(),
        }
    }

    /// Identity stamped into every [`NodeRef`] this arena hands out.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Move `node` into the arena.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Arenas hold fewer than 2^32 nodes; primitive indices are u32."
    )]
    pub fn alloc(&mut self, node: BuildNode) -> NodeRef {
        let idx = self.nodes.len();
        self.nodes.push(node);
        NodeRef::new(self.id, idx as u32)
    }

    /// Node for `r`, which must come from this arena or be the empty leaf.
    pub fn get(&self, r: NodeRef) -> &BuildNode {
        if r.is_empty_leaf() {
            return &EMPTY_LEAF_NODE;
        }
        debug_assert_eq!(r.arena, self.id, "node reference from a different arena");
        &self.nodes[r.get()]
    }

    /// Mutable node for `r`. The empty leaf cannot be mutated.
    pub fn get_mut(&mut self, r: NodeRef) -> Option<&mut BuildNode> {
        if r.is_empty_leaf() {
            return None;
        }
        debug_assert_eq!(r.arena, self.id, "node reference from a different arena");
        self.nodes.get_mut(r.get())
    }

    /// Number of nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes have been allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Approximate bytes held, including leaf buffers.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * size_of::<BuildNode>()
            + self
                .nodes
                .iter()
                .map(|n| size_of_val(n.objects_if_leaf()))
                .sum::<usize>()
    }
}

impl BuildNode {
    fn objects_if_leaf(&self) -> &[u32] {
        match self {
            Self::Leaf { objects, .. } => objects,
            _ => &[],
        }
    }
}
