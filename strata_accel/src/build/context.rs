// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Divide-and-conquer build across the rayon pool.
//!
//! The top levels of recursion fan out with [`rayon::join`]. Below that, each
//! subtree is built by one worker in its private [`NodeArena`] with its private
//! [`Partitioner`], flattened locally, and spliced into the final arrays at a
//! block reserved from the context's counters. Reserving a block and claiming a
//! worker are the only operations that take a lock.

use core::fmt::Debug;

use parking_lot::Mutex;

use crate::build::flat::{FlatKind, FlatNode, FlatTree, flatten};
use crate::build::node::{BuildNode, EMPTY_LEAF_NODE, NodeArena, NodeRef};
use crate::build::partition::{BuildItem, Partitioner, Split, items_bounds};
use crate::config::{BuildConfig, BuildFlags};
use crate::types::Aabb3;

/// Monotonic positions in the final arrays.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    /// Next free node index.
    pub next_node: u32,
    /// Next free object-array offset.
    pub next_offset: u32,
    /// Objects placed in leaves so far.
    pub next_object: u32,
}

/// A block of the final arrays claimed by one worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    /// First node index of the block.
    pub node_base: u32,
    /// First object-array offset of the block.
    pub offset_base: u32,
    /// First object number of the block.
    pub object_base: u32,
}

/// The partitioner of one worker, either created for it or lent by the caller.
enum Strategy<'p, P> {
    Owned(P),
    Borrowed(&'p mut P),
}

impl<P> Strategy<'_, P> {
    fn get(&mut self) -> &mut P {
        match self {
            Self::Owned(p) => p,
            Self::Borrowed(p) => p,
        }
    }
}

/// Private state of one build worker: a node arena and a partitioner.
pub struct WorkerState<'p, P> {
    arena: NodeArena,
    strategy: Strategy<'p, P>,
}

impl<P> WorkerState<'_, P> {
    /// The worker's arena.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// The worker's partitioner.
    pub fn partitioner(&mut self) -> &mut P {
        self.strategy.get()
    }

    /// Whether the partitioner was lent by the caller.
    pub fn borrows_partitioner(&self) -> bool {
        matches!(self.strategy, Strategy::Borrowed(_))
    }
}

impl<P> Debug for WorkerState<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerState")
            .field("arena", &self.arena.id())
            .field("nodes", &self.arena.len())
            .field("borrowed", &self.borrows_partitioner())
            .finish()
    }
}

struct Registry<'p, P> {
    idle: Vec<WorkerState<'p, P>>,
    lent: Vec<&'p mut P>,
    created: u32,
}

/// Summary of a finished build.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Workers created during the build.
    pub workers: u32,
    /// Temporary nodes allocated across all arenas.
    pub arena_nodes: usize,
    /// Items dropped because their bounds were not finite.
    pub skipped: usize,
}

/// One independently built piece of the final arrays.
struct Chunk {
    reservation: Reservation,
    nodes: Vec<FlatNode>,
    objects: Vec<u32>,
}

struct Subtree {
    root: u32,
    bounds: Aabb3,
    chunks: Vec<Chunk>,
}

/// Coordinates one build.
///
/// `P` is the partitioning strategy. Every worker gets its own instance, either
/// created from the configuration or lent by the caller through
/// [`BuildContext::with_partitioners`].
pub struct BuildContext<'p, P: Partitioner> {
    config: BuildConfig,
    counters: Mutex<Counters>,
    registry: Mutex<Registry<'p, P>>,
    fanout_depth: usize,
}

impl<P: Partitioner> Debug for BuildContext<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BuildContext")
            .field("config", &self.config)
            .field("counters", &*self.counters.lock())
            .field("fanout_depth", &self.fanout_depth)
            .finish_non_exhaustive()
    }
}

impl<'p, P: Partitioner> BuildContext<'p, P> {
    /// Context whose workers create their own partitioners.
    pub fn new(config: BuildConfig) -> Self {
        Self::with_partitioners(config, Vec::new())
    }

    /// Context whose workers borrow the given partitioners before creating their own.
    pub fn with_partitioners(config: BuildConfig, lent: Vec<&'p mut P>) -> Self {
        let fanout_depth = if config.flags.contains(BuildFlags::PARALLEL) {
            rayon::current_num_threads().max(1).ilog2() as usize + 1
        } else {
            0
        };
        Self {
            config,
            counters: Mutex::new(Counters::default()),
            registry: Mutex::new(Registry {
                idle: Vec::new(),
                lent,
                created: 0,
            }),
            fanout_depth,
        }
    }

    /// The configuration this context builds with.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The shared canonical empty leaf.
    pub fn empty_leaf(&self) -> &BuildNode {
        &EMPTY_LEAF_NODE
    }

    /// Current counter values.
    pub fn counters(&self) -> Counters {
        *self.counters.lock()
    }

    /// Claim contiguous blocks of the final arrays with one locked increment.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Final arrays are indexed by u32."
    )]
    pub fn reserve(&self, nodes: usize, offsets: usize, objects: usize) -> Reservation {
        let mut c = self.counters.lock();
        let r = Reservation {
            node_base: c.next_node,
            offset_base: c.next_offset,
            object_base: c.next_object,
        };
        c.next_node += nodes as u32;
        c.next_offset += offsets as u32;
        c.next_object += objects as u32;
        r
    }

    /// Take an idle worker, or create one.
    pub fn claim_worker(&self) -> WorkerState<'p, P> {
        let mut reg = self.registry.lock();
        if let Some(w) = reg.idle.pop() {
            return w;
        }
        let id = reg.created;
        reg.created += 1;
        let strategy = match reg.lent.pop() {
            Some(p) => Strategy::Borrowed(p),
            None => Strategy::Owned(P::from_config(&self.config)),
        };
        log::trace!("build worker {id} created");
        WorkerState {
            arena: NodeArena::new(id),
            strategy,
        }
    }

    /// Return a worker to the idle list. Its arena keeps its nodes until the build ends.
    pub fn release_worker(&self, worker: WorkerState<'p, P>) {
        self.registry.lock().idle.push(worker);
    }

    fn fans_out(&self, n: usize, depth: usize) -> bool {
        depth < self.fanout_depth && n >= self.config.parallel_threshold
    }

    /// Build the tree over `items` and assemble the final arrays.
    ///
    /// Items with non-finite bounds are left out. An empty batch yields a tree
    /// whose root is the empty leaf.
    pub fn build(self, mut items: Vec<BuildItem>) -> (FlatTree, BuildReport) {
        let before = items.len();
        items.retain(|it| it.bounds.is_finite());
        let skipped = before - items.len();
        if skipped > 0 {
            log::warn!("{skipped} objects with non-finite bounds left out of the build");
        }

        let subtree = self.build_range(&mut items, 0);
        let counters = self.counters();
        debug_assert_eq!(counters.next_object as usize, items.len());

        let mut nodes = vec![FlatNode::EMPTY_LEAF; counters.next_node as usize];
        let mut objects = vec![0_u32; counters.next_offset as usize];
        for chunk in subtree.chunks {
            let n = chunk.reservation.node_base as usize;
            nodes[n..n + chunk.nodes.len()].copy_from_slice(&chunk.nodes);
            let o = chunk.reservation.offset_base as usize;
            objects[o..o + chunk.objects.len()].copy_from_slice(&chunk.objects);
        }

        let reg = self.registry.into_inner();
        let report = BuildReport {
            workers: reg.created,
            arena_nodes: reg.idle.iter().map(|w| w.arena.len()).sum(),
            skipped,
        };
        log::debug!(
            "built {} nodes over {} objects with {} workers",
            nodes.len(),
            objects.len(),
            report.workers
        );
        let tree = FlatTree {
            nodes,
            objects,
            root: subtree.root,
        };
        (tree, report)
    }

    fn build_range(&self, items: &mut [BuildItem], depth: usize) -> Subtree {
        if !self.fans_out(items.len(), depth) {
            return self.build_serial(items, depth);
        }
        let bounds = items_bounds(items);
        let split = {
            let mut w = self.claim_worker();
            let s = w.partitioner().partition(items, &bounds, depth);
            self.release_worker(w);
            s
        };
        let Split::At { axis, mid } = split else {
            return self.build_serial(items, depth);
        };
        let (lo, hi) = items.split_at_mut(mid);
        let (mut left, mut right) = rayon::join(
            || self.build_range(lo, depth + 1),
            || self.build_range(hi, depth + 1),
        );
        let a = axis.index();
        if right.bounds.min[a] < left.bounds.min[a] {
            core::mem::swap(&mut left, &mut right);
        }
        let reservation = self.reserve(1, 0, 0);
        let node = FlatNode {
            bounds,
            kind: FlatKind::Interior {
                axis,
                left: left.root,
                right: right.root,
            },
        };
        let mut chunks = left.chunks;
        chunks.extend(right.chunks);
        chunks.push(Chunk {
            reservation,
            nodes: vec![node],
            objects: Vec::new(),
        });
        Subtree {
            root: reservation.node_base,
            bounds,
            chunks,
        }
    }

    fn build_serial(&self, items: &mut [BuildItem], depth: usize) -> Subtree {
        let mut worker = self.claim_worker();
        let root = build_in_arena(&mut worker, items, depth);
        let bounds = worker.arena.get(root).bounds();
        let (mut nodes, objects) = flatten(&worker.arena, root);
        self.release_worker(worker);

        let reservation = self.reserve(nodes.len(), objects.len(), items.len());
        for n in &mut nodes {
            n.rebase(reservation.node_base, reservation.offset_base);
        }
        Subtree {
            root: reservation.node_base,
            bounds,
            chunks: vec![Chunk {
                reservation,
                nodes,
                objects,
            }],
        }
    }
}

/// Recursive single-threaded build of one subtree into the worker's arena.
fn build_in_arena<P: Partitioner>(
    worker: &mut WorkerState<'_, P>,
    items: &mut [BuildItem],
    depth: usize,
) -> NodeRef {
    if items.is_empty() {
        return NodeRef::EMPTY_LEAF;
    }
    let bounds = items_bounds(items);
    let split = worker.partitioner().partition(items, &bounds, depth);
    let mut node = BuildNode::default();
    match split {
        Split::Leaf => node.set_leaf_range(items, 0, items.len(), bounds),
        Split::At { axis, mid } => {
            let (lo, hi) = items.split_at_mut(mid);
            let left = build_in_arena(worker, lo, depth + 1);
            let right = build_in_arena(worker, hi, depth + 1);
            node.set_interior(axis, bounds, left, right);
            let a = axis.index();
            if worker.arena.get(right).bounds().min[a] < worker.arena.get(left).bounds().min[a] {
                node.swap_children();
            }
        }
    }
    worker.arena.alloc(node)
}
