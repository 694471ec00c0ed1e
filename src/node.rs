//! Arena storage for tree nodes.
//!
//! Nodes live in a [`NodePool`] and refer to each other through [`NodeRef`]
//! handles. Each node owns the handles of its children and records the handle
//! of its parent, which is only used to walk back up the tree while
//! rebalancing.

use core::ops::{Index, IndexMut};

use allocator_api2::{alloc::Allocator, vec::Vec};
use nonmax::NonMaxU32;

use crate::Order;

/// Handle to a node in a [`NodePool`].
///
/// The niche from `NonMaxU32` keeps `Option<NodeRef>` at 4 bytes, which is
/// what every parent link is stored as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeRef(NonMaxU32);

impl NodeRef {
    #[inline]
    fn new(index: usize) -> Self {
        let index = u32::try_from(index)
            .ok()
            .and_then(NonMaxU32::new)
            .expect("node pool exceeded u32::MAX - 1 nodes");
        Self(index)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0.get() as usize
    }
}

/// A single B-Tree node.
///
/// Internal nodes have exactly `entries.len() + 1` children, leaves have none.
pub(crate) struct Node<T, A: Allocator> {
    pub(crate) entries: Vec<T, A>,
    pub(crate) children: Vec<NodeRef, A>,
    pub(crate) parent: Option<NodeRef>,
}

impl<T, A: Allocator + Clone> Node<T, A> {
    /// Creates an empty node with room for one entry past the maximum, which
    /// is the transient state of a node right before it splits.
    #[inline]
    pub(crate) fn new_in(order: Order, parent: Option<NodeRef>, alloc: &A) -> Self {
        Self {
            entries: Vec::with_capacity_in(order.max_children(), alloc.clone()),
            children: Vec::new_in(alloc.clone()),
            parent,
        }
    }
}

impl<T, A: Allocator> Node<T, A> {
    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Node<T, A> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            children: self.children.clone(),
            parent: self.parent,
        }
    }
}

enum Slot<T, A: Allocator> {
    Occupied(Node<T, A>),
    /// Link to the next free slot.
    Vacant(Option<NodeRef>),
}

impl<T: Clone, A: Allocator + Clone> Clone for Slot<T, A> {
    fn clone(&self) -> Self {
        match self {
            Slot::Occupied(node) => Slot::Occupied(node.clone()),
            Slot::Vacant(next) => Slot::Vacant(*next),
        }
    }
}

/// Slot vector holding every node of a tree.
///
/// Freed slots are threaded into a free list and reused by later allocations,
/// so handles stay small and splits after merges don't grow the pool.
pub(crate) struct NodePool<T, A: Allocator + Clone> {
    slots: Vec<Slot<T, A>, A>,
    free: Option<NodeRef>,
    live: usize,
    alloc: A,
}

impl<T, A: Allocator + Clone> NodePool<T, A> {
    #[inline]
    pub(crate) fn new_in(alloc: A) -> Self {
        Self {
            slots: Vec::new_in(alloc.clone()),
            free: None,
            live: 0,
            alloc,
        }
    }

    /// Returns the allocator used for the pool and for node contents.
    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Number of nodes currently in use.
    #[inline]
    pub(crate) fn live_nodes(&self) -> usize {
        self.live
    }

    /// Moves `node` into the pool and returns its handle.
    #[inline]
    pub(crate) fn alloc_node(&mut self, node: Node<T, A>) -> NodeRef {
        self.live += 1;
        match self.free {
            Some(free) => {
                let slot = &mut self.slots[free.index()];
                let Slot::Vacant(next) = *slot else {
                    panic!("free list points at an occupied slot");
                };
                self.free = next;
                *slot = Slot::Occupied(node);
                free
            }
            None => {
                let node_ref = NodeRef::new(self.slots.len());
                self.slots.push(Slot::Occupied(node));
                node_ref
            }
        }
    }

    /// Removes a node from the pool, returning its contents.
    ///
    /// The handle must not be used again until it is handed out by a later
    /// `alloc_node`.
    #[inline]
    pub(crate) fn free_node(&mut self, node: NodeRef) -> Node<T, A> {
        let slot = core::mem::replace(&mut self.slots[node.index()], Slot::Vacant(self.free));
        let Slot::Occupied(node_data) = slot else {
            panic!("double free of node {}", node.index());
        };
        self.free = Some(node);
        self.live -= 1;
        node_data
    }

    /// Frees every node without releasing the slot vector's memory.
    #[inline]
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
        self.live = 0;
    }

    /// Points the parent link of every child of `node` from index `from`
    /// onwards back at `node`.
    #[inline]
    pub(crate) fn adopt_children(&mut self, node: NodeRef, from: usize) {
        for i in from..self[node].children.len() {
            let child = self[node].children[i];
            self[child].parent = Some(node);
        }
    }

    /// Returns the position of `child` among the children of `parent`.
    #[inline]
    pub(crate) fn child_index(&self, parent: NodeRef, child: NodeRef) -> usize {
        self[parent]
            .children
            .iter()
            .position(|&c| c == child)
            .expect("node is missing from its parent's children")
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for NodePool<T, A> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            free: self.free,
            live: self.live,
            alloc: self.alloc.clone(),
        }
    }
}

impl<T, A: Allocator + Clone> Index<NodeRef> for NodePool<T, A> {
    type Output = Node<T, A>;

    #[inline]
    fn index(&self, node: NodeRef) -> &Self::Output {
        match &self.slots[node.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant(_) => panic!("use of freed node {}", node.index()),
        }
    }
}

impl<T, A: Allocator + Clone> IndexMut<NodeRef> for NodePool<T, A> {
    #[inline]
    fn index_mut(&mut self, node: NodeRef) -> &mut Self::Output {
        match &mut self.slots[node.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant(_) => panic!("use of freed node {}", node.index()),
        }
    }
}
