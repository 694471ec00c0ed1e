//! This crate provides [`BTree`], an in-memory ordered set backed by a
//! B-Tree with a caller-chosen branching factor.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

use core::{fmt, mem};

use allocator_api2::alloc::{Allocator, Global};
use node::{Node, NodePool, NodeRef};
use tracing::trace;

mod balance;
mod cmp;
mod error;
mod iter;
mod node;
mod order;

pub use cmp::*;
pub use error::*;
pub use iter::*;
pub use order::*;

/// An ordered set based on a [B-Tree].
///
/// Unlike the standard library's `BTreeSet`:
/// - The branching factor is chosen at runtime through an [`Order`].
/// - Elements are arranged by a [`Comparator`], which defaults to the
///   element's [`Ord`] implementation.
/// - Inserting an element that compares equal to a stored one replaces it.
/// - [`BTree::snapshot_iter`] walks a snapshot of the set and can remove the
///   element it just yielded while the walk continues.
///
/// Nodes are kept in an arena and link to their parent by handle, so
/// rebalancing walks back up the tree without holding a path stack.
///
/// [B-Tree]: https://en.wikipedia.org/wiki/B-tree
pub struct BTree<T, C = Natural, A: Allocator + Clone = Global> {
    pool: NodePool<T, A>,
    root: NodeRef,
    order: Order,
    height: usize,
    len: usize,
    cmp: C,
}

impl<T: Ord> BTree<T> {
    /// Creates a new, empty [`BTree`] with the default [`Order`].
    #[inline]
    pub fn new() -> Self {
        Self::with_order(Order::default())
    }

    /// Creates a new, empty [`BTree`] allowing up to `max_children` children
    /// per node.
    #[inline]
    pub fn with_max_children(max_children: usize) -> Result<Self, InvalidOrder> {
        Ok(Self::with_order(Order::new(max_children)?))
    }

    /// Creates a new, empty [`BTree`] with the given [`Order`].
    #[inline]
    pub fn with_order(order: Order) -> Self {
        Self::with_comparator(order, Natural)
    }
}

impl<T, C: Comparator<T>> BTree<T, C> {
    /// Creates a new, empty [`BTree`] whose elements are arranged by `cmp`.
    #[inline]
    pub fn with_comparator(order: Order, cmp: C) -> Self {
        Self::new_in(order, cmp, Global)
    }
}

impl<T, C: Comparator<T>, A: Allocator + Clone> BTree<T, C, A> {
    /// Creates a new, empty [`BTree`] that allocates its nodes with `alloc`.
    #[inline]
    pub fn new_in(order: Order, cmp: C, alloc: A) -> Self {
        let mut pool = NodePool::new_in(alloc);
        let root = pool.alloc_node(Node::new_in(order, None, pool.allocator()));
        Self {
            pool,
            root,
            order,
            height: 0,
            len: 0,
            cmp,
        }
    }

    /// Returns the branching factor of the tree.
    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    /// Returns the comparator arranging the elements.
    #[inline]
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns the number of elements in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of edges between the root and the leaves.
    ///
    /// This is 0 for an empty tree and for a tree consisting of a single node.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Clears the set, removing all elements.
    ///
    /// The node arena keeps its allocation for reuse.
    pub fn clear(&mut self) {
        trace!(
            target: "arbor_btree::clear",
            nodes = self.pool.live_nodes(),
            len = self.len,
            "clearing tree"
        );
        self.pool.clear();
        self.root = self
            .pool
            .alloc_node(Node::new_in(self.order, None, self.pool.allocator()));
        self.height = 0;
        self.len = 0;
    }

    /// Binary-searches the entries of `node` for `value`.
    ///
    /// On a miss, the error holds the index of the first entry greater than
    /// `value`, which is also the index of the child to descend into.
    #[inline]
    pub(crate) fn search(&self, node: NodeRef, value: &T) -> Result<usize, usize> {
        self.pool[node]
            .entries
            .binary_search_by(|entry| self.cmp.compare(entry, value))
    }

    /// Returns the node and position holding an element equal to `value`.
    fn find(&self, value: &T) -> Option<(NodeRef, usize)> {
        let mut node = self.root;
        loop {
            match self.search(node, value) {
                Ok(pos) => return Some((node, pos)),
                Err(pos) => node = *self.pool[node].children.get(pos)?,
            }
        }
    }

    /// Returns `true` if the set contains an element equal to `value`.
    #[inline]
    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Returns a reference to the stored element equal to `value`.
    #[inline]
    pub fn get(&self, value: &T) -> Option<&T> {
        self.find(value)
            .map(|(node, pos)| &self.pool[node].entries[pos])
    }

    /// Adds a value to the set.
    ///
    /// Returns `true` if no equal element was present. Otherwise the stored
    /// element is replaced by `value` and `false` is returned.
    #[inline]
    pub fn insert(&mut self, value: T) -> bool {
        self.replace(value).is_none()
    }

    /// Adds a value to the set, returning the equal element it replaced, if
    /// any.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let mut node = self.root;
        loop {
            match self.search(node, &value) {
                Ok(pos) => {
                    return Some(mem::replace(&mut self.pool[node].entries[pos], value));
                }
                Err(pos) => {
                    let this = &mut self.pool[node];
                    if this.is_leaf() {
                        this.entries.insert(pos, value);
                        break;
                    }
                    node = this.children[pos];
                }
            }
        }

        self.len += 1;
        self.split_upwards(node);
        None
    }

    /// Removes the element equal to `value` from the set and returns it.
    ///
    /// An element held by an internal node is replaced by its in-order
    /// predecessor, which is taken from the rightmost leaf of the subtree to
    /// its left. Rebalancing then starts at the leaf that lost an entry.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        let (node, pos) = self.find(value)?;
        let removed = if self.pool[node].is_leaf() {
            let removed = self.pool[node].entries.remove(pos);
            self.rebalance_upwards(node);
            removed
        } else {
            let leaf = self.rightmost_leaf(self.pool[node].children[pos]);
            let predecessor = self.pool[leaf]
                .entries
                .pop()
                .expect("non-root leaf is never empty");
            let removed = mem::replace(&mut self.pool[node].entries[pos], predecessor);
            self.rebalance_upwards(leaf);
            removed
        };
        self.len -= 1;
        Some(removed)
    }

    fn leftmost_leaf(&self, mut node: NodeRef) -> NodeRef {
        while let Some(&child) = self.pool[node].children.first() {
            node = child;
        }
        node
    }

    fn rightmost_leaf(&self, mut node: NodeRef) -> NodeRef {
        while let Some(&child) = self.pool[node].children.last() {
            node = child;
        }
        node
    }

    /// Returns the smallest element in the set.
    #[inline]
    pub fn smallest(&self) -> Option<&T> {
        self.pool[self.leftmost_leaf(self.root)].entries.first()
    }

    /// Returns the largest element in the set.
    #[inline]
    pub fn largest(&self) -> Option<&T> {
        self.pool[self.rightmost_leaf(self.root)].entries.last()
    }
}

impl<T: Ord> Default for BTree<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for BTree<T> {
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut btree = BTree::new();
        btree.extend(iter);
        btree
    }
}

impl<T, C: Comparator<T>, A: Allocator + Clone> Extend<T> for BTree<T, C, A> {
    #[inline]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| {
            self.replace(value);
        });
    }
}

impl<'a, T: Clone + 'a, C: Comparator<T>, A: Allocator + Clone> Extend<&'a T> for BTree<T, C, A> {
    #[inline]
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| {
            self.replace(value.clone());
        });
    }
}

impl<T: Clone, C: Clone, A: Allocator + Clone> Clone for BTree<T, C, A> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            root: self.root,
            order: self.order,
            height: self.height,
            len: self.len,
            cmp: self.cmp.clone(),
        }
    }
}

impl<T: fmt::Debug, C, A: Allocator + Clone> fmt::Debug for BTree<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
