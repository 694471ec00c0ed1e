//! Structural changes to the tree: splitting overfull nodes and restoring
//! underfull ones.
//!
//! Both directions walk upwards through parent links. A split can overfill the
//! parent that receives the median, and a merge can underfill the parent that
//! loses the separator, so each routine returns the parent that needs to be
//! looked at next.

use core::mem;

use allocator_api2::{alloc::Allocator, vec::Vec};
use tracing::trace;

use crate::{
    BTree, Comparator,
    node::{Node, NodeRef},
};

impl<T, C: Comparator<T>, A: Allocator + Clone> BTree<T, C, A> {
    /// Splits nodes holding `max_children` entries, starting at `node` and
    /// moving up for as long as the parent receiving the median overflows.
    pub(crate) fn split_upwards(&mut self, mut node: NodeRef) {
        while self.pool[node].entries.len() > self.order.max_entries() {
            match self.split(node) {
                Some(parent) => node = parent,
                None => break,
            }
        }
    }

    /// Splits an overfull node around its median.
    ///
    /// Entries before the median move to a new left node and entries after it
    /// to a new right node. `node` is left holding only the median with the
    /// two new nodes as children. If `node` has a parent, it is then spliced
    /// into the parent and freed, and the parent is returned since it may now
    /// be overfull itself. Otherwise `node` is the root and the tree has grown
    /// by one level.
    fn split(&mut self, node: NodeRef) -> Option<NodeRef> {
        debug_assert_eq!(self.pool[node].entries.len(), self.order.max_children());

        let split = self.order.split_point();
        let fresh = Node::new_in(self.order, Some(node), self.pool.allocator());
        let (mut left, right) = {
            let this = &mut self.pool[node];
            let mut left = Node {
                entries: mem::replace(&mut this.entries, fresh.entries),
                children: mem::replace(&mut this.children, fresh.children),
                parent: Some(node),
            };
            let right = Node {
                entries: left.entries.split_off(split + 1),
                children: if left.is_leaf() {
                    Vec::new_in(self.pool.allocator().clone())
                } else {
                    left.children.split_off(split + 1)
                },
                parent: Some(node),
            };
            (left, right)
        };
        let median = left
            .entries
            .pop()
            .expect("split node has an entry at the split point");

        let left = self.pool.alloc_node(left);
        let right = self.pool.alloc_node(right);
        self.pool.adopt_children(left, 0);
        self.pool.adopt_children(right, 0);

        let this = &mut self.pool[node];
        this.entries.push(median);
        this.children.push(left);
        this.children.push(right);
        self.debug_check_node(left);
        self.debug_check_node(right);

        let Some(parent) = self.pool[node].parent else {
            self.height += 1;
            trace!(
                target: "arbor_btree::split",
                height = self.height,
                "split root node"
            );
            return None;
        };

        // The node is replaced in its parent by its median and two halves.
        let pos = self.pool.child_index(parent, node);
        self.pool[parent].children.remove(pos);
        let index = match self.search(parent, &self.pool[node].entries[0]) {
            Ok(_) => panic!("split median is already present in the parent node"),
            Err(index) => index,
        };
        debug_assert_eq!(index, pos);
        self.splice(parent, index, node);
        trace!(
            target: "arbor_btree::split",
            parent = parent.index(),
            entries = self.pool[parent].entries.len(),
            "split node into parent"
        );
        Some(parent)
    }

    /// Moves all entries and children of `from` into `into`, starting at
    /// `index`, and frees `from`.
    ///
    /// The spliced children are re-parented to `into`.
    fn splice(&mut self, into: NodeRef, index: usize, from: NodeRef) {
        let from = self.pool.free_node(from);
        let child_count = from.children.len();
        let this = &mut self.pool[into];
        for (offset, entry) in from.entries.into_iter().enumerate() {
            this.entries.insert(index + offset, entry);
        }
        for (offset, child) in from.children.into_iter().enumerate() {
            this.children.insert(index + offset, child);
        }
        for i in index..index + child_count {
            let child = self.pool[into].children[i];
            self.pool[child].parent = Some(into);
        }
    }

    /// Restores occupancy after an entry was taken out of `node`, walking up
    /// through every parent that loses an entry to a merge.
    pub(crate) fn rebalance_upwards(&mut self, mut node: NodeRef) {
        while let Some(parent) = self.rebalance(node) {
            node = parent;
        }
    }

    /// Restores the occupancy invariant for `node`, which just lost an entry.
    ///
    /// An underfull node first tries to steal an entry from its left sibling,
    /// then from its right sibling. If neither can spare one, it is merged with
    /// a sibling and the separator between them, in which case the parent is
    /// returned since it lost an entry.
    fn rebalance(&mut self, node: NodeRef) -> Option<NodeRef> {
        let Some(parent) = self.pool[node].parent else {
            self.collapse_root();
            return None;
        };

        let min_entries = self.order.min_entries();
        if self.pool[node].entries.len() >= min_entries {
            return None;
        }

        let pos = self.pool.child_index(parent, node);
        let left = pos.checked_sub(1).map(|i| self.pool[parent].children[i]);
        let right = self.pool[parent].children.get(pos + 1).copied();

        if let Some(left) = left
            && self.pool[left].entries.len() > min_entries
        {
            self.steal_from_left(parent, pos, node, left);
            return None;
        }
        if let Some(right) = right
            && self.pool[right].entries.len() > min_entries
        {
            self.steal_from_right(parent, pos, node, right);
            return None;
        }

        match (left, right) {
            (Some(left), _) => self.merge_with_left(parent, pos, node, left),
            (None, Some(right)) => self.merge_into_right(parent, pos, node, right),
            (None, None) => panic!("underfull node {} has no siblings", node.index()),
        }
        Some(parent)
    }

    /// If the root is an internal node without entries, promotes its only
    /// child to be the new root.
    fn collapse_root(&mut self) {
        let root = &self.pool[self.root];
        if !root.entries.is_empty() || root.is_leaf() {
            return;
        }
        debug_assert_eq!(root.children.len(), 1);
        let child = root.children[0];
        self.pool.free_node(self.root);
        self.pool[child].parent = None;
        self.root = child;
        self.height -= 1;
        trace!(
            target: "arbor_btree::merge",
            height = self.height,
            "collapsed root node"
        );
    }

    /// Rotates the last entry of `left` up into the parent and the parent's
    /// separator down to the front of `node`, together with the last child of
    /// `left`.
    fn steal_from_left(&mut self, parent: NodeRef, pos: usize, node: NodeRef, left: NodeRef) {
        let up = self.pool[left]
            .entries
            .pop()
            .expect("sibling with spare entries is not empty");
        let down = mem::replace(&mut self.pool[parent].entries[pos - 1], up);
        self.pool[node].entries.insert(0, down);
        if let Some(child) = self.pool[left].children.pop() {
            self.pool[node].children.insert(0, child);
            self.pool[child].parent = Some(node);
        }
        trace!(
            target: "arbor_btree::steal",
            node = node.index(),
            direction = "left",
            "stole entry from sibling"
        );
        self.debug_check_node(node);
    }

    /// Mirror of [`Self::steal_from_left`]: takes the first entry and child
    /// of `right`.
    fn steal_from_right(&mut self, parent: NodeRef, pos: usize, node: NodeRef, right: NodeRef) {
        let up = self.pool[right].entries.remove(0);
        let down = mem::replace(&mut self.pool[parent].entries[pos], up);
        self.pool[node].entries.push(down);
        if !self.pool[right].is_leaf() {
            let child = self.pool[right].children.remove(0);
            self.pool[node].children.push(child);
            self.pool[child].parent = Some(node);
        }
        trace!(
            target: "arbor_btree::steal",
            node = node.index(),
            direction = "right",
            "stole entry from sibling"
        );
        self.debug_check_node(node);
    }

    /// Absorbs `left` and the separator before `node` into `node`, then frees
    /// `left`.
    fn merge_with_left(&mut self, parent: NodeRef, pos: usize, node: NodeRef, left: NodeRef) {
        let separator = self.pool[parent].entries.remove(pos - 1);
        self.pool[parent].children.remove(pos - 1);

        let mut sibling = self.pool.free_node(left);
        let adopted = sibling.children.len();
        let this = &mut self.pool[node];
        sibling.entries.push(separator);
        sibling.entries.append(&mut this.entries);
        sibling.children.append(&mut this.children);
        mem::swap(&mut this.entries, &mut sibling.entries);
        mem::swap(&mut this.children, &mut sibling.children);

        // Only the children that came from `left` need a new parent.
        for i in 0..adopted {
            let child = self.pool[node].children[i];
            self.pool[child].parent = Some(node);
        }
        trace!(
            target: "arbor_btree::merge",
            survivor = node.index(),
            removed = left.index(),
            direction = "left",
            "merged node with sibling"
        );
        self.debug_check_node(node);
    }

    /// Moves `node` and the separator after it to the front of `right`, then
    /// frees `node`.
    fn merge_into_right(&mut self, parent: NodeRef, pos: usize, node: NodeRef, right: NodeRef) {
        let separator = self.pool[parent].entries.remove(pos);
        self.pool[parent].children.remove(pos);

        let mut absorbed = self.pool.free_node(node);
        let adopted = absorbed.children.len();
        let sibling = &mut self.pool[right];
        absorbed.entries.push(separator);
        absorbed.entries.append(&mut sibling.entries);
        absorbed.children.append(&mut sibling.children);
        mem::swap(&mut sibling.entries, &mut absorbed.entries);
        mem::swap(&mut sibling.children, &mut absorbed.children);

        for i in 0..adopted {
            let child = self.pool[right].children[i];
            self.pool[child].parent = Some(right);
        }
        trace!(
            target: "arbor_btree::merge",
            survivor = right.index(),
            removed = node.index(),
            direction = "right",
            "merged node with sibling"
        );
        self.debug_check_node(right);
    }
}

cfg_if::cfg_if! {
    if #[cfg(debug_assertions)] {
        impl<T, C: Comparator<T>, A: Allocator + Clone> BTree<T, C, A> {
            /// Checks the occupancy and link invariants of a single non-root
            /// node after it was reshaped.
            fn debug_check_node(&self, node: NodeRef) {
                let this = &self.pool[node];
                let len = this.entries.len();
                debug_assert!(len <= self.order.max_entries());
                if this.parent.is_some() {
                    debug_assert!(len >= self.order.min_entries());
                }
                debug_assert!(this.is_leaf() || this.children.len() == len + 1);
                debug_assert!(
                    this.entries
                        .windows(2)
                        .all(|w| self.cmp.compare(&w[0], &w[1]).is_lt())
                );
                for &child in this.children.iter() {
                    debug_assert_eq!(self.pool[child].parent, Some(node));
                }
            }
        }
    } else {
        impl<T, C: Comparator<T>, A: Allocator + Clone> BTree<T, C, A> {
            #[inline(always)]
            fn debug_check_node(&self, _node: NodeRef) {}
        }
    }
}
