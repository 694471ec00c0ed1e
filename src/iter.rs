use alloc::{collections::VecDeque, vec::Vec};
use core::iter::FusedIterator;

use allocator_api2::alloc::{Allocator, Global};

use crate::{BTree, Comparator, IterError, Natural, node::NodePool, node::NodeRef};

/// An iterator over the elements of a [`BTree`], in ascending order.
pub struct Iter<'a, T, A: Allocator + Clone = Global> {
    pool: &'a NodePool<T, A>,

    /// Path from the root to the node holding the next element.
    ///
    /// Each level records the index of the next entry to yield from that node.
    /// For internal nodes, the child before that entry has already been
    /// visited.
    stack: Vec<(NodeRef, usize)>,

    remaining: usize,
}

impl<'a, T, A: Allocator + Clone> Iter<'a, T, A> {
    /// Pushes the leftmost path starting at `node`.
    #[inline]
    fn descend(&mut self, mut node: NodeRef) {
        loop {
            self.stack.push((node, 0));
            match self.pool[node].children.first() {
                Some(&child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a, T, A: Allocator + Clone> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let pool = self.pool;
        while let Some((node, pos)) = self.stack.last_mut() {
            let node = &pool[*node];
            if *pos < node.entries.len() {
                let entry = &node.entries[*pos];
                *pos += 1;
                if let Some(&child) = node.children.get(*pos) {
                    self.descend(child);
                }
                self.remaining -= 1;
                return Some(entry);
            }
            self.stack.pop();
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, A: Allocator + Clone> ExactSizeIterator for Iter<'a, T, A> {}

impl<'a, T, A: Allocator + Clone> FusedIterator for Iter<'a, T, A> {}

impl<'a, T, A: Allocator + Clone> Clone for Iter<'a, T, A> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

/// An owned copy of the elements of a [`BTree`], taken in ascending order.
///
/// The snapshot is computed once and does not observe later changes to the
/// tree.
///
/// This type is returned by [`BTree::snapshot`].
#[derive(Clone, Debug)]
pub struct Snapshot<T> {
    queue: VecDeque<T>,
}

impl<T> Iterator for Snapshot<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), Some(self.queue.len()))
    }
}

impl<T> ExactSizeIterator for Snapshot<T> {}

impl<T> FusedIterator for Snapshot<T> {}

/// An iterator over a snapshot of a [`BTree`] that can remove the element it
/// last yielded from the tree.
///
/// Elements are yielded from a [`Snapshot`] taken when the iterator was
/// created. [`SnapshotIter::remove`] deletes the current element through
/// [`BTree::remove`], so the tree rebalances as usual while the remaining
/// queued elements stay valid.
///
/// This type is returned by [`BTree::snapshot_iter`].
pub struct SnapshotIter<'a, T, C = Natural, A: Allocator + Clone = Global> {
    snapshot: Snapshot<T>,
    current: Option<T>,
    btree: &'a mut BTree<T, C, A>,
}

impl<'a, T: Clone, C: Comparator<T>, A: Allocator + Clone> SnapshotIter<'a, T, C, A> {
    /// Advances to the next element, making it the current element.
    ///
    /// Returns [`IterError::Exhausted`] once every element has been yielded.
    #[inline]
    pub fn try_next(&mut self) -> Result<T, IterError> {
        let value = self.snapshot.next().ok_or(IterError::Exhausted)?;
        self.current = Some(value.clone());
        Ok(value)
    }

    /// Returns `true` if there are elements left to yield.
    #[inline]
    pub fn has_next(&self) -> bool {
        !self.snapshot.queue.is_empty()
    }

    /// Returns the element most recently yielded, unless it was removed.
    #[inline]
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Removes the current element from the tree and returns the element
    /// that was stored there.
    ///
    /// Returns [`IterError::NoCurrent`] if nothing has been yielded yet or if
    /// the current element was already removed.
    pub fn remove(&mut self) -> Result<T, IterError> {
        let current = self.current.take().ok_or(IterError::NoCurrent)?;
        Ok(self
            .btree
            .remove(&current)
            .expect("snapshot element is missing from the tree"))
    }

    /// Returns the tree being iterated over.
    #[inline]
    pub fn tree(&self) -> &BTree<T, C, A> {
        self.btree
    }
}

impl<'a, T: Clone, C: Comparator<T>, A: Allocator + Clone> Iterator for SnapshotIter<'a, T, C, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.snapshot.size_hint()
    }
}

impl<'a, T: Clone, C: Comparator<T>, A: Allocator + Clone> ExactSizeIterator
    for SnapshotIter<'a, T, C, A>
{
}

impl<'a, T: Clone, C: Comparator<T>, A: Allocator + Clone> FusedIterator
    for SnapshotIter<'a, T, C, A>
{
}

impl<T, C, A: Allocator + Clone> BTree<T, C, A> {
    /// Gets an iterator over the elements of the set, in ascending order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, A> {
        let mut iter = Iter {
            pool: &self.pool,
            stack: Vec::with_capacity(self.height + 1),
            remaining: self.len,
        };
        iter.descend(self.root);
        iter
    }

    /// Appends the elements under `node` to `out` in ascending order.
    fn collect_in_order(&self, node: NodeRef, out: &mut VecDeque<T>)
    where
        T: Clone,
    {
        let node = &self.pool[node];
        if node.is_leaf() {
            out.extend(node.entries.iter().cloned());
            return;
        }
        for (child, entry) in node.children.iter().zip(node.entries.iter()) {
            self.collect_in_order(*child, out);
            out.push_back(entry.clone());
        }
        if let Some(&last) = node.children.last() {
            self.collect_in_order(last, out);
        }
    }

    /// Copies the elements of the set, in ascending order, into a
    /// [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot<T>
    where
        T: Clone,
    {
        let mut queue = VecDeque::with_capacity(self.len);
        self.collect_in_order(self.root, &mut queue);
        Snapshot { queue }
    }
}

impl<T: Clone, C: Comparator<T>, A: Allocator + Clone> BTree<T, C, A> {
    /// Gets an iterator over a snapshot of the set that can remove the
    /// element it last yielded.
    ///
    /// Elements inserted while iterating are not yielded.
    #[inline]
    pub fn snapshot_iter(&mut self) -> SnapshotIter<'_, T, C, A> {
        SnapshotIter {
            snapshot: self.snapshot(),
            current: None,
            btree: self,
        }
    }
}

impl<'a, T, C, A: Allocator + Clone> IntoIterator for &'a BTree<T, C, A> {
    type Item = &'a T;

    type IntoIter = Iter<'a, T, A>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
