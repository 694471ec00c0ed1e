//! Branching factor configuration.

use crate::InvalidOrder;

/// Branching factor of a [`BTree`](crate::BTree).
///
/// An order of `m` allows each node at most `m` children and `m - 1` entries.
/// Every node except the root holds at least `ceil(m / 2) - 1` entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Order {
    max_children: usize,
}

impl Order {
    /// Smallest supported number of children per node.
    pub const MIN_CHILDREN: usize = 3;

    /// Number of children per node used by [`Order::default`].
    pub const DEFAULT_CHILDREN: usize = 16;

    /// Creates an order allowing up to `max_children` children per node.
    ///
    /// Returns an error if `max_children` is less than
    /// [`Order::MIN_CHILDREN`]: a lower branching factor cannot keep two
    /// siblings around for every underfull node.
    #[inline]
    pub const fn new(max_children: usize) -> Result<Self, InvalidOrder> {
        if max_children < Self::MIN_CHILDREN {
            return Err(InvalidOrder { max_children });
        }
        Ok(Self { max_children })
    }

    /// Maximum number of children of an internal node.
    #[inline]
    pub const fn max_children(self) -> usize {
        self.max_children
    }

    /// Minimum number of children of a non-root internal node.
    #[inline]
    pub const fn min_children(self) -> usize {
        self.max_children.div_ceil(2)
    }

    /// Maximum number of entries in any node.
    #[inline]
    pub const fn max_entries(self) -> usize {
        self.max_children - 1
    }

    /// Minimum number of entries in a non-root node.
    #[inline]
    pub const fn min_entries(self) -> usize {
        self.min_children() - 1
    }

    /// Index of the entry that moves up when a node holding `max_children`
    /// entries is split.
    ///
    /// The left half keeps `floor(m / 2)` entries and the right half
    /// `ceil(m / 2) - 1`, so both halves respect `min_entries`.
    #[inline]
    pub(crate) const fn split_point(self) -> usize {
        self.max_children / 2
    }
}

impl Default for Order {
    #[inline]
    fn default() -> Self {
        Self {
            max_children: Self::DEFAULT_CHILDREN,
        }
    }
}

impl TryFrom<usize> for Order {
    type Error = InvalidOrder;

    #[inline]
    fn try_from(max_children: usize) -> Result<Self, Self::Error> {
        Self::new(max_children)
    }
}
