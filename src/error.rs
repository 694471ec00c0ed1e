use thiserror::Error;

/// Error returned when a branching factor is too small to build a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("a B-Tree needs at least 3 children per node, got {max_children}")]
pub struct InvalidOrder {
    /// The rejected number of children.
    pub max_children: usize,
}

/// Misuse of a [`SnapshotIter`](crate::SnapshotIter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum IterError {
    /// There are no more elements to yield.
    #[error("iteration is exhausted")]
    Exhausted,

    /// `remove` was called before `next`, or twice for the same element.
    #[error("no current element: remove() must follow a call to next()")]
    NoCurrent,
}
