use core::cmp::Ordering;

/// Total order used to arrange the elements of a [`BTree`](crate::BTree).
///
/// Every search, split and rebalance goes through [`Comparator::compare`].
/// Two elements comparing as [`Ordering::Equal`] are considered the same
/// element: inserting one replaces the other.
///
/// This is implemented for [`Natural`] and for any
/// `Fn(&T, &T) -> Ordering` closure.
pub trait Comparator<T: ?Sized> {
    /// Compares two elements.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Orders elements by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<T: Ord + ?Sized> Comparator<T> for Natural {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T: ?Sized, F: Fn(&T, &T) -> Ordering> Comparator<T> for F {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}
