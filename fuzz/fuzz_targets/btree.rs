#![no_main]

use std::{cmp::Ordering, collections::BTreeSet, fmt::Debug};

use arbitrary::{Arbitrary, Result, Unstructured};
use arbor_btree::{BTree, Comparator, IterError, Order};
use libfuzzer_sys::fuzz_target;

/// Element compared by `key` only, so replacement of equal elements can be
/// observed through `tag`.
#[derive(Debug, Copy, Clone, Arbitrary)]
struct Tagged<Key> {
    key: Key,
    tag: u8,
}

#[derive(Clone, Copy, Default)]
struct ByKey;

impl<Key: Ord> Comparator<Tagged<Key>> for ByKey {
    fn compare(&self, a: &Tagged<Key>, b: &Tagged<Key>) -> Ordering {
        a.key.cmp(&b.key)
    }
}

/// Branching factor between 3 and 66.
#[derive(Debug)]
struct MaxChildren(usize);

impl<'a> Arbitrary<'a> for MaxChildren {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        Ok(MaxChildren(u.int_in_range(3..=66)?))
    }
}

#[derive(Arbitrary, Debug)]
enum Action<Key> {
    Clear,
    Insert(Tagged<Key>),
    Get(Key),
    Remove(Key),
    Smallest,
    Largest,
    SnapshotIter(Vec<IterAction>),
}

#[derive(Arbitrary, Debug)]
enum IterAction {
    Next,
    Remove,
}

#[derive(Arbitrary, Debug)]
enum KeyType {
    U8(MaxChildren, Vec<Action<u8>>),
    U16(MaxChildren, Vec<Action<u16>>),
    I32(MaxChildren, Vec<Action<i32>>),
    U64(MaxChildren, Vec<Action<u64>>),
}

fn probe<Key: Copy>(key: Key) -> Tagged<Key> {
    Tagged { key, tag: 0 }
}

fn run<Key: Ord + Copy + Debug>(max_children: MaxChildren, actions: Vec<Action<Key>>) {
    let order = Order::new(max_children.0).unwrap();
    let mut btree: BTree<Tagged<Key>, ByKey> = BTree::with_comparator(order, ByKey);
    let mut vec: Vec<(Key, u8)> = vec![];
    for action in actions {
        match action {
            Action::Clear => {
                btree.clear();
                vec.clear();
            }
            Action::Insert(value) => {
                let old = btree.replace(value);
                let index = vec.partition_point(|&(k, _t)| k < value.key);
                if index != vec.len() && vec[index].0 == value.key {
                    assert_eq!(old.map(|t| t.tag), Some(vec[index].1));
                    vec[index].1 = value.tag;
                } else {
                    assert!(old.is_none());
                    vec.insert(index, (value.key, value.tag));
                }
            }
            Action::Get(key) => {
                let value = btree.get(&probe(key)).map(|t| (t.key, t.tag));
                let index = vec.partition_point(|&(k, _t)| k < key);
                if index != vec.len() && vec[index].0 == key {
                    assert_eq!(value, Some(vec[index]));
                } else {
                    assert_eq!(value, None);
                }
            }
            Action::Remove(key) => {
                let value = btree.remove(&probe(key)).map(|t| (t.key, t.tag));
                let index = vec.partition_point(|&(k, _t)| k < key);
                if index != vec.len() && vec[index].0 == key {
                    assert_eq!(value, Some(vec.remove(index)));
                } else {
                    assert_eq!(value, None);
                }
            }
            Action::Smallest => {
                assert_eq!(btree.smallest().map(|t| (t.key, t.tag)), vec.first().copied());
            }
            Action::Largest => {
                assert_eq!(btree.largest().map(|t| (t.key, t.tag)), vec.last().copied());
            }
            Action::SnapshotIter(actions) => {
                let mut iter = btree.snapshot_iter();
                let mut expected: Vec<_> = vec.clone();
                let mut index = 0;
                let mut current = None;
                for action in actions {
                    match action {
                        IterAction::Next => match iter.try_next() {
                            Ok(value) => {
                                assert_eq!((value.key, value.tag), vec[index]);
                                current = Some(value.key);
                                index += 1;
                            }
                            Err(err) => {
                                assert_eq!(err, IterError::Exhausted);
                                assert_eq!(index, vec.len());
                            }
                        },
                        IterAction::Remove => match current.take() {
                            Some(key) => {
                                let removed = iter.remove().unwrap();
                                assert_eq!(removed.key, key);
                                expected.retain(|&(k, _t)| k != key);
                            }
                            None => assert_eq!(iter.remove().unwrap_err(), IterError::NoCurrent),
                        },
                    }
                    assert_eq!(iter.tree().len(), expected.len());
                }
                drop(iter);
                vec = expected;
            }
        }

        assert_eq!(vec.len(), btree.len());
        assert_eq!(vec.is_empty(), btree.is_empty());
        if btree.is_empty() {
            assert_eq!(btree.height(), 0);
        }
        let btree_entries: Vec<_> = btree.iter().map(|t| (t.key, t.tag)).collect();
        assert_eq!(vec, btree_entries);
    }

    // Tearing the tree down one element at a time must leave it empty.
    let keys: BTreeSet<Key> = vec.iter().map(|&(k, _t)| k).collect();
    for key in keys {
        assert!(btree.remove(&probe(key)).is_some());
    }
    assert!(btree.is_empty());
    assert_eq!(btree.height(), 0);
}

fuzz_target!(|actions: KeyType| {
    match actions {
        KeyType::U8(m, actions) => run(m, actions),
        KeyType::U16(m, actions) => run(m, actions),
        KeyType::I32(m, actions) => run(m, actions),
        KeyType::U64(m, actions) => run(m, actions),
    }
});
