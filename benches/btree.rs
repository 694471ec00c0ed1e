use std::{collections::BTreeSet, hint::black_box};

use arbor_btree::{BTree, Order};

fn main() {
    divan::main();
}

fn lens() -> impl Iterator<Item = u32> {
    (4..18).step_by(2).map(|i| 1 << i)
}

const ORDERS: [usize; 4] = [3, 8, 16, 64];

trait KeyGen: Default {
    fn gen_key(&mut self, len: u32) -> u32;
}

#[derive(Default)]
struct Seq(u32);
impl KeyGen for Seq {
    fn gen_key(&mut self, _len: u32) -> u32 {
        let key = self.0;
        self.0 += 1;
        key
    }
}

#[derive(Default)]
struct Rand(u32);
impl KeyGen for Rand {
    fn gen_key(&mut self, len: u32) -> u32 {
        let key = self.0;
        self.0 = self.0.wrapping_mul(1664525).wrapping_add(1013904223);
        key % len
    }
}

fn filled(max_children: usize, len: u32) -> BTree<u32> {
    let mut btree = BTree::with_order(Order::new(max_children).unwrap());
    btree.extend(0..len);
    btree
}

#[divan::bench(args = lens(), consts = ORDERS, types = [Seq, Rand])]
fn lookup_btree<K: KeyGen, const M: usize>(bencher: divan::Bencher, len: u32) {
    let btree = filled(M, len);
    bencher.bench_local(|| {
        let mut k = K::default();
        for _ in 0..len {
            let key = k.gen_key(len);
            black_box(btree.get(black_box(&key)));
        }
    });
}

#[divan::bench(args = lens(), types = [Seq, Rand])]
fn lookup_std<K: KeyGen>(bencher: divan::Bencher, len: u32) {
    let set: BTreeSet<u32> = (0..len).collect();
    bencher.bench_local(|| {
        let mut k = K::default();
        for _ in 0..len {
            let key = k.gen_key(len);
            black_box(set.get(black_box(&key)));
        }
    });
}

#[divan::bench(args = lens(), consts = ORDERS, types = [Seq, Rand])]
fn insert_btree<K: KeyGen, const M: usize>(bencher: divan::Bencher, len: u32) {
    bencher.bench_local(|| {
        let mut btree = BTree::with_order(Order::new(M).unwrap());
        let mut k = K::default();
        for _ in 0..len {
            btree.insert(k.gen_key(len));
        }
        btree
    });
}

#[divan::bench(args = lens(), consts = ORDERS, types = [Seq, Rand])]
fn insert_btree_reuse<K: KeyGen, const M: usize>(bencher: divan::Bencher, len: u32) {
    let mut btree = BTree::with_order(Order::new(M).unwrap());
    bencher.bench_local(|| {
        btree.clear();
        let mut k = K::default();
        for _ in 0..len {
            btree.insert(k.gen_key(len));
        }
        divan::black_box(&btree);
    });
}

#[divan::bench(args = lens(), types = [Seq, Rand])]
fn insert_std<K: KeyGen>(bencher: divan::Bencher, len: u32) {
    bencher.bench_local(|| {
        let mut set = BTreeSet::new();
        let mut k = K::default();
        for _ in 0..len {
            set.insert(k.gen_key(len));
        }
        set
    });
}

#[divan::bench(args = lens(), consts = ORDERS, types = [Seq, Rand])]
fn remove_btree<K: KeyGen, const M: usize>(bencher: divan::Bencher, len: u32) {
    bencher
        .with_inputs(|| filled(M, len))
        .bench_local_values(|mut btree| {
            let mut k = K::default();
            for _ in 0..len {
                black_box(btree.remove(&k.gen_key(len)));
            }
            btree
        });
}

#[divan::bench(args = lens(), types = [Seq, Rand])]
fn remove_std<K: KeyGen>(bencher: divan::Bencher, len: u32) {
    bencher
        .with_inputs(|| (0..len).collect::<BTreeSet<u32>>())
        .bench_local_values(|mut set| {
            let mut k = K::default();
            for _ in 0..len {
                black_box(set.take(&k.gen_key(len)));
            }
            set
        });
}

#[divan::bench(args = lens(), consts = ORDERS)]
fn iter_btree<const M: usize>(bencher: divan::Bencher, len: u32) {
    let btree = filled(M, len);
    bencher.bench_local(|| {
        for v in &btree {
            divan::black_box(v);
        }
    });
}

#[divan::bench(args = lens())]
fn iter_std(bencher: divan::Bencher, len: u32) {
    let set: BTreeSet<u32> = (0..len).collect();
    bencher.bench_local(|| {
        for v in &set {
            divan::black_box(v);
        }
    });
}

#[divan::bench(args = lens(), consts = ORDERS)]
fn snapshot_drain_btree<const M: usize>(bencher: divan::Bencher, len: u32) {
    bencher
        .with_inputs(|| filled(M, len))
        .bench_local_values(|mut btree| {
            let mut iter = btree.snapshot_iter();
            while iter.next().is_some() {
                divan::black_box(iter.remove().ok());
            }
            drop(iter);
            btree
        });
}
