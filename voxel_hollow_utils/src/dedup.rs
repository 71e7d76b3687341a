// Order-preserving deduplication.
//
// An edit reports every fine voxel it changed, which can be thousands of
// coordinates that collapse onto a handful of coarse boxes. These helpers
// keep the first occurrence of each key and drop the rest, so the caller's
// output order depends only on its input order (never on hash iteration
// order).
//
// Small inputs use a linear scan over the output vector, which beats hashing
// when there are only a few distinct keys. Larger inputs switch to a
// `hashbrown::HashSet` with `FxBuildHasher` for membership checks.

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;
use std::hash::Hash;

/// Below this many input items the linear scan is used instead of a set.
const LINEAR_SCAN_LIMIT: usize = 32;

/// Return the distinct elements of `items`, keeping first-seen order.
pub fn dedup_in_order<T: Copy + Eq + Hash>(items: &[T]) -> Vec<T> {
    if items.len() <= LINEAR_SCAN_LIMIT {
        let mut out: Vec<T> = Vec::with_capacity(items.len());
        for &item in items {
            if !out.contains(&item) {
                out.push(item);
            }
        }
        return out;
    }
    dedup_in_order_iter(items.iter().copied())
}

/// Iterator form of [`dedup_in_order`]; always uses the hash set.
pub fn dedup_in_order_iter<T, I>(items: I) -> Vec<T>
where
    T: Copy + Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen: HashSet<T, FxBuildHasher> = HashSet::with_hasher(FxBuildHasher);
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item) {
            out.push(item);
        }
    }
    out
}
