//! Tree-shape arithmetic.
//!
//! The tree over `n` leaves is never materialized. It is the unique binary
//! tree obtained by splitting `[0, n)` at the largest power of two `k < n`
//! into `[0, k)` and `[k, n)`, recursively. Every function here is a pure
//! function of sizes and indices.

/// Largest power of two strictly less than `n`. Requires `n >= 2`.
pub fn split_point(n: u64) -> u64 {
    debug_assert!(n >= 2, "split_point requires at least two leaves");
    1 << (63 - (n - 1).leading_zeros())
}

/// Whether `[lo, hi)` is a complete subtree: power-of-two sized and aligned.
///
/// Every left child produced by the split rule is complete.
pub fn is_complete(lo: u64, hi: u64) -> bool {
    let width = hi - lo;
    width.is_power_of_two() && lo % width == 0
}

/// Height of a complete subtree of `width` leaves (`width` a power of two).
pub fn level_of(width: u64) -> u32 {
    width.trailing_zeros()
}

/// Number of hashes in an inclusion proof for `index` in a tree of `size`.
///
/// Requires `index < size`.
pub fn inclusion_proof_len(index: u64, size: u64) -> usize {
    let (mut lo, mut hi) = (0u64, size);
    let mut len = 0;
    while hi - lo > 1 {
        let k = split_point(hi - lo);
        if index < lo + k {
            hi = lo + k;
        } else {
            lo += k;
        }
        len += 1;
    }
    len
}

/// Number of hashes in a consistency proof between `size1` and `size2`.
///
/// Requires `size1 <= size2`. Trivial cases (`size1 == 0` or
/// `size1 == size2`) have empty proofs.
pub fn consistency_proof_len(size1: u64, size2: u64) -> usize {
    if size1 == 0 || size1 == size2 {
        return 0;
    }
    let (mut m, mut n) = (size1, size2);
    let mut whole_old_tree = true;
    let mut len = 0;
    while m != n {
        let k = split_point(n);
        if m <= k {
            n = k;
        } else {
            m -= k;
            n -= k;
            whole_old_tree = false;
        }
        len += 1;
    }
    if whole_old_tree {
        len
    } else {
        len + 1
    }
}
