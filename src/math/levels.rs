//! Node index arithmetic for complete 2^d-ary trees.
//!
//! Nodes are numbered breadth first across the whole tree: the root is 0,
//! its `factor` children follow, then their children, and so on. A depth
//! therefore owns the contiguous index range
//! `[calc_level_index(d), calc_level_index(d + 1))`.
//!
//! Everything here is exact integer math. Depth inversion uses the bit
//! length of the index rather than a floating point logarithm, so it stays
//! correct at any magnitude.

use num_integer::Integer;
use num_traits::One;

use crate::core::Id;

/// Branching factor for a tree of the given dimensionality (4 or 8).
#[inline]
pub fn factor(dimensions: u64) -> u64 {
    1 << dimensions
}

/// `2^(exp * base_log2)`, i.e. `factor^exp` when `base_log2` is the
/// dimensionality.
pub fn binary_pow(base_log2: u64, exp: u64) -> Id {
    Id::one() << (exp * base_log2)
}

/// Number of nodes in all depths shallower than `depth`, which is also the
/// index of the first node at `depth`.
pub fn calc_level_index(dimensions: u64, depth: u64) -> Id {
    (binary_pow(dimensions, depth) - 1u32) / (factor(dimensions) - 1)
}

/// Number of nodes at exactly `depth`.
pub fn points_at_depth(dimensions: u64, depth: u64) -> Id {
    binary_pow(dimensions, depth)
}

/// Depth of the node at `index` in a tree with branching factor `factor`.
///
/// Inverts `calc_level_index`: the result is the largest `d` with
/// `calc_level_index(d) <= index`. Since
/// `index * (factor - 1) + 1` lies in `[factor^d, factor^(d + 1))`, the
/// depth is its floored base-2 logarithm divided by the dimensionality.
pub fn calc_depth(factor: u64, index: &Id) -> u64 {
    debug_assert!(factor == 4 || factor == 8);
    let dimensions = u64::from(factor.trailing_zeros());
    let scaled: Id = index * (factor - 1) + 1u32;
    (scaled.bits() - 1) / dimensions
}

/// Floored `log_n(val)` for `n` of 4 or 8. Zero maps to zero.
pub fn log_n(val: u64, n: u64) -> u64 {
    debug_assert!(n == 4 || n == 8);
    if val == 0 {
        return 0;
    }
    u64::from(val.ilog2()) / u64::from(n.trailing_zeros())
}

/// Smallest `d` with `n^d >= val`.
pub fn ceil_log_n(val: u64, n: u64) -> u64 {
    if val <= 1 {
        return 0;
    }
    let floor = log_n(val, n);
    if is_perfect_log_n(val, n) { floor } else { floor + 1 }
}

/// True if `val` is `n^k` for some integer `k >= 0`.
pub fn is_perfect_log_n(val: u64, n: u64) -> bool {
    val.is_power_of_two() && val.trailing_zeros() % n.trailing_zeros() == 0
}

/// Quotient and remainder of `num / den`.
#[inline]
pub fn div_mod(num: &Id, den: &Id) -> (Id, Id) {
    num.div_rem(den)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_index_values() {
        let octree: Vec<Id> = (0..5).map(|d| calc_level_index(3, d)).collect();
        assert_eq!(octree, [0u32, 1, 9, 73, 585].map(Id::from));

        let quadtree: Vec<Id> = (0..5).map(|d| calc_level_index(2, d)).collect();
        assert_eq!(quadtree, [0u32, 1, 5, 21, 85].map(Id::from));
    }

    #[test]
    fn test_level_span_is_points_at_depth() {
        for dimensions in [2, 3] {
            for depth in 0..120 {
                let span = calc_level_index(dimensions, depth + 1)
                    - calc_level_index(dimensions, depth);
                assert_eq!(span, points_at_depth(dimensions, depth), "depth {}", depth);
            }
        }
    }

    #[test]
    fn test_depth_inversion_at_boundaries() {
        for dimensions in [2, 3] {
            let f = factor(dimensions);
            for depth in 0..200 {
                let begin = calc_level_index(dimensions, depth);
                let last = calc_level_index(dimensions, depth + 1) - 1u32;
                assert_eq!(calc_depth(f, &begin), depth, "begin of depth {}", depth);
                assert_eq!(calc_depth(f, &last), depth, "end of depth {}", depth);
            }
        }
    }

    #[test]
    fn test_depth_small_indices() {
        assert_eq!(calc_depth(8, &Id::from(0u32)), 0);
        assert_eq!(calc_depth(8, &Id::from(1u32)), 1);
        assert_eq!(calc_depth(8, &Id::from(8u32)), 1);
        assert_eq!(calc_depth(8, &Id::from(9u32)), 2);
        assert_eq!(calc_depth(4, &Id::from(4u32)), 1);
        assert_eq!(calc_depth(4, &Id::from(5u32)), 2);
    }

    #[test]
    fn test_binary_pow() {
        assert_eq!(binary_pow(3, 2), Id::from(64u32));
        assert_eq!(binary_pow(2, 3), Id::from(64u32));
        assert_eq!(binary_pow(3, 0), Id::from(1u32));
        assert_eq!(binary_pow(3, 30).bits(), 91);
    }

    #[test]
    fn test_log_n() {
        assert_eq!(log_n(1, 8), 0);
        assert_eq!(log_n(64, 8), 2);
        assert_eq!(log_n(65, 8), 2);
        assert_eq!(log_n(511, 8), 2);
        assert_eq!(log_n(512, 8), 3);
        assert_eq!(log_n(256, 4), 4);
        assert_eq!(log_n(0, 4), 0);
    }

    #[test]
    fn test_ceil_log_n() {
        assert_eq!(ceil_log_n(0, 8), 0);
        assert_eq!(ceil_log_n(1, 8), 0);
        assert_eq!(ceil_log_n(8, 8), 1);
        assert_eq!(ceil_log_n(9, 8), 2);
        assert_eq!(ceil_log_n(1_000_000_000, 8), 10);
        assert_eq!(ceil_log_n(1_000_000, 4), 10);
    }

    #[test]
    fn test_is_perfect_log_n() {
        assert!(is_perfect_log_n(1, 8));
        assert!(is_perfect_log_n(64, 8));
        assert!(is_perfect_log_n(262144, 8));
        assert!(!is_perfect_log_n(32, 8));
        assert!(!is_perfect_log_n(0, 8));
        assert!(!is_perfect_log_n(100, 4));

        assert!(is_perfect_log_n(16, 4));
        assert!(is_perfect_log_n(64, 4));
        assert!(!is_perfect_log_n(8, 4));
    }

    #[test]
    fn test_div_mod() {
        let (q, r) = div_mod(&Id::from(100u32), &Id::from(64u32));
        assert_eq!(q, Id::from(1u32));
        assert_eq!(r, Id::from(36u32));
    }
}
