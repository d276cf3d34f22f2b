//! Bit-width arithmetic shared by the ports, fabrics and the planner.

/// All-ones mask covering the low `bits` bits of a `u32`.
pub const fn mask(bits: u32) -> u32 {
    if bits >= u32::BITS {
        u32::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Number of bits needed to represent `n`, `0` for `0`.
pub const fn bit_length(n: u64) -> u32 {
    u64::BITS - n.leading_zeros()
}

/// Number of index bits needed to tell `n` things apart.
pub const fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        bit_length(n - 1)
    }
}

/// Reduce `items` with `op` as a balanced binary tree rather than a linear fold.
///
/// For an associative `op` the result equals the fold, but the depth of nested applications is
/// `ceil(log2(len))`, which is what bounds the propagation delay of the equivalent logic.
/// Returns `None` for an empty slice.
pub fn tree_reduce<T, F>(items: &[T], op: &F) -> Option<T>
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    match items.len() {
        0 => None,
        1 => Some(items[0]),
        n => {
            let (left, right) = items.split_at(n / 2);
            Some(op(tree_reduce(left, op)?, tree_reduce(right, op)?))
        }
    }
}
