//! Bucket-count arithmetic: hash constraining and the growth policy.

/// Reduces a full hash into `[0, buckets)`.
///
/// Power-of-two bucket counts use a mask. Other counts skip the division when
/// the hash already fits, which is common for small integer keys hashed by an
/// identity-like hasher. `buckets` must be non-zero.
#[inline]
pub(crate) fn constrain(hash: u64, buckets: usize) -> usize {
    debug_assert!(buckets > 0, "constrain called without buckets");
    let n = buckets as u64;
    if buckets.is_power_of_two() {
        (hash & (n - 1)) as usize
    } else if hash < n {
        hash as usize
    } else {
        (hash % n) as usize
    }
}

/// True for element counts that are already a power of two above 2; growth
/// then doubles exactly instead of doubling plus one.
#[inline]
pub(crate) fn is_hash_pow2(n: usize) -> bool {
    n > 2 && n.is_power_of_two()
}

/// Whether `buckets` can hold `len` elements at `max_load_factor`.
#[inline]
pub(crate) fn fits(buckets: usize, max_load_factor: f32, len: usize) -> bool {
    buckets as f64 * max_load_factor as f64 >= len as f64
}

/// Smallest bucket count that holds `len` elements at `max_load_factor`.
/// Saturates at `usize::MAX` for absurdly small load factors; the index
/// allocation then reports the failure.
pub(crate) fn min_buckets(len: usize, max_load_factor: f32) -> usize {
    let n = (len as f64 / max_load_factor as f64).ceil() as usize;
    if fits(n, max_load_factor, len) {
        n
    } else {
        n.saturating_add(1)
    }
}

/// Bucket count to grow to when `len` elements are stored and one more is
/// about to be inserted.
pub(crate) fn grown(len: usize, max_load_factor: f32) -> usize {
    let doubled = len
        .saturating_mul(2)
        .saturating_add(usize::from(!is_hash_pow2(len)));
    doubled.max(min_buckets(len.saturating_add(1), max_load_factor))
}
