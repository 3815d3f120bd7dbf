//! Deterministic record fixtures.
//!
//! - [`kv`]: the `i`-th key/value pair of a stable sequence.
//! - [`records`]: the first `n` pairs.
//! - [`encoded_len`]: total bytes a set of pairs occupies in a block.

/// Key/value pair as owned bytes.
pub type Pair = (Vec<u8>, Vec<u8>);

/// The `i`-th pair: key `key-{i}` and a value of `i % 7` bytes of `i as u8`.
///
/// Empty values occur every seventh record, which keeps zero-length
/// handling covered in any multi-record test.
pub fn kv(i: usize) -> Pair {
    let key = format!("key-{i}").into_bytes();
    let value = vec![i as u8; i % 7];
    (key, value)
}

/// The first `n` pairs of the [`kv`] sequence.
pub fn records(n: usize) -> Vec<Pair> {
    (0..n).map(kv).collect()
}

/// Bytes `pairs` occupy once collected.
pub fn encoded_len(pairs: &[Pair]) -> usize {
    pairs.iter().map(|(k, v)| k.len() + v.len()).sum()
}
