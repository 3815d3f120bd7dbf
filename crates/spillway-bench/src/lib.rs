//! Benchmark profiles and utilities for the Spillway sort buffer.
//!
//! Provides pre-built [`PoolConfig`] profiles and record workloads for
//! benchmarks:
//!
//! - [`reference_profile`]: 64 MiB buffer with default growth policy
//! - [`small_record_profile`]: 8 MiB buffer tuned for many tiny records
//! - [`record_workload`]: deterministic key/value lengths via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use spillway_arena::PoolConfig;

/// Build a reference benchmark profile: 64 MiB shared buffer.
///
/// Default 32 KiB granularity, 1024-record initial index, doubling growth.
pub fn reference_profile() -> PoolConfig {
    PoolConfig::new(64 * 1024 * 1024)
}

/// Build a small-record profile: 8 MiB buffer with a tiny initial index.
///
/// Starts every block at 16 records so index growth shows up in the
/// measurement.
pub fn small_record_profile() -> PoolConfig {
    let mut config = PoolConfig::new(8 * 1024 * 1024);
    config.initial_record_capacity = 16;
    config
}

/// Generate a deterministic record workload.
///
/// Returns `n` key/value pairs whose key length lies in `8..=24` and value
/// length in `0..=max_value`, derived from a simple hash of `seed`.
pub fn record_workload(n: usize, max_value: usize, seed: u64) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut state = seed;
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };
    (0..n)
        .map(|i| {
            let key_len = 8 + next() % 17;
            let value_len = next() % (max_value + 1);
            (vec![i as u8; key_len], vec![!(i as u8); value_len])
        })
        .collect()
}
