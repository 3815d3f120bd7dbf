//! Test utilities and fake coordinators for Spillway development.
//!
//! Provides a [`RecordingCoordinator`] that implements
//! [`Coordinator`](spillway_arena::Coordinator) with a configurable growth
//! policy and records every callback, plus record [`fixtures`] and a
//! one-call [`init_tracing`] for tests that want log output.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Mutex, PoisonError};

use spillway_arena::{Coordinator, MemoryBlock};
use spillway_core::BlockId;

/// Growth policy for [`RecordingCoordinator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Growth {
    /// Multiply the current capacity by the factor, with a floor of 1.
    Factor(usize),
    /// Always suggest the same capacity.
    Fixed(usize),
}

/// Coordinator that records everything it is told.
///
/// Every `account_index_memory` delta and every finished block id is kept
/// in call order. Suggestions follow the configured [`Growth`].
pub struct RecordingCoordinator {
    growth: Growth,
    deltas: Mutex<Vec<i64>>,
    finished: Mutex<Vec<BlockId>>,
    suggestions: Mutex<Vec<usize>>,
}

impl RecordingCoordinator {
    pub fn new(growth: Growth) -> Self {
        Self {
            growth,
            deltas: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
            suggestions: Mutex::new(Vec::new()),
        }
    }

    /// Doubling growth.
    pub fn doubling() -> Self {
        Self::new(Growth::Factor(2))
    }

    /// Accounting deltas in call order.
    pub fn deltas(&self) -> Vec<i64> {
        lock(&self.deltas).clone()
    }

    /// Net index memory currently accounted.
    pub fn index_memory(&self) -> i64 {
        lock(&self.deltas).iter().sum()
    }

    /// Ids of finished blocks in call order.
    pub fn finished(&self) -> Vec<BlockId> {
        lock(&self.finished).clone()
    }

    /// `current` arguments passed to `suggest_new_capacity`.
    pub fn suggestions(&self) -> Vec<usize> {
        lock(&self.suggestions).clone()
    }
}

impl Default for RecordingCoordinator {
    fn default() -> Self {
        Self::doubling()
    }
}

impl Coordinator for RecordingCoordinator {
    fn suggest_new_capacity(&self, current: usize) -> usize {
        lock(&self.suggestions).push(current);
        match self.growth {
            Growth::Factor(f) => current.saturating_mul(f).max(1),
            Growth::Fixed(n) => n,
        }
    }

    fn account_index_memory(&self, delta_bytes: i64) {
        lock(&self.deltas).push(delta_bytes);
    }

    fn on_block_finished(&self, block: &MemoryBlock) {
        lock(&self.finished).push(block.id());
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Honours `RUST_LOG`, defaulting to `warn`. Safe to call from every test;
/// only the first call installs anything.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
