//! In-crate fake coordinator for unit tests.

use std::sync::Mutex;

use spillway_core::BlockId;

use crate::block::MemoryBlock;
use crate::coordinator::Coordinator;

/// Records every accounting delta and finished block.
pub(crate) struct FakeCoordinator {
    /// `None` doubles (with a floor of 2); `Some(n)` always suggests `n`.
    fixed: Option<usize>,
    deltas: Mutex<Vec<i64>>,
    finished: Mutex<Vec<BlockId>>,
}

impl FakeCoordinator {
    pub(crate) fn doubling() -> Self {
        Self::with_policy(None)
    }

    pub(crate) fn fixed(capacity: usize) -> Self {
        Self::with_policy(Some(capacity))
    }

    fn with_policy(fixed: Option<usize>) -> Self {
        Self {
            fixed,
            deltas: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn deltas(&self) -> Vec<i64> {
        self.deltas.lock().unwrap().clone()
    }

    pub(crate) fn index_memory(&self) -> i64 {
        self.deltas.lock().unwrap().iter().sum()
    }

    pub(crate) fn finished(&self) -> Vec<BlockId> {
        self.finished.lock().unwrap().clone()
    }
}

impl Coordinator for FakeCoordinator {
    fn suggest_new_capacity(&self, current: usize) -> usize {
        self.fixed.unwrap_or_else(|| (current * 2).max(2))
    }

    fn account_index_memory(&self, delta_bytes: i64) {
        self.deltas.lock().unwrap().push(delta_bytes);
    }

    fn on_block_finished(&self, block: &MemoryBlock) {
        self.finished.lock().unwrap().push(block.id());
    }
}
