//! The block pool: shared-buffer owner and default [`Coordinator`].
//!
//! [`BlockPool`] sizes the shared buffer, hands out block ranges from it
//! with a bump cursor, applies the geometric index-growth policy, keeps
//! the process-wide index-memory account, and collects finished blocks
//! for downstream sort/spill workers.
//!
//! ```text
//! BlockPool (Arc, shared by every block it created)
//! ├── allocated: bump cursor over [0, capacity)
//! ├── index_memory: signed running total of index bytes
//! ├── finished: BlockId → FinishedBlock (finish order)
//! └── finished channel ──► sort/spill worker
//!
//! SharedBuffer (returned alongside the pool, owned by the producer)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use indexmap::IndexMap;
use spillway_core::BlockId;
use tracing::{debug, info, warn};

use crate::block::{BlockRange, MemoryBlock};
use crate::buffer::SharedBuffer;
use crate::config::PoolConfig;
use crate::coordinator::Coordinator;
use crate::error::ArenaError;

/// Summary of a block at the moment it finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinishedBlock {
    /// The finished block.
    pub id: BlockId,
    /// Its absolute start offset.
    pub start_pos: u32,
    /// Its size when it finished.
    pub size: u32,
    /// Bytes of collected records.
    pub used: u32,
    /// Number of valid records.
    pub records: usize,
}

/// Point-in-time pool usage.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolStats {
    /// Shared buffer capacity in bytes.
    pub capacity: usize,
    /// Bytes handed out to blocks since the last reset.
    pub allocated: usize,
    /// Number of distinct blocks finished since the last reset.
    pub finished_blocks: usize,
    /// Bytes of records held by finished blocks.
    pub finished_used: usize,
    /// Records held by finished blocks.
    pub finished_records: usize,
    /// Current accounted index memory in bytes.
    pub index_memory: i64,
    /// Whether index memory is above the configured budget.
    pub over_budget: bool,
}

impl PoolStats {
    /// Fraction of allocated bytes holding records of finished blocks.
    pub fn utilisation(&self) -> f64 {
        if self.allocated == 0 {
            return 0.0;
        }
        self.finished_used as f64 / self.allocated as f64
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Capacity: {} Blocks: {} Used: {}/{} {:.3} Records: {} Index: {}",
            self.capacity,
            self.finished_blocks,
            self.finished_used,
            self.allocated,
            self.utilisation(),
            self.finished_records,
            self.index_memory,
        )
    }
}

/// Owner of the buffer layout and the default coordinator for its blocks.
///
/// Shared through `Arc`: every block allocated by the pool holds a
/// reference back to it for growth and accounting. All methods take
/// `&self`.
pub struct BlockPool {
    config: PoolConfig,
    capacity: usize,
    /// Bump cursor: bytes handed out since the last reset.
    allocated: AtomicUsize,
    index_memory: AtomicI64,
    over_budget: AtomicBool,
    finished: Mutex<IndexMap<BlockId, FinishedBlock>>,
    finished_tx: Sender<FinishedBlock>,
    finished_rx: Receiver<FinishedBlock>,
}

impl BlockPool {
    /// Validate `config` and allocate the shared buffer.
    ///
    /// The buffer capacity is `config.capacity` rounded up to a multiple
    /// of `config.min_block_size`.
    pub fn new(config: PoolConfig) -> Result<(Arc<Self>, SharedBuffer), ArenaError> {
        config.validate()?;
        let capacity = config
            .rounded_capacity()
            .ok_or_else(|| ArenaError::InvalidConfig {
                reason: "capacity overflows when rounded".into(),
            })?;
        info!(
            capacity_mib = capacity / 1024 / 1024,
            min_block_kib = config.min_block_size / 1024,
            "block pool created"
        );
        let (finished_tx, finished_rx) = crossbeam_channel::unbounded();
        let pool = Arc::new(Self {
            config,
            capacity,
            allocated: AtomicUsize::new(0),
            index_memory: AtomicI64::new(0),
            over_budget: AtomicBool::new(false),
            finished: Mutex::new(IndexMap::new()),
            finished_tx,
            finished_rx,
        });
        Ok((pool, SharedBuffer::new(capacity)))
    }

    /// Carve a new block of `size` bytes from the unallocated part of
    /// the buffer.
    ///
    /// The block's record index starts at `config.initial_record_capacity`.
    pub fn allocate_block(self: &Arc<Self>, size: u32) -> Result<MemoryBlock, ArenaError> {
        let requested = size as usize;
        let start = self
            .allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                cur.checked_add(requested).filter(|&end| end <= self.capacity)
            })
            .map_err(|cur| ArenaError::PoolExhausted {
                requested,
                available: self.capacity - cur,
            })?;
        // capacity <= MAX_CAPACITY < u32::MAX, so the range fits a slot.
        let range = BlockRange {
            start: start as u32,
            size,
        };
        debug!(%range, "block allocated");
        let coordinator: Arc<dyn Coordinator> = self.clone();
        Ok(MemoryBlock::from_range(
            range,
            coordinator,
            self.config.initial_record_capacity,
        ))
    }

    /// Shared buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes not yet handed out to a block.
    pub fn remaining(&self) -> usize {
        self.capacity - self.allocated.load(Ordering::Acquire)
    }

    /// The pool's configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Current accounted index memory in bytes.
    pub fn index_memory(&self) -> i64 {
        self.index_memory.load(Ordering::Acquire)
    }

    /// Whether index memory is above `config.index_memory_budget`.
    ///
    /// Producers should stop filling and let finished blocks drain.
    pub fn over_budget(&self) -> bool {
        self.over_budget.load(Ordering::Acquire)
    }

    /// Receiver of finished-block notifications, in finish order.
    pub fn finished_receiver(&self) -> Receiver<FinishedBlock> {
        self.finished_rx.clone()
    }

    /// Finished blocks since the last reset, in first-finish order.
    pub fn finished_blocks(&self) -> Vec<FinishedBlock> {
        self.lock_finished().values().copied().collect()
    }

    /// Rewind the bump cursor and forget finished blocks.
    ///
    /// Starts a new fill cycle over the same buffer. Blocks from the
    /// previous cycle must no longer be written. Finished notifications
    /// not yet received are discarded, since their ranges are about to be
    /// handed out again.
    pub fn reset(&self) {
        self.allocated.store(0, Ordering::Release);
        self.lock_finished().clear();
        let stale = self.finished_rx.try_iter().count();
        debug!(stale, "block pool reset");
    }

    /// Usage snapshot.
    pub fn stats(&self) -> PoolStats {
        let finished = self.lock_finished();
        PoolStats {
            capacity: self.capacity,
            allocated: self.allocated.load(Ordering::Acquire),
            finished_blocks: finished.len(),
            finished_used: finished.values().map(|b| b.used as usize).sum(),
            finished_records: finished.values().map(|b| b.records).sum(),
            index_memory: self.index_memory(),
            over_budget: self.over_budget(),
        }
    }

    fn lock_finished(&self) -> std::sync::MutexGuard<'_, IndexMap<BlockId, FinishedBlock>> {
        self.finished.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Coordinator for BlockPool {
    fn suggest_new_capacity(&self, current: usize) -> usize {
        current
            .saturating_mul(self.config.growth_factor)
            .max(current.saturating_add(1))
            .max(self.config.min_record_capacity)
    }

    fn account_index_memory(&self, delta_bytes: i64) {
        self.index_memory.fetch_add(delta_bytes, Ordering::AcqRel);
        let Some(budget) = self.config.index_memory_budget else {
            return;
        };
        // Concurrent updates may swap in opposite order; re-read until the
        // flag written matches the total it was derived from.
        loop {
            let now = self.index_memory.load(Ordering::Acquire);
            let over = now > budget as i64;
            if self.over_budget.swap(over, Ordering::AcqRel) != over && over {
                warn!(index_memory = now, budget, "index memory over budget");
            }
            if self.index_memory.load(Ordering::Acquire) == now {
                break;
            }
        }
    }

    fn on_block_finished(&self, block: &MemoryBlock) {
        let summary = FinishedBlock {
            id: block.id(),
            start_pos: block.start_pos(),
            size: block.size(),
            used: block.used(),
            records: block.valid(),
        };
        self.lock_finished().insert(summary.id, summary);
        // The pool holds a receiver, so the channel is never disconnected.
        let _ = self.finished_tx.send(summary);
    }
}

impl fmt::Debug for BlockPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
