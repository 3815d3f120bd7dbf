//! Block pool configuration parameters.

use crate::error::ArenaError;

/// Configuration for a [`BlockPool`](crate::BlockPool).
///
/// Controls the shared buffer size, record-index growth policy and the
/// index memory budget. Validated at pool construction; immutable after.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Requested shared buffer size in bytes.
    ///
    /// Rounded up to a multiple of `min_block_size` at pool creation.
    /// Must not exceed [`PoolConfig::MAX_CAPACITY`] after rounding.
    pub capacity: usize,

    /// Granularity of the shared buffer in bytes.
    ///
    /// Default: 32 KiB.
    pub min_block_size: u32,

    /// Record-index capacity given to each newly allocated block.
    ///
    /// Default: 1024 records (12 KiB of index memory per block).
    pub initial_record_capacity: usize,

    /// Lower bound for any suggested index capacity.
    pub min_record_capacity: usize,

    /// Multiplier applied to the current capacity when an index fills.
    ///
    /// Must be at least 2 so that growth stays amortised O(1) per append.
    pub growth_factor: usize,

    /// Index memory (in bytes) above which the pool reports backpressure.
    ///
    /// `None` disables the budget.
    pub index_memory_budget: Option<usize>,
}

impl PoolConfig {
    /// Default buffer granularity: 32 KiB.
    pub const DEFAULT_MIN_BLOCK_SIZE: u32 = 32 * 1024;

    /// Default per-block record-index capacity.
    pub const DEFAULT_INITIAL_RECORD_CAPACITY: usize = 1024;

    /// Default lower bound on suggested capacities.
    pub const DEFAULT_MIN_RECORD_CAPACITY: usize = 16;

    /// Default index growth factor.
    pub const DEFAULT_GROWTH_FACTOR: usize = 2;

    /// Largest shared buffer a pool will allocate: 3 GiB.
    ///
    /// Offsets are stored in 4-byte index slots, so every byte of the
    /// buffer must stay addressable by a `u32`.
    pub const MAX_CAPACITY: usize = 3 << 30;

    /// Create a config for a buffer of `capacity` bytes.
    ///
    /// Uses default values for all other parameters.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            min_block_size: Self::DEFAULT_MIN_BLOCK_SIZE,
            initial_record_capacity: Self::DEFAULT_INITIAL_RECORD_CAPACITY,
            min_record_capacity: Self::DEFAULT_MIN_RECORD_CAPACITY,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            index_memory_budget: None,
        }
    }

    /// Buffer capacity rounded up to a multiple of `min_block_size`.
    ///
    /// Returns `None` on arithmetic overflow or a zero granularity.
    pub fn rounded_capacity(&self) -> Option<usize> {
        let unit = self.min_block_size as usize;
        if unit == 0 {
            return None;
        }
        self.capacity.div_ceil(unit).checked_mul(unit)
    }

    /// Check the configuration for values the pool cannot honour.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.min_block_size == 0 {
            return Err(invalid("min_block_size must be non-zero"));
        }
        if self.growth_factor < 2 {
            return Err(invalid(format!(
                "growth_factor must be at least 2, got {}",
                self.growth_factor
            )));
        }
        match self.rounded_capacity() {
            Some(cap) if cap <= Self::MAX_CAPACITY => Ok(()),
            Some(cap) => Err(invalid(format!(
                "capacity {cap} exceeds maximum {}",
                Self::MAX_CAPACITY
            ))),
            None => Err(invalid("capacity overflows when rounded")),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(64 * 1024 * 1024)
    }
}

fn invalid(reason: impl Into<String>) -> ArenaError {
    ArenaError::InvalidConfig {
        reason: reason.into(),
    }
}
