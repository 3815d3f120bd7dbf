//! Arena-specific error types.

use spillway_core::{BlockId, SerializeError};
use thiserror::Error;

use crate::block::BlockRange;

/// Errors that can occur during block and pool operations.
///
/// A failed lend is not an error: [`MemoryBlock::shrink_from_end`]
/// returns `None` because running out of tail capacity is expected.
///
/// [`MemoryBlock::shrink_from_end`]: crate::MemoryBlock::shrink_from_end
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Negative (or slot-overflowing) start or size at block construction.
    #[error("invalid block range: start {start}, size {size}")]
    InvalidArgument {
        /// Requested start offset.
        start: i64,
        /// Requested size.
        size: i64,
    },
    /// A copy would write past the physical buffer or the block's range.
    #[error("buffer overflow: requested {requested} bytes, {available} bytes available")]
    BufferOverflow {
        /// Bytes the key and value need together.
        requested: usize,
        /// Bytes available from the write position.
        available: usize,
    },
    /// The pool has no room left for another block of the requested size.
    #[error("pool exhausted: requested {requested} bytes, {available} bytes available")]
    PoolExhausted {
        /// Requested block size in bytes.
        requested: usize,
        /// Unallocated bytes left in the pool.
        available: usize,
    },
    /// A returned child is not the range most recently lent.
    ///
    /// Returns must mirror lends in LIFO order so the reclaimed range is
    /// always adjacent to the parent's current end.
    #[error("non-contiguous child return: expected {expected}, found {found}")]
    NonContiguousReturn {
        /// The most recently lent range.
        expected: BlockRange,
        /// The returned child's range.
        found: BlockRange,
    },
    /// A child was returned to a block with nothing currently lent.
    #[error("block {block} has no outstanding loan to reclaim")]
    NoOutstandingLoan {
        /// The block the child was returned to.
        block: BlockId,
    },
    /// A child was returned to a block other than the one it was lent from.
    #[error("child of block {parent} returned to block {returned_to}")]
    ForeignChild {
        /// The block the child was lent from.
        parent: BlockId,
        /// The block it was returned to.
        returned_to: BlockId,
    },
    /// A returned child still has children of its own outstanding.
    #[error("block {block} still has {outstanding} outstanding children")]
    OutstandingLoans {
        /// The child being returned.
        block: BlockId,
        /// Its outstanding child count.
        outstanding: u32,
    },
    /// Pool configuration rejected by validation.
    #[error("invalid pool config: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
    /// A record could not be serialized before collection.
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}
