//! The coordinator contract consumed by every block.
//!
//! A [`Coordinator`] owns the policy side of the allocator: how large a
//! record index grows, how much index memory is in use across all blocks,
//! and what happens to a block once it stops producing records. Blocks
//! receive one as an injected `Arc<dyn Coordinator>` at construction.

use crate::block::MemoryBlock;

/// Capacity-growth policy, index-memory accounting and finish handling.
///
/// Methods take `&self`; implementations shared between blocks use
/// interior mutability. All calls are synchronous and must not call back
/// into the block that invoked them.
pub trait Coordinator: Send + Sync {
    /// New record-index capacity for an index that is full at `current`.
    ///
    /// Should be strictly greater than `current` and grow geometrically.
    /// Blocks raise a non-growing suggestion to `current + 1`.
    fn suggest_new_capacity(&self, current: usize) -> usize;

    /// Adjust accounted index memory by `delta_bytes`.
    ///
    /// Positive when a block claims index arrays, negative on release.
    fn account_index_memory(&self, delta_bytes: i64);

    /// A block has finished producing records.
    fn on_block_finished(&self, block: &MemoryBlock);
}
