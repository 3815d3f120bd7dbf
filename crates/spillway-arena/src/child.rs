//! Child blocks carved from a parent's unused tail.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use spillway_core::BlockId;
use thiserror::Error;

use crate::block::{checked_range, MemoryBlock};
use crate::coordinator::Coordinator;
use crate::error::ArenaError;

/// A [`MemoryBlock`] whose range was lent by another block.
///
/// Behaves exactly like a normal block (it dereferences to one) and
/// additionally remembers which block lent it, so the range can only be
/// credited back to that parent through [`MemoryBlock::return_child`].
pub struct ChildMemoryBlock {
    parent: BlockId,
    block: MemoryBlock,
}

impl ChildMemoryBlock {
    /// Build a child over a range obtained from
    /// [`MemoryBlock::shrink_from_end`] on the block identified by `parent`.
    ///
    /// `start_offset` must be the value `shrink_from_end` returned and
    /// `size` the amount it was asked to detach; the parent rejects any
    /// other range when the child comes back.
    pub fn new(
        parent: BlockId,
        start_offset: i64,
        size: i64,
        coordinator: Arc<dyn Coordinator>,
        initial_capacity: usize,
    ) -> Result<Self, ArenaError> {
        let range = checked_range(start_offset, size)?;
        Ok(Self::from_block(
            parent,
            MemoryBlock::from_range(range, coordinator, initial_capacity),
        ))
    }

    pub(crate) fn from_block(parent: BlockId, block: MemoryBlock) -> Self {
        Self { parent, block }
    }

    /// The block this range was lent from.
    pub fn parent(&self) -> BlockId {
        self.parent
    }

    /// The underlying block.
    pub fn as_block(&self) -> &MemoryBlock {
        &self.block
    }
}

impl Deref for ChildMemoryBlock {
    type Target = MemoryBlock;

    fn deref(&self) -> &MemoryBlock {
        &self.block
    }
}

impl DerefMut for ChildMemoryBlock {
    fn deref_mut(&mut self) -> &mut MemoryBlock {
        &mut self.block
    }
}

impl fmt::Debug for ChildMemoryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildMemoryBlock")
            .field("parent", &self.parent)
            .field("block", &self.block)
            .finish()
    }
}

/// A child the parent refused to take back, with the reason.
///
/// The child is handed back unchanged so its range is not lost; the
/// parent's size and lend stack are untouched.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ReturnRejected {
    error: ArenaError,
    child: ChildMemoryBlock,
}

impl ReturnRejected {
    pub(crate) fn new(error: ArenaError, child: ChildMemoryBlock) -> Self {
        Self { error, child }
    }

    /// Why the return was rejected.
    pub fn error(&self) -> &ArenaError {
        &self.error
    }

    /// Take the child back.
    pub fn into_child(self) -> ChildMemoryBlock {
        self.child
    }

    /// Split into the reason and the child.
    pub fn into_parts(self) -> (ArenaError, ChildMemoryBlock) {
        (self.error, self.child)
    }
}

impl From<ReturnRejected> for ArenaError {
    fn from(rejected: ReturnRejected) -> Self {
        rejected.error
    }
}
