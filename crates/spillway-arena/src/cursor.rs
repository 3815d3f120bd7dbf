//! Sequential read access to a filled block.
//!
//! Two ways to walk a block's records in insertion order:
//!
//! - [`KeyValueCursor`]: explicit `has_next` / `advance` cursor with
//!   accessors for the entry under it. Its `has_next` stops one entry
//!   short of the end (it compares against `valid - 1`), so a loop of the
//!   form `while cursor.has_next() { cursor.advance(); read }` visits
//!   entries `1..valid`, and reading before the first advance visits
//!   entry 0. Downstream sort/spill code written against that shape
//!   relies on the boundary as it is.
//! - [`Records`]: a standard [`Iterator`] over every valid entry.
//!
//! Both borrow the block, so no record can be appended while a scan is
//! in progress.

use std::iter::FusedIterator;

use crate::block::MemoryBlock;
use crate::index::RecordRef;

/// Forward-only cursor over a non-empty block.
///
/// Obtained from [`MemoryBlock::cursor`], which returns `None` for an
/// empty block. Not restartable; take a new cursor to rescan.
#[derive(Debug)]
pub struct KeyValueCursor<'a> {
    block: &'a MemoryBlock,
    current_read_pos: usize,
}

impl<'a> KeyValueCursor<'a> {
    /// Whether `current_read_pos < valid - 1`.
    pub fn has_next(&self) -> bool {
        self.current_read_pos + 1 < self.block.valid()
    }

    /// Move to the next entry.
    pub fn advance(&mut self) {
        self.current_read_pos += 1;
    }

    /// Index of the entry under the cursor.
    pub fn current_read_pos(&self) -> usize {
        self.current_read_pos
    }

    /// Absolute key offset of the current entry.
    ///
    /// # Panics
    ///
    /// Panics if the cursor was advanced past the last entry.
    pub fn current_offset(&self) -> u32 {
        self.block.offsets()[self.current_read_pos]
    }

    /// Key length of the current entry.
    ///
    /// # Panics
    ///
    /// Panics if the cursor was advanced past the last entry.
    pub fn current_key_len(&self) -> u32 {
        self.block.key_lens()[self.current_read_pos]
    }

    /// Value length of the current entry.
    ///
    /// # Panics
    ///
    /// Panics if the cursor was advanced past the last entry.
    pub fn current_value_len(&self) -> u32 {
        self.block.value_lens()[self.current_read_pos]
    }

    /// The current entry, or `None` past the end.
    pub fn current(&self) -> Option<RecordRef> {
        self.block.record(self.current_read_pos)
    }

    /// The block being scanned.
    pub fn block(&self) -> &'a MemoryBlock {
        self.block
    }
}

/// Iterator over all valid entries of a block, in insertion order.
#[derive(Clone, Debug)]
pub struct Records<'a> {
    block: &'a MemoryBlock,
    next: usize,
}

impl Iterator for Records<'_> {
    type Item = RecordRef;

    fn next(&mut self) -> Option<RecordRef> {
        let r = self.block.record(self.next)?;
        self.next += 1;
        Some(r)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.block.valid().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Records<'_> {}

impl FusedIterator for Records<'_> {}

impl MemoryBlock {
    /// A cursor positioned on the first entry, or `None` if the block is empty.
    pub fn cursor(&self) -> Option<KeyValueCursor<'_>> {
        if self.valid() == 0 {
            return None;
        }
        Some(KeyValueCursor {
            block: self,
            current_read_pos: 0,
        })
    }

    /// Iterate over every valid entry.
    pub fn records(&self) -> Records<'_> {
        Records {
            block: self,
            next: 0,
        }
    }
}
