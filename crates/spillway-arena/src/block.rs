//! Memory blocks: independently filled regions of the shared buffer.
//!
//! A [`MemoryBlock`] owns a `[start_pos, start_pos + size)` view of the
//! [`SharedBuffer`], a bump cursor (`used`) into that view, and a
//! [`RecordIndex`] describing every key/value pair collected so far.
//!
//! # Lending
//!
//! A block can lend unused trailing capacity to a child block with
//! [`shrink_from_end`](MemoryBlock::shrink_from_end) (or the
//! [`lend`](MemoryBlock::lend) shorthand) and reclaim it with
//! [`return_child`](MemoryBlock::return_child):
//!
//! ```text
//! before lend:  [start ........ used | ............ free ............ )
//! after lend:   [start ........ used | .... free .... ) [ child range )
//!                                                   ^ start + size
//! ```
//!
//! Lends are only ever taken from the free tail, never from written
//! bytes. Each block keeps a stack of the ranges it has lent; a return is
//! accepted only for the range on top of that stack, which keeps
//! reclaimed ranges adjacent to the parent's end and disjoint from
//! everything else.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use spillway_core::layout::index_bytes;
use spillway_core::BlockId;
use tracing::{debug, warn};

use crate::buffer::SharedBuffer;
use crate::child::{ChildMemoryBlock, ReturnRejected};
use crate::coordinator::Coordinator;
use crate::error::ArenaError;
use crate::index::{RecordIndex, RecordIndexMut, RecordRef};

/// A `(start, size)` byte range of the shared buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockRange {
    /// Absolute offset of the first byte.
    pub start: u32,
    /// Length in bytes.
    pub size: u32,
}

impl BlockRange {
    /// Absolute offset one past the last byte.
    pub fn end(&self) -> u32 {
        self.start + self.size
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// An owned region of the shared buffer plus its record index.
///
/// Filled by exactly one producer through `&mut self`; read through
/// [`cursor`](MemoryBlock::cursor) or [`records`](MemoryBlock::records)
/// once filling is done. Dropping a block releases its index memory with
/// the coordinator. The byte range itself outlives the block object and
/// is recycled by whoever handed it out.
pub struct MemoryBlock {
    id: BlockId,
    /// Absolute offset into the shared buffer. Fixed for the block's lifetime.
    start_pos: u32,
    /// Current extent; shrinks on lend, grows on reclaim.
    size: u32,
    /// Bytes of `[start_pos, start_pos + size)` holding collected records.
    used: u32,
    index: RecordIndex,
    /// Ranges lent to children and not yet returned, oldest first.
    lent: SmallVec<[BlockRange; 2]>,
    coordinator: Arc<dyn Coordinator>,
}

impl MemoryBlock {
    /// Create a block over `[start_offset, start_offset + allocate_size)`.
    ///
    /// Fails with [`ArenaError::InvalidArgument`] if either value is
    /// negative or the range does not fit a 4-byte offset slot. Claims
    /// `initial_capacity * 12` bytes of index memory from `coordinator`.
    pub fn new(
        start_offset: i64,
        allocate_size: i64,
        coordinator: Arc<dyn Coordinator>,
        initial_capacity: usize,
    ) -> Result<Self, ArenaError> {
        let range = checked_range(start_offset, allocate_size)?;
        Ok(Self::from_range(range, coordinator, initial_capacity))
    }

    /// Create a block over a range already known to be valid.
    pub(crate) fn from_range(
        range: BlockRange,
        coordinator: Arc<dyn Coordinator>,
        initial_capacity: usize,
    ) -> Self {
        coordinator.account_index_memory(index_bytes(initial_capacity) as i64);
        Self {
            id: BlockId::next(),
            start_pos: range.start,
            size: range.size,
            used: 0,
            index: RecordIndex::with_capacity(initial_capacity),
            lent: SmallVec::new(),
            coordinator,
        }
    }

    /// Record an entry for bytes already present at `start_pos + internal_offset`.
    ///
    /// Grows the index (through the coordinator's policy) as soon as it
    /// becomes full, so the next append always has a free slot.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the record does not lie inside
    /// `[0, size)`. [`collect_key_value`](Self::collect_key_value) always
    /// satisfies this; direct callers must.
    pub fn append_record(&mut self, internal_offset: u32, key_len: u32, val_len: u32) {
        debug_assert!(
            internal_offset as u64 + key_len as u64 + val_len as u64 <= self.size as u64,
            "record at {internal_offset} (+{key_len}+{val_len}) outside block of size {}",
            self.size
        );
        if self.index.is_full() {
            // Only reachable with a zero initial capacity.
            self.enlarge_capacity();
        }
        self.index
            .push(self.start_pos + internal_offset, key_len, val_len);
        if self.index.is_full() {
            self.enlarge_capacity();
        }
    }

    fn enlarge_capacity(&mut self) {
        let old = self.index.capacity();
        let suggested = self.coordinator.suggest_new_capacity(old);
        let new = if suggested > old {
            suggested
        } else {
            warn!(
                block = %self.id,
                current = old,
                suggested,
                "coordinator suggested a non-growing index capacity; growing by one"
            );
            old + 1
        };
        self.coordinator
            .account_index_memory(-(index_bytes(old) as i64));
        self.index.grow_to(new);
        self.coordinator
            .account_index_memory(index_bytes(new) as i64);
        debug!(block = %self.id, old, new, "record index grown");
    }

    /// Copy `key` then `value` into the buffer at `start_pos + used` and
    /// record them.
    ///
    /// Fails with [`ArenaError::BufferOverflow`] if the pair would run past
    /// the physical end of `buffer` or past this block's own end. Nothing
    /// is written or recorded on failure.
    pub fn collect_key_value(
        &mut self,
        buffer: &mut SharedBuffer,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), ArenaError> {
        let write_pos = self.start_pos as usize + self.used as usize;
        let requested = key.len() + value.len();
        let available = buffer
            .available_from(write_pos)
            .min(self.left() as usize);
        if requested > available {
            return Err(ArenaError::BufferOverflow {
                requested,
                available,
            });
        }

        buffer.copy_in(write_pos, key);
        buffer.copy_in(write_pos + key.len(), value);

        // requested <= left() <= u32::MAX, so both lengths fit.
        let key_len = key.len() as u32;
        let val_len = value.len() as u32;
        let old_used = self.used;
        self.used += key_len + val_len;
        self.append_record(old_used, key_len, val_len);
        Ok(())
    }

    /// Remaining data-region capacity: `size - used`.
    pub fn left(&self) -> u32 {
        self.size - self.used
    }

    /// Detach `shrink_size` bytes from the unused tail.
    ///
    /// Returns the absolute start of the detached range (the new
    /// `start_pos + size`), or `None` without changing anything if fewer
    /// than `shrink_size` bytes are unused. The caller builds a
    /// [`ChildMemoryBlock`] over the returned range.
    pub fn shrink_from_end(&mut self, shrink_size: u32) -> Option<u32> {
        if self.left() < shrink_size {
            return None;
        }
        self.size -= shrink_size;
        let start = self.start_pos + self.size;
        self.lent.push(BlockRange {
            start,
            size: shrink_size,
        });
        debug!(block = %self.id, start, size = shrink_size, "tail lent");
        Some(start)
    }

    /// Lend `shrink_size` tail bytes as a new child block.
    ///
    /// Shorthand for [`shrink_from_end`](Self::shrink_from_end) followed by
    /// child construction. The child shares this block's coordinator.
    pub fn lend(&mut self, shrink_size: u32, initial_capacity: usize) -> Option<ChildMemoryBlock> {
        let start = self.shrink_from_end(shrink_size)?;
        let block = MemoryBlock::from_range(
            BlockRange {
                start,
                size: shrink_size,
            },
            Arc::clone(&self.coordinator),
            initial_capacity,
        );
        Some(ChildMemoryBlock::from_block(self.id, block))
    }

    /// Reabsorb a child's range into this block's tail.
    ///
    /// The child must have been lent by this block, must be the most
    /// recent outstanding lend, and must have no children of its own.
    /// On success the child is consumed and its index memory released.
    /// On rejection nothing changes and the child is handed back.
    pub fn return_child(&mut self, child: ChildMemoryBlock) -> Result<(), ReturnRejected> {
        if let Err(error) = self.check_return(&child) {
            return Err(ReturnRejected::new(error, child));
        }
        let returned = child.range();
        self.lent.pop();
        self.size += returned.size;
        debug!(
            block = %self.id,
            child = %child.id(),
            start = returned.start,
            size = returned.size,
            "child returned"
        );
        Ok(())
    }

    fn check_return(&self, child: &ChildMemoryBlock) -> Result<(), ArenaError> {
        if child.parent() != self.id {
            return Err(ArenaError::ForeignChild {
                parent: child.parent(),
                returned_to: self.id,
            });
        }
        if child.child_num() > 0 {
            return Err(ArenaError::OutstandingLoans {
                block: child.id(),
                outstanding: child.child_num(),
            });
        }
        let found = child.range();
        match self.lent.last() {
            Some(&expected) if expected == found => Ok(()),
            Some(&expected) => Err(ArenaError::NonContiguousReturn { expected, found }),
            None => Err(ArenaError::NoOutstandingLoan { block: self.id }),
        }
    }

    /// Forget all collected records so the range and index can be refilled.
    ///
    /// Size, outstanding lends and index capacity are unchanged.
    pub fn reset(&mut self) {
        self.used = 0;
        self.index.clear();
    }

    /// Tell the coordinator this block is done producing records.
    ///
    /// Further appends are a contract violation but are not prevented.
    pub fn finish(&self) {
        debug!(
            block = %self.id,
            used = self.used,
            records = self.index.len(),
            "block finished"
        );
        self.coordinator.on_block_finished(self);
    }

    /// Unique identity of this block.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Absolute offset of the block's first byte.
    pub fn start_pos(&self) -> u32 {
        self.start_pos
    }

    /// Current size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The block's current `(start, size)` range.
    pub fn range(&self) -> BlockRange {
        BlockRange {
            start: self.start_pos,
            size: self.size,
        }
    }

    /// Bytes occupied by collected records.
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Number of valid records.
    pub fn valid(&self) -> usize {
        self.index.len()
    }

    /// Number of children lent and not yet returned.
    pub fn child_num(&self) -> u32 {
        self.lent.len() as u32
    }

    /// Ranges currently lent, oldest first.
    pub fn lent_ranges(&self) -> &[BlockRange] {
        &self.lent
    }

    /// Allocated record-index capacity.
    pub fn index_capacity(&self) -> usize {
        self.index.capacity()
    }

    /// The record index.
    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    /// Absolute key offsets of the valid records.
    pub fn offsets(&self) -> &[u32] {
        self.index.offsets()
    }

    /// Key lengths of the valid records.
    pub fn key_lens(&self) -> &[u32] {
        self.index.key_lens()
    }

    /// Value lengths of the valid records.
    pub fn value_lens(&self) -> &[u32] {
        self.index.value_lens()
    }

    /// Mutable view of the index arrays for in-place sorting.
    pub fn index_mut(&mut self) -> RecordIndexMut<'_> {
        self.index.view_mut()
    }

    /// Index entry `i`, if valid.
    pub fn record(&self, i: usize) -> Option<RecordRef> {
        self.index.get(i)
    }

    /// Key bytes of record `i`, resolved against `buffer`.
    pub fn key_bytes<'b>(&self, buffer: &'b SharedBuffer, i: usize) -> Option<&'b [u8]> {
        let r = self.record(i)?;
        Some(buffer.slice(r.offset, r.key_len))
    }

    /// Value bytes of record `i`, resolved against `buffer`.
    pub fn value_bytes<'b>(&self, buffer: &'b SharedBuffer, i: usize) -> Option<&'b [u8]> {
        let r = self.record(i)?;
        Some(buffer.slice(r.value_offset(), r.value_len))
    }
}

impl Drop for MemoryBlock {
    fn drop(&mut self) {
        self.coordinator
            .account_index_memory(-(index_bytes(self.index.capacity()) as i64));
    }
}

impl fmt::Debug for MemoryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBlock")
            .field("id", &self.id)
            .field("start_pos", &self.start_pos)
            .field("size", &self.size)
            .field("used", &self.used)
            .field("valid", &self.index.len())
            .field("index_capacity", &self.index.capacity())
            .field("lent", &self.lent)
            .finish_non_exhaustive()
    }
}

/// Validate a signed `(start, size)` pair as a slot-addressable range.
pub(crate) fn checked_range(start: i64, size: i64) -> Result<BlockRange, ArenaError> {
    let invalid = ArenaError::InvalidArgument { start, size };
    if start < 0 || size < 0 {
        return Err(invalid);
    }
    let start_u = u32::try_from(start).map_err(|_| invalid.clone())?;
    let size_u = u32::try_from(size).map_err(|_| invalid.clone())?;
    if start_u.checked_add(size_u).is_none() {
        return Err(invalid);
    }
    Ok(BlockRange {
        start: start_u,
        size: size_u,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCoordinator;

    fn block(start: i64, size: i64, cap: usize) -> (MemoryBlock, Arc<FakeCoordinator>) {
        let coord = Arc::new(FakeCoordinator::doubling());
        let b = MemoryBlock::new(start, size, coord.clone(), cap).unwrap();
        (b, coord)
    }

    #[test]
    fn new_block_is_empty() {
        let (b, _) = block(16, 100, 4);
        assert_eq!(b.left(), 100);
        assert_eq!(b.used(), 0);
        assert_eq!(b.valid(), 0);
        assert_eq!(b.child_num(), 0);
        assert_eq!(b.start_pos(), 16);
        assert_eq!(b.size(), 100);
    }

    #[test]
    fn negative_start_or_size_rejected() {
        let coord: Arc<dyn Coordinator> = Arc::new(FakeCoordinator::doubling());
        assert_eq!(
            MemoryBlock::new(-1, 10, coord.clone(), 4).unwrap_err(),
            ArenaError::InvalidArgument { start: -1, size: 10 }
        );
        assert!(matches!(
            MemoryBlock::new(0, -5, coord, 4),
            Err(ArenaError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn range_past_slot_width_rejected() {
        let coord: Arc<dyn Coordinator> = Arc::new(FakeCoordinator::doubling());
        assert!(MemoryBlock::new(u32::MAX as i64, 1, coord.clone(), 1).is_err());
        assert!(MemoryBlock::new(0, u32::MAX as i64 + 1, coord, 1).is_err());
    }

    #[test]
    fn construction_accounts_twelve_bytes_per_record() {
        let (_b, coord) = block(0, 10, 8);
        assert_eq!(coord.index_memory(), 8 * 12);
    }

    #[test]
    fn drop_releases_index_memory() {
        let (b, coord) = block(0, 10, 8);
        drop(b);
        assert_eq!(coord.index_memory(), 0);
    }

    #[test]
    fn two_records_pack_back_to_back() {
        let mut buf = SharedBuffer::new(256);
        let (mut b, _) = block(20, 100, 4);
        b.collect_key_value(&mut buf, b"abc", b"defgh").unwrap();
        assert_eq!(b.used(), 8);
        assert_eq!(b.valid(), 1);
        assert_eq!(b.offsets()[0], 20);

        b.collect_key_value(&mut buf, b"ij", b"kl").unwrap();
        assert_eq!(b.used(), 12);
        assert_eq!(b.offsets()[1], 28);
        assert_eq!(b.left(), 88);

        assert_eq!(b.key_bytes(&buf, 0), Some(&b"abc"[..]));
        assert_eq!(b.value_bytes(&buf, 0), Some(&b"defgh"[..]));
        assert_eq!(b.key_bytes(&buf, 1), Some(&b"ij"[..]));
        assert_eq!(b.value_bytes(&buf, 1), Some(&b"kl"[..]));
        assert_eq!(buf.slice(20, 12), b"abcdefghijkl");
    }

    #[test]
    fn zero_length_key_and_value_are_recorded() {
        let mut buf = SharedBuffer::new(16);
        let (mut b, _) = block(0, 16, 4);
        b.collect_key_value(&mut buf, b"", b"").unwrap();
        b.collect_key_value(&mut buf, b"k", b"").unwrap();
        b.collect_key_value(&mut buf, b"", b"v").unwrap();
        assert_eq!(b.valid(), 3);
        assert_eq!(b.used(), 2);
        assert_eq!(b.offsets(), &[0, 0, 1]);
        assert_eq!(b.key_lens(), &[0, 1, 0]);
        assert_eq!(b.value_lens(), &[0, 0, 1]);
    }

    #[test]
    fn physical_overflow_rejected_without_side_effects() {
        let mut buf = SharedBuffer::new(10);
        // Logical size is larger than the physical buffer.
        let (mut b, _) = block(4, 100, 4);
        let err = b.collect_key_value(&mut buf, b"abcd", b"efg").unwrap_err();
        assert_eq!(
            err,
            ArenaError::BufferOverflow {
                requested: 7,
                available: 6
            }
        );
        assert_eq!(b.used(), 0);
        assert_eq!(b.valid(), 0);
        assert!(buf.as_bytes().iter().all(|&x| x == 0));
    }

    #[test]
    fn logical_overflow_rejected() {
        let mut buf = SharedBuffer::new(1024);
        let (mut b, _) = block(0, 8, 4);
        b.collect_key_value(&mut buf, b"abc", b"de").unwrap();
        let err = b.collect_key_value(&mut buf, b"fg", b"hi").unwrap_err();
        assert_eq!(
            err,
            ArenaError::BufferOverflow {
                requested: 4,
                available: 3
            }
        );
        assert_eq!(b.used(), 5);
        assert_eq!(b.valid(), 1);
    }

    #[test]
    fn exact_fit_succeeds() {
        let mut buf = SharedBuffer::new(8);
        let (mut b, _) = block(0, 8, 4);
        b.collect_key_value(&mut buf, b"abcd", b"efgh").unwrap();
        assert_eq!(b.left(), 0);
    }

    #[test]
    fn growth_uses_coordinator_suggestion() {
        let mut buf = SharedBuffer::new(64);
        let (mut b, coord) = block(0, 64, 2);
        b.collect_key_value(&mut buf, b"a", b"1").unwrap();
        assert_eq!(b.index_capacity(), 2);
        // Second append fills the index and triggers growth.
        b.collect_key_value(&mut buf, b"b", b"2").unwrap();
        assert_eq!(b.index_capacity(), 4);
        b.collect_key_value(&mut buf, b"c", b"3").unwrap();
        assert_eq!(b.index_capacity(), 4);
        assert_eq!(b.offsets(), &[0, 2, 4]);
        assert_eq!(b.key_lens(), &[1, 1, 1]);
        assert_eq!(b.value_lens(), &[1, 1, 1]);
        assert_eq!(coord.deltas(), vec![24, -24, 48]);
        assert_eq!(coord.index_memory(), 48);
    }

    #[test]
    fn non_growing_suggestion_is_raised_by_one() {
        let coord = Arc::new(FakeCoordinator::fixed(1));
        let mut b = MemoryBlock::new(0, 100, coord.clone(), 1).unwrap();
        // Initial capacity 1 fills on the first append.
        b.append_record(0, 1, 1);
        assert_eq!(b.index_capacity(), 2);
        b.append_record(2, 1, 1);
        assert_eq!(b.index_capacity(), 3);
        assert_eq!(b.valid(), 2);
    }

    #[test]
    fn zero_initial_capacity_grows_before_first_write() {
        let (mut b, _) = block(0, 10, 0);
        b.append_record(0, 2, 3);
        assert_eq!(b.valid(), 1);
        assert!(b.index_capacity() > 1);
        assert_eq!(b.record(0), Some(RecordRef { offset: 0, key_len: 2, value_len: 3 }));
    }

    #[test]
    fn append_record_offsets_are_absolute() {
        let (mut b, _) = block(1000, 50, 4);
        b.append_record(7, 1, 2);
        assert_eq!(b.offsets(), &[1007]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside block")]
    fn append_record_past_block_end_panics() {
        let (mut b, _) = block(1000, 50, 4);
        b.append_record(u32::MAX - 10, 1, 1);
    }

    #[test]
    fn append_record_up_to_block_end_is_accepted() {
        let (mut b, _) = block(1000, 50, 4);
        b.append_record(48, 1, 1);
        assert_eq!(b.offsets(), &[1048]);
    }

    #[test]
    fn shrink_beyond_left_fails_without_mutation() {
        let (mut b, _) = block(0, 10, 4);
        assert_eq!(b.shrink_from_end(20), None);
        assert_eq!(b.size(), 10);
        assert_eq!(b.child_num(), 0);
    }

    #[test]
    fn shrink_cannot_take_written_bytes() {
        let mut buf = SharedBuffer::new(16);
        let (mut b, _) = block(0, 10, 4);
        b.collect_key_value(&mut buf, b"abc", b"def").unwrap();
        assert_eq!(b.shrink_from_end(5), None);
        assert_eq!(b.shrink_from_end(4), Some(6));
        assert_eq!(b.left(), 0);
    }

    #[test]
    fn shrink_returns_new_end() {
        let (mut b, _) = block(100, 50, 4);
        assert_eq!(b.shrink_from_end(20), Some(130));
        assert_eq!(b.size(), 30);
        assert_eq!(b.child_num(), 1);
        assert_eq!(b.lent_ranges(), &[BlockRange { start: 130, size: 20 }]);
    }

    #[test]
    fn lend_and_return_round_trip() {
        let (mut parent, coord) = block(0, 100, 4);
        let child = parent.lend(40, 2).unwrap();
        assert_eq!(child.start_pos(), 60);
        assert_eq!(child.size(), 40);
        assert_eq!(child.parent(), parent.id());
        assert_eq!(parent.size(), 60);
        assert_eq!(parent.child_num(), 1);
        assert_eq!(coord.index_memory(), (4 + 2) * 12);

        parent.return_child(child).unwrap();
        assert_eq!(parent.size(), 100);
        assert_eq!(parent.child_num(), 0);
        assert_eq!(coord.index_memory(), 4 * 12);
    }

    #[test]
    fn returns_must_be_lifo() {
        let (mut parent, _) = block(0, 100, 4);
        let first = parent.lend(10, 1).unwrap();
        let second = parent.lend(10, 1).unwrap();
        assert_eq!(first.start_pos(), 90);
        assert_eq!(second.start_pos(), 80);

        let rejected = parent.return_child(first).unwrap_err();
        assert!(matches!(
            rejected.error(),
            ArenaError::NonContiguousReturn { .. }
        ));
        assert_eq!(parent.size(), 80);
        assert_eq!(parent.child_num(), 2);

        let first = rejected.into_child();
        parent.return_child(second).unwrap();
        parent.return_child(first).unwrap();
        assert_eq!(parent.size(), 100);
        assert_eq!(parent.child_num(), 0);
    }

    #[test]
    fn foreign_child_rejected() {
        let (mut a, _) = block(0, 100, 4);
        let (mut b, _) = block(200, 100, 4);
        let child = a.lend(10, 1).unwrap();
        let rejected = b.return_child(child).unwrap_err();
        assert_eq!(
            rejected.error(),
            &ArenaError::ForeignChild {
                parent: a.id(),
                returned_to: b.id(),
            }
        );
        assert_eq!(b.size(), 100);
        a.return_child(rejected.into_child()).unwrap();
        assert_eq!(a.size(), 100);
    }

    #[test]
    fn child_with_outstanding_loans_rejected() {
        let (mut parent, _) = block(0, 100, 4);
        let mut child = parent.lend(50, 1).unwrap();
        let grandchild = child.lend(10, 1).unwrap();
        let rejected = parent.return_child(child).unwrap_err();
        assert!(matches!(
            rejected.error(),
            ArenaError::OutstandingLoans { outstanding: 1, .. }
        ));
        let mut child = rejected.into_child();
        child.return_child(grandchild).unwrap();
        parent.return_child(child).unwrap();
        assert_eq!(parent.size(), 100);
    }

    #[test]
    fn child_collects_into_lent_range() {
        let mut buf = SharedBuffer::new(100);
        let (mut parent, _) = block(0, 100, 4);
        parent.collect_key_value(&mut buf, b"pk", b"pv").unwrap();
        let mut child = parent.lend(50, 2).unwrap();
        child.collect_key_value(&mut buf, b"ck", b"cv").unwrap();
        assert_eq!(child.offsets(), &[50]);
        assert_eq!(buf.slice(50, 4), b"ckcv");
        // The parent cannot write into the lent range.
        let big = [0u8; 47];
        assert!(parent.collect_key_value(&mut buf, &big, b"").is_err());
    }

    #[test]
    fn reset_keeps_size_and_capacity() {
        let mut buf = SharedBuffer::new(64);
        let (mut b, _) = block(0, 64, 2);
        for _ in 0..5 {
            b.collect_key_value(&mut buf, b"k", b"v").unwrap();
        }
        let cap = b.index_capacity();
        b.reset();
        assert_eq!(b.used(), 0);
        assert_eq!(b.valid(), 0);
        assert_eq!(b.size(), 64);
        assert_eq!(b.index_capacity(), cap);

        b.collect_key_value(&mut buf, b"xy", b"z").unwrap();
        assert_eq!(b.valid(), 1);
        assert_eq!(b.offsets(), &[0]);
        assert_eq!(b.key_bytes(&buf, 0), Some(&b"xy"[..]));
    }

    #[test]
    fn finish_notifies_coordinator() {
        let (b, coord) = block(0, 10, 1);
        b.finish();
        assert_eq!(coord.finished(), vec![b.id()]);
    }

    #[test]
    fn index_mut_sorts_in_place() {
        let mut buf = SharedBuffer::new(64);
        let (mut b, _) = block(0, 64, 4);
        b.collect_key_value(&mut buf, b"zz", b"1").unwrap();
        b.collect_key_value(&mut buf, b"aa", b"2").unwrap();
        {
            let mut view = b.index_mut();
            view.swap(0, 1);
        }
        assert_eq!(b.key_bytes(&buf, 0), Some(&b"aa"[..]));
        assert_eq!(b.value_bytes(&buf, 1), Some(&b"1"[..]));
    }

    #[test]
    fn block_range_display() {
        let r = BlockRange { start: 10, size: 5 };
        assert_eq!(r.to_string(), "[10, 15)");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_records() -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
            proptest::collection::vec(
                (
                    proptest::collection::vec(any::<u8>(), 0..8),
                    proptest::collection::vec(any::<u8>(), 0..8),
                ),
                0..64,
            )
        }

        proptest! {
            #[test]
            fn offsets_are_prefix_sums(
                start in 0u32..512,
                records in arb_records(),
                cap in 0usize..4,
            ) {
                let mut buf = SharedBuffer::new(512 + 64 * 16);
                let coord = Arc::new(FakeCoordinator::doubling());
                let mut b = MemoryBlock::new(start as i64, 64 * 16, coord, cap).unwrap();
                let mut expected = start;
                for (k, v) in &records {
                    b.collect_key_value(&mut buf, k, v).unwrap();
                }
                prop_assert_eq!(b.valid(), records.len());
                for (i, (k, v)) in records.iter().enumerate() {
                    prop_assert_eq!(b.offsets()[i], expected);
                    prop_assert_eq!(b.key_bytes(&buf, i).unwrap(), &k[..]);
                    prop_assert_eq!(b.value_bytes(&buf, i).unwrap(), &v[..]);
                    expected += (k.len() + v.len()) as u32;
                }
                prop_assert_eq!(b.used(), expected - start);
                prop_assert!(records.is_empty() || b.valid() < b.index_capacity());
            }

            #[test]
            fn shrink_respects_left(size in 0u32..1000, used in 0u32..1000, s in 0u32..1000) {
                let used = used.min(size);
                let coord = Arc::new(FakeCoordinator::doubling());
                let mut b = MemoryBlock::new(0, size as i64, coord, 1).unwrap();
                if used > 0 {
                    let mut buf = SharedBuffer::new(size as usize);
                    let bytes = vec![1u8; used as usize];
                    b.collect_key_value(&mut buf, &bytes, b"").unwrap();
                }
                let left = b.left();
                match b.shrink_from_end(s) {
                    Some(start) => {
                        prop_assert!(s <= left);
                        prop_assert_eq!(b.size(), size - s);
                        prop_assert_eq!(start, size - s);
                        prop_assert_eq!(b.child_num(), 1);
                    }
                    None => {
                        prop_assert!(s > left);
                        prop_assert_eq!(b.size(), size);
                        prop_assert_eq!(b.child_num(), 0);
                    }
                }
            }

            #[test]
            fn nested_lends_unwind_to_original_size(sizes in proptest::collection::vec(1u32..20, 1..8)) {
                let coord = Arc::new(FakeCoordinator::doubling());
                let mut parent = MemoryBlock::new(0, 1000, coord.clone(), 4).unwrap();
                let mut children = Vec::new();
                for &s in &sizes {
                    children.push(parent.lend(s, 1).unwrap());
                }
                prop_assert_eq!(parent.child_num() as usize, sizes.len());
                while let Some(child) = children.pop() {
                    parent.return_child(child).unwrap();
                }
                prop_assert_eq!(parent.size(), 1000);
                prop_assert_eq!(parent.child_num(), 0);
                prop_assert_eq!(coord.index_memory(), 4 * 12);
            }
        }
    }
}
