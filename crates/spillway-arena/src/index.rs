//! Per-block record index.
//!
//! Three parallel `u32` arrays describe every record collected into a
//! block: the absolute buffer offset of its key, the key length, and the
//! value length. The arrays are kept separate (not a `Vec` of structs)
//! so a sort or scan touching only offsets and key lengths stays dense
//! in cache.

/// Growable parallel-array index of record positions.
///
/// All three arrays always have the same length, which is the index
/// capacity. `len` counts the valid prefix.
#[derive(Clone, Debug)]
pub struct RecordIndex {
    offsets: Vec<u32>,
    key_lens: Vec<u32>,
    value_lens: Vec<u32>,
    len: usize,
}

/// One index entry, by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordRef {
    /// Absolute buffer offset of the key's first byte.
    pub offset: u32,
    /// Key length in bytes.
    pub key_len: u32,
    /// Value length in bytes. The value starts at `offset + key_len`.
    pub value_len: u32,
}

impl RecordRef {
    /// Absolute buffer offset of the value's first byte.
    pub fn value_offset(&self) -> u32 {
        self.offset + self.key_len
    }

    /// Total bytes the record occupies in the buffer.
    pub fn total_len(&self) -> u32 {
        self.key_len + self.value_len
    }
}

/// Mutable view of the valid prefix of all three index arrays.
///
/// Handed to in-place sort routines. The three slices have equal length
/// and must be permuted together.
#[derive(Debug)]
pub struct RecordIndexMut<'a> {
    /// Absolute key offsets.
    pub offsets: &'a mut [u32],
    /// Key lengths.
    pub key_lens: &'a mut [u32],
    /// Value lengths.
    pub value_lens: &'a mut [u32],
}

impl RecordIndexMut<'_> {
    /// Number of entries in the view.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Swap entries `a` and `b` across all three arrays.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.offsets.swap(a, b);
        self.key_lens.swap(a, b);
        self.value_lens.swap(a, b);
    }
}

impl RecordIndex {
    /// Create an empty index with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            offsets: vec![0; capacity],
            key_lens: vec![0; capacity],
            value_lens: vec![0; capacity],
            len: 0,
        }
    }

    /// Number of valid records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no record has been pushed since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots allocated in each array.
    pub fn capacity(&self) -> usize {
        self.offsets.len()
    }

    /// Whether every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.len == self.offsets.len()
    }

    /// Write an entry at the next free slot.
    ///
    /// # Panics
    ///
    /// Panics if the index is full; the owning block grows it first.
    pub(crate) fn push(&mut self, offset: u32, key_len: u32, value_len: u32) {
        let i = self.len;
        self.offsets[i] = offset;
        self.key_lens[i] = key_len;
        self.value_lens[i] = value_len;
        self.len += 1;
    }

    /// Reallocate all three arrays to `new_capacity`, keeping the valid
    /// prefix in order.
    pub(crate) fn grow_to(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity >= self.len);
        self.offsets = resized(&self.offsets[..self.len], new_capacity);
        self.key_lens = resized(&self.key_lens[..self.len], new_capacity);
        self.value_lens = resized(&self.value_lens[..self.len], new_capacity);
    }

    /// Forget all entries without releasing the arrays.
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    /// Entry `i`, if valid.
    pub fn get(&self, i: usize) -> Option<RecordRef> {
        if i >= self.len {
            return None;
        }
        Some(RecordRef {
            offset: self.offsets[i],
            key_len: self.key_lens[i],
            value_len: self.value_lens[i],
        })
    }

    /// Valid prefix of the offset array.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets[..self.len]
    }

    /// Valid prefix of the key-length array.
    pub fn key_lens(&self) -> &[u32] {
        &self.key_lens[..self.len]
    }

    /// Valid prefix of the value-length array.
    pub fn value_lens(&self) -> &[u32] {
        &self.value_lens[..self.len]
    }

    /// Mutable view of the valid prefix of all three arrays.
    pub fn view_mut(&mut self) -> RecordIndexMut<'_> {
        let len = self.len;
        RecordIndexMut {
            offsets: &mut self.offsets[..len],
            key_lens: &mut self.key_lens[..len],
            value_lens: &mut self.value_lens[..len],
        }
    }
}

fn resized(live: &[u32], capacity: usize) -> Vec<u32> {
    let mut next = Vec::with_capacity(capacity);
    next.extend_from_slice(live);
    next.resize(capacity, 0);
    next
}
