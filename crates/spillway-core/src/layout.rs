//! Record-index slot layout.
//!
//! Each record in a block's index occupies one 4-byte slot in each of
//! three parallel arrays (offset, key length, value length). Index memory
//! is accounted in these units.

/// Bytes per index slot (one `u32`).
pub const INDEX_SLOT_BYTES: usize = std::mem::size_of::<u32>();

/// Number of parallel index arrays per block.
pub const INDEX_ARRAYS: usize = 3;

/// Accounted index memory per record capacity unit.
pub const INDEX_BYTES_PER_RECORD: usize = INDEX_SLOT_BYTES * INDEX_ARRAYS;

/// Index memory, in bytes, accounted for an index of `capacity` records.
pub const fn index_bytes(capacity: usize) -> usize {
    capacity * INDEX_BYTES_PER_RECORD
}
