//! The shared byte buffer that all blocks write into.
//!
//! A [`SharedBuffer`] is one contiguous `Vec<u8>` allocated to full
//! capacity at creation and never reallocated. Blocks do not own any
//! part of it; each holds a `(start, size)` view and writes through the
//! buffer only when collecting a record.

/// Contiguous byte storage shared by every block carved from it.
///
/// The buffer is zero-initialised once. Bytes written by one fill cycle
/// are simply overwritten by the next; nothing is cleared on reset.
#[derive(Clone, Debug)]
pub struct SharedBuffer {
    /// Backing storage. Allocated to full capacity at creation.
    data: Vec<u8>,
}

impl SharedBuffer {
    /// Create a zero-filled buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
        }
    }

    /// Physical capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes available from `start` to the physical end.
    pub fn available_from(&self, start: usize) -> usize {
        self.data.len().saturating_sub(start)
    }

    /// Get a shared slice at the given offset and length.
    ///
    /// # Panics
    ///
    /// Panics if `start + len` exceeds the buffer's capacity.
    pub fn slice(&self, start: u32, len: u32) -> &[u8] {
        let start = start as usize;
        &self.data[start..start + len as usize]
    }

    /// Get a mutable slice at the given offset and length.
    ///
    /// # Panics
    ///
    /// Panics if `start + len` exceeds the buffer's capacity.
    pub fn slice_mut(&mut self, start: u32, len: u32) -> &mut [u8] {
        let start = start as usize;
        &mut self.data[start..start + len as usize]
    }

    /// The whole buffer, for bulk consumers that resolve index offsets
    /// themselves (e.g. a comparator used by an in-place sort).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy `src` to `start`. Zero-length copies are no-ops.
    ///
    /// Callers check bounds beforehand; see [`MemoryBlock::collect_key_value`].
    ///
    /// [`MemoryBlock::collect_key_value`]: crate::MemoryBlock::collect_key_value
    pub(crate) fn copy_in(&mut self, start: usize, src: &[u8]) {
        if src.is_empty() {
            return;
        }
        self.data[start..start + src.len()].copy_from_slice(src);
    }
}
