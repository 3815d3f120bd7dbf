//! Producer-side helper that serializes typed records into a block.
//!
//! [`RecordWriter`] pairs a key serializer and a value serializer with two
//! reusable scratch buffers. The scratch buffers keep their allocation
//! across records, so steady-state collection does not touch the heap.

use spillway_core::{RecordSerializer, SerializeError};

use crate::block::MemoryBlock;
use crate::buffer::SharedBuffer;
use crate::error::ArenaError;

/// Serializes keys and values and collects them into blocks.
#[derive(Debug, Default)]
pub struct RecordWriter<KS, VS> {
    key_serializer: KS,
    value_serializer: VS,
    key_scratch: Vec<u8>,
    value_scratch: Vec<u8>,
}

impl<KS, VS> RecordWriter<KS, VS> {
    /// Create a writer from a key and a value serializer.
    pub fn new(key_serializer: KS, value_serializer: VS) -> Self {
        Self {
            key_serializer,
            value_serializer,
            key_scratch: Vec::new(),
            value_scratch: Vec::new(),
        }
    }

    /// Bytes the pair will occupy in a block.
    pub fn serialized_len<K, V>(&mut self, key: &K, value: &V) -> Result<usize, ArenaError>
    where
        K: ?Sized,
        V: ?Sized,
        KS: RecordSerializer<K>,
        VS: RecordSerializer<V>,
    {
        let key_len = self.key_serializer.serialized_len(key)?;
        let value_len = self.value_serializer.serialized_len(value)?;
        Ok(key_len + value_len)
    }

    /// Whether the pair fits in `block`'s remaining capacity.
    pub fn fits<K, V>(&mut self, block: &MemoryBlock, key: &K, value: &V) -> Result<bool, ArenaError>
    where
        K: ?Sized,
        V: ?Sized,
        KS: RecordSerializer<K>,
        VS: RecordSerializer<V>,
    {
        Ok(self.serialized_len(key, value)? <= block.left() as usize)
    }

    /// Serialize the pair and collect it into `block`.
    ///
    /// Fails with [`ArenaError::Serialize`] if a serializer fails or writes
    /// a different length than it reported, and with
    /// [`ArenaError::BufferOverflow`] if the pair does not fit. The block
    /// is unchanged on failure.
    pub fn write<K, V>(
        &mut self,
        block: &mut MemoryBlock,
        buffer: &mut SharedBuffer,
        key: &K,
        value: &V,
    ) -> Result<(), ArenaError>
    where
        K: ?Sized,
        V: ?Sized,
        KS: RecordSerializer<K>,
        VS: RecordSerializer<V>,
    {
        let key_len = self.key_serializer.serialized_len(key)?;
        let value_len = self.value_serializer.serialized_len(value)?;

        self.key_scratch.clear();
        self.key_serializer.serialize(key, &mut self.key_scratch)?;
        check_written(key_len, self.key_scratch.len())?;

        self.value_scratch.clear();
        self.value_serializer
            .serialize(value, &mut self.value_scratch)?;
        check_written(value_len, self.value_scratch.len())?;

        block.collect_key_value(buffer, &self.key_scratch, &self.value_scratch)
    }
}

fn check_written(reported: usize, written: usize) -> Result<(), SerializeError> {
    if reported != written {
        return Err(SerializeError::LengthMismatch { reported, written });
    }
    Ok(())
}
