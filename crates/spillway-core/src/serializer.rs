//! Serialization adapter between typed records and raw byte spans.
//!
//! The allocator only ever handles byte spans and lengths. A producer
//! uses a [`RecordSerializer`] to learn the exact serialized length of a
//! record (so it can compare against a block's remaining capacity) and to
//! write the bytes into a scratch buffer before collecting them.

use crate::error::SerializeError;

/// Largest serialized length a 4-byte index slot can describe.
pub const MAX_RECORD_LEN: usize = u32::MAX as usize;

/// Turns values of type `T` into bytes.
///
/// Implementations may cache the last serialized value between
/// `serialized_len` and `serialize`; `&mut self` allows that.
pub trait RecordSerializer<T: ?Sized> {
    /// Exact number of bytes `serialize` will append for `value`.
    fn serialized_len(&mut self, value: &T) -> Result<usize, SerializeError>;

    /// Append the serialized form of `value` to `out`.
    fn serialize(&mut self, value: &T, out: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Identity serializer for values that already are bytes.
///
/// Works for `[u8]`, `Vec<u8>`, `str`, `String` and anything else that is
/// `AsRef<[u8]>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytesSerializer;

impl<T: AsRef<[u8]> + ?Sized> RecordSerializer<T> for BytesSerializer {
    fn serialized_len(&mut self, value: &T) -> Result<usize, SerializeError> {
        let len = value.as_ref().len();
        if len > MAX_RECORD_LEN {
            return Err(SerializeError::TooLarge {
                len,
                max: MAX_RECORD_LEN,
            });
        }
        Ok(len)
    }

    fn serialize(&mut self, value: &T, out: &mut Vec<u8>) -> Result<(), SerializeError> {
        out.extend_from_slice(value.as_ref());
        Ok(())
    }
}
