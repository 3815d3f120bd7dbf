//! Error types shared across the Spillway workspace.

use thiserror::Error;

/// Errors from a [`RecordSerializer`](crate::RecordSerializer).
///
/// Serializers run on the producer side, before any bytes reach a block.
/// A failure here means the record was never collected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// The serialized form does not fit a 4-byte length slot.
    #[error("serialized record too large: {len} bytes exceeds slot maximum {max}")]
    TooLarge {
        /// Serialized length in bytes.
        len: usize,
        /// Largest length a slot can describe.
        max: usize,
    },
    /// The serializer wrote a different number of bytes than it reported
    /// from `serialized_len`.
    #[error("serializer length mismatch: reported {reported} bytes, wrote {written}")]
    LengthMismatch {
        /// Length returned by `serialized_len`.
        reported: usize,
        /// Bytes actually appended by `serialize`.
        written: usize,
    },
    /// The record type's own encoder failed.
    #[error("record encoding failed: {reason}")]
    Encode {
        /// Description from the encoder.
        reason: String,
    },
}
