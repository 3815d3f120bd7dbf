//! Core types and traits for the Spillway sort/spill buffer.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the pieces shared by the allocator and its producers: block IDs,
//! the record-index slot layout, and the serialization adapter that
//! turns typed records into raw byte spans.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod layout;
pub mod serializer;

pub use error::SerializeError;
pub use id::BlockId;
pub use layout::{INDEX_ARRAYS, INDEX_BYTES_PER_RECORD, INDEX_SLOT_BYTES};
pub use serializer::{BytesSerializer, RecordSerializer};
