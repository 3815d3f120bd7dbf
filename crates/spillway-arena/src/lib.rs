//! Shared-buffer block allocator and record index for Spillway.
//!
//! Packs key/value records densely into one shared byte buffer and tracks
//! their positions in compact per-block index arrays that a sort or spill
//! routine can scan repeatedly. Blocks are refilled across many cycles
//! without reallocating the buffer.
//!
//! # Architecture
//!
//! ```text
//! BlockPool (default Coordinator, Arc-shared)
//! ├── SharedBuffer (one Vec<u8>, fixed capacity)
//! ├── growth policy + index-memory account
//! └── finished-block registry / channel
//!
//! MemoryBlock ([start, start + size) of the buffer)
//! ├── used: bump cursor into the range
//! ├── RecordIndex: offsets[] / key_lens[] / value_lens[]
//! ├── lent: stack of tail ranges lent to children
//! └── Arc<dyn Coordinator>
//!
//! ChildMemoryBlock (MemoryBlock + parent BlockId)
//! KeyValueCursor / Records (borrowed scans)
//! ```
//!
//! # Ownership
//!
//! Blocks never own buffer bytes; they hold `(start, size)` and write
//! through a `&mut SharedBuffer` passed to
//! [`MemoryBlock::collect_key_value`]. Lending a tail to a child and
//! returning it are the only ways write authority over a range moves
//! between blocks, and the parent checks every return against the range
//! it lent.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod buffer;
pub mod child;
pub mod config;
pub mod coordinator;
pub mod cursor;
pub mod error;
pub mod index;
pub mod pool;
pub mod writer;

#[cfg(test)]
mod test_support;

// Public re-exports for the primary API surface.
pub use block::{BlockRange, MemoryBlock};
pub use buffer::SharedBuffer;
pub use child::{ChildMemoryBlock, ReturnRejected};
pub use config::PoolConfig;
pub use coordinator::Coordinator;
pub use cursor::{KeyValueCursor, Records};
pub use error::ArenaError;
pub use index::{RecordIndex, RecordIndexMut, RecordRef};
pub use pool::{BlockPool, FinishedBlock, PoolStats};
pub use writer::RecordWriter;
