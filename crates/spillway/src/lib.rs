//! Spillway: a shared-buffer block allocator and record index for
//! sort/spill buffers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Spillway sub-crates. For most users, adding `spillway` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use spillway::prelude::*;
//!
//! let mut config = PoolConfig::new(1 << 20);
//! config.initial_record_capacity = 2;
//! let (pool, mut buffer) = BlockPool::new(config).unwrap();
//!
//! // Carve a block and collect two records into it.
//! let mut block = pool.allocate_block(64 * 1024).unwrap();
//! block.collect_key_value(&mut buffer, b"abc", b"12345").unwrap();
//! block.collect_key_value(&mut buffer, b"de", b"67").unwrap();
//! assert_eq!(block.used(), 12);
//! assert_eq!(block.offsets(), &[0, 8]);
//!
//! // Lend the unused tail to a child, fill it, and take it back.
//! let mut child = block.lend(1024, 4).unwrap();
//! child.collect_key_value(&mut buffer, b"k", b"v").unwrap();
//! block.return_child(child).unwrap();
//! assert_eq!(block.size(), 64 * 1024);
//!
//! // Scan and hand the block off downstream.
//! let keys: Vec<&[u8]> = (0..block.valid())
//!     .filter_map(|i| block.key_bytes(&buffer, i))
//!     .collect();
//! assert_eq!(keys, [&b"abc"[..], &b"de"[..]]);
//! block.finish();
//! assert_eq!(pool.stats().finished_records, 2);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `spillway-arena` | Blocks, children, cursors, the pool and its config |
//! | [`types`] | `spillway-core` | Block ids, index layout constants, serializer trait |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Blocks, lending, scans and the block pool (`spillway-arena`).
///
/// Most users only need [`arena::BlockPool`] and [`arena::MemoryBlock`]
/// from this module; they are also available in the [`prelude`].
pub use spillway_arena as arena;

/// Core ids, layout constants and serialization (`spillway-core`).
///
/// Contains [`types::BlockId`], the per-record index cost
/// [`types::INDEX_BYTES_PER_RECORD`] and the
/// [`types::RecordSerializer`] trait.
pub use spillway_core as types;

/// Common imports for typical Spillway usage.
///
/// ```rust
/// use spillway::prelude::*;
/// ```
///
/// This imports the pool, blocks, the coordinator trait, scans, the
/// record writer and the error types.
pub mod prelude {
    // Pool
    pub use spillway_arena::{BlockPool, FinishedBlock, PoolConfig, PoolStats, SharedBuffer};

    // Blocks
    pub use spillway_arena::{BlockRange, ChildMemoryBlock, Coordinator, MemoryBlock};

    // Scans
    pub use spillway_arena::{KeyValueCursor, RecordRef};

    // Serialization
    pub use spillway_arena::RecordWriter;
    pub use spillway_core::{BlockId, BytesSerializer, RecordSerializer};

    // Errors
    pub use spillway_arena::{ArenaError, ReturnRejected};
    pub use spillway_core::SerializeError;
}
