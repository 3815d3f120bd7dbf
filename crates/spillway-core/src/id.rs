//! Strongly-typed identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counter for unique [`BlockId`] allocation.
static BLOCK_ID_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Unique per-instance identifier for a memory block.
///
/// Allocated from a monotonic atomic counter via [`BlockId::next`]. Two
/// blocks always have different IDs, even when they cover the same byte
/// range at different times (a child returned to its parent and a later
/// child lent from the same tail are distinct blocks). The parent/child
/// return check and the finished-block registry key on this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    /// Allocate a fresh, unique block ID.
    ///
    /// Each call returns a new ID that has never been returned before
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(BLOCK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
