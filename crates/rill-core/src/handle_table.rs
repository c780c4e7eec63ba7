//! Thread-safe handle table for one category
//!
//! Maps numeric handles to values. Storage is sharded (one reader/writer
//! lock per shard, handle hashed to a shard) so unrelated handles rarely
//! contend; allocation is a single atomic counter.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::category::Handle;

/// Thread-safe table mapping handles to values.
///
/// Handles are auto-incrementing, start at 1 and are never reused for the
/// lifetime of the table.
pub struct HandleTable<T> {
    map: DashMap<u64, T>,
    next_id: AtomicU64,
}

impl<T> HandleTable<T> {
    /// Create a new empty table with the default shard layout.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a table with a fixed shard count.
    ///
    /// Only reachable with a count that passed
    /// [`RegistryOptions::validate`](crate::RegistryOptions::validate).
    pub(crate) fn with_shards(shard_count: usize, capacity: usize) -> Self {
        Self {
            map: DashMap::with_capacity_and_shard_amount(capacity, shard_count),
            next_id: AtomicU64::new(1),
        }
    }

    /// Insert a value and return its handle.
    pub fn insert(&self, value: T) -> Handle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.map.insert(id, value);
        // Counter starts at 1 and only grows
        Handle::new(id).unwrap_or_else(|| unreachable!("handle counter wrapped"))
    }

    /// Remove a value by handle, returning it.
    pub fn remove(&self, handle: Handle) -> Option<T> {
        self.map.remove(&handle.get()).map(|(_, value)| value)
    }

    /// Check whether a handle is live.
    pub fn contains(&self, handle: Handle) -> bool {
        self.map.contains_key(&handle.get())
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Next handle that `insert` would hand out.
    pub fn peek_next(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl<T: Clone> HandleTable<T> {
    /// Clone the value out of the table.
    ///
    /// The shard lock is released before returning, so callers may run
    /// arbitrary code (including inserts into this table) with the value.
    pub fn get(&self, handle: Handle) -> Option<T> {
        self.map.get(&handle.get()).map(|entry| entry.value().clone())
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
