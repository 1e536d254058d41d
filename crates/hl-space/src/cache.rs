use lru::LruCache;
use std::num::NonZeroUsize;

use crate::model::{Space, TEMP_SPACE_ID};

/// Bounded LRU of materialized spaces, keyed by id.
///
/// The temp space is never stored: it has no registry entry and is rebuilt on
/// every access.
#[derive(Debug)]
pub struct SpaceCache {
    entries: LruCache<String, Space>,
}

impl SpaceCache {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Like [`SpaceCache::new`]; a zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a copy of the cached space and marks it most recently used.
    pub fn get(&mut self, id: &str) -> Option<Space> {
        self.entries.get(id).cloned()
    }

    /// Membership test that does not affect recency.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains(id)
    }

    /// Insert or overwrite `space`, evicting the least recently used entry
    /// when full.
    pub fn insert(&mut self, space: Space) {
        if space.id == TEMP_SPACE_ID {
            return;
        }
        let id = space.id.clone();
        if let Some((evicted, _)) = self.entries.push(id.clone(), space) {
            if evicted != id {
                tracing::debug!(space_id = %evicted, "Evicted space from cache");
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Space> {
        self.entries.pop(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SpaceCache {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}
