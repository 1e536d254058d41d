//! In-memory working copy of the space index.

use std::path::PathBuf;

use crate::index::{IndexEntry, IndexStore, LoadedIndex, SpaceIndex};
use crate::meta;

/// Lazily loaded id -> path map backed by an [`IndexStore`].
///
/// Every mutation is persisted immediately. Reads validate that the entry's
/// meta.json still exists and drop the entry (re-persisting) when it does
/// not. If a persist fails the in-memory map stays authoritative and the
/// next mutation or [`Registry::close`] retries.
#[derive(Debug)]
pub struct Registry {
    store: IndexStore,
    entries: Option<SpaceIndex>,
    dirty: bool,
    pruned: u64,
    /// Ids pruned since the last [`Registry::take_pruned_ids`].
    pruned_ids: Vec<String>,
}

impl Registry {
    pub fn new(store: IndexStore) -> Self {
        Self {
            store,
            entries: None,
            dirty: false,
            pruned: 0,
            pruned_ids: Vec::new(),
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Load the index now instead of on first access.
    pub fn initialize(&mut self) {
        self.entries_mut();
    }

    pub fn is_initialized(&self) -> bool {
        self.entries.is_some()
    }

    /// Flush any unpersisted change and drop the in-memory map. A later
    /// access loads the index again.
    pub fn close(&mut self) {
        if self.dirty {
            self.persist();
        }
        self.entries = None;
        self.dirty = false;
    }

    /// Number of entries removed by read validation since construction.
    pub fn pruned(&self) -> u64 {
        self.pruned
    }

    /// Whether the last persist failed and a retry is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drain the ids pruned since the previous call, so callers holding
    /// derived state (the space cache) can drop it.
    pub fn take_pruned_ids(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pruned_ids)
    }

    /// Path for `id`, or `None` when unknown or its metadata vanished.
    pub fn get(&mut self, id: &str) -> Option<PathBuf> {
        let path = self.entries_mut().get(id)?.path.clone();
        if meta::has_meta(&path) {
            return Some(path);
        }
        self.prune(id);
        None
    }

    /// All live entries, pruning dead ones.
    pub fn list(&mut self) -> Vec<(String, PathBuf)> {
        let dead: Vec<String> = self
            .entries_mut()
            .iter()
            .filter(|(_, entry)| !meta::has_meta(&entry.path))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &dead {
            self.prune(id);
        }

        self.entries_mut()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.path.clone()))
            .collect()
    }

    /// Registered paths without validation.
    pub fn paths(&mut self) -> Vec<PathBuf> {
        self.entries_mut()
            .values()
            .map(|entry| entry.path.clone())
            .collect()
    }

    pub fn len(&mut self) -> usize {
        self.entries_mut().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    pub fn set(&mut self, id: String, path: PathBuf) {
        self.entries_mut().insert(id, IndexEntry { path });
        self.persist();
    }

    /// Remove `id`; returns whether it was registered.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.entries_mut().remove(id).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    /// Remove an entry whose metadata is gone or unusable.
    pub fn prune(&mut self, id: &str) {
        if let Some(entry) = self.entries_mut().remove(id) {
            self.pruned += 1;
            self.pruned_ids.push(id.to_string());
            tracing::warn!(
                space_id = %id,
                path = %entry.path.display(),
                "Pruning space with missing or unreadable metadata"
            );
            self.persist();
        }
    }

    fn entries_mut(&mut self) -> &mut SpaceIndex {
        if self.entries.is_none() {
            let rebuilt = match self.store.read() {
                LoadedIndex::Current(spaces) => {
                    self.entries = Some(spaces);
                    false
                }
                LoadedIndex::Rebuilt(spaces) => {
                    self.entries = Some(spaces);
                    true
                }
            };
            if rebuilt {
                self.persist();
            }
        }
        self.entries.get_or_insert_with(SpaceIndex::new)
    }

    fn persist(&mut self) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        self.dirty = self.store.persist(entries).is_err();
    }
}
