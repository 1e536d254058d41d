use chrono::{DateTime, Utc};
use hl_config::HaloConfig;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::cache::SpaceCache;
use crate::error::SpaceError;
use crate::index::IndexStore;
use crate::meta;
use crate::model::{
    CreateSpace, Space, SpaceMeta, SpacePreferences, UpdateSpace, TEMP_SPACE_ICON,
    TEMP_SPACE_ID, TEMP_SPACE_NAME,
};
use crate::registry::Registry;

const TEMP_ARTIFACTS_DIR: &str = "artifacts";

/// Opens a directory in the platform file manager.
pub trait FolderOpener: Send + Sync {
    fn open(&self, path: &Path) -> std::io::Result<()>;
}

/// [`FolderOpener`] backed by the OS default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl FolderOpener for SystemOpener {
    fn open(&self, path: &Path) -> std::io::Result<()> {
        open::that(path)
    }
}

/// Read instrumentation for the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryStats {
    /// meta.json parses performed for registered spaces.
    pub meta_reads: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Registry entries dropped because their metadata disappeared.
    pub pruned: u64,
}

struct RepositoryState {
    registry: Registry,
    cache: SpaceCache,
    stats: RepositoryStats,
}

impl RepositoryState {
    /// Resolve `id` through the registry and parse its meta.json.
    ///
    /// Missing or corrupt metadata prunes the entry and evicts the cache;
    /// other IO failures are returned without touching either.
    fn load_meta(&mut self, id: &str) -> Result<(PathBuf, SpaceMeta), SpaceError> {
        let root = self.lookup(id)?;
        self.stats.meta_reads += 1;
        match meta::read_meta(&root) {
            Ok(meta) => Ok((root, meta)),
            Err(err) if err.is_dead_metadata() => {
                self.registry.prune(id);
                self.evict_pruned();
                match err {
                    SpaceError::Missing(_) => Err(SpaceError::NotFound(id.to_string())),
                    other => Err(other),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Registry lookup that keeps the cache in step with any pruning.
    fn lookup(&mut self, id: &str) -> Result<PathBuf, SpaceError> {
        let root = self.registry.get(id);
        self.evict_pruned();
        root.ok_or_else(|| {
            self.cache.remove(id);
            SpaceError::NotFound(id.to_string())
        })
    }

    fn evict_pruned(&mut self) {
        for id in self.registry.take_pruned_ids() {
            self.cache.remove(&id);
        }
    }

    fn materialize(&mut self, id: &str) -> Result<Space, SpaceError> {
        let (root, meta) = self.load_meta(id)?;
        Ok(meta.into_space(id, root))
    }
}

/// Public API over the space index, registry and cache.
///
/// All state sits behind one mutex, so each operation runs as a single
/// serialized critical section and the repository can be shared via `Arc`.
pub struct SpaceRepository {
    spaces_dir: PathBuf,
    temp_dir: PathBuf,
    /// Fixed for the lifetime of the repository.
    temp_timestamp: DateTime<Utc>,
    opener: Box<dyn FolderOpener>,
    state: Mutex<RepositoryState>,
}

impl SpaceRepository {
    pub fn new(registry: Registry, cache: SpaceCache, temp_dir: PathBuf) -> Self {
        Self {
            spaces_dir: registry.store().spaces_dir().to_path_buf(),
            temp_dir,
            temp_timestamp: Utc::now(),
            opener: Box::new(SystemOpener),
            state: Mutex::new(RepositoryState {
                registry,
                cache,
                stats: RepositoryStats::default(),
            }),
        }
    }

    /// Build a repository from loaded configuration.
    pub fn from_config(config: &HaloConfig) -> anyhow::Result<Self> {
        let paths = config.paths()?;
        let store = IndexStore::new(paths.index_path(), config.spaces_dir()?);
        let cache = SpaceCache::with_capacity(config.spaces.cache_capacity);
        Ok(Self::new(
            Registry::new(store),
            cache,
            paths.temp_space_dir(),
        ))
    }

    /// Replace the folder opener (tests, headless hosts).
    pub fn with_opener(mut self, opener: impl FolderOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    pub fn spaces_dir(&self) -> &Path {
        &self.spaces_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Load the index eagerly.
    pub fn initialize(&self) {
        self.lock().registry.initialize();
    }

    /// Flush pending index writes and drop in-memory state.
    pub fn close(&self) {
        let mut state = self.lock();
        state.registry.close();
        state.cache.clear();
    }

    pub fn stats(&self) -> RepositoryStats {
        let state = self.lock();
        RepositoryStats {
            pruned: state.registry.pruned(),
            ..state.stats
        }
    }

    pub fn create_space(&self, input: CreateSpace) -> Result<Space, SpaceError> {
        if input.name.trim().is_empty() {
            return Err(SpaceError::InvalidName(input.name));
        }
        let root = match input.custom_path {
            Some(path) if !path.is_absolute() => return Err(SpaceError::InvalidPath(path)),
            Some(path) => path,
            None => {
                if !is_single_component(&input.name) {
                    return Err(SpaceError::InvalidName(input.name));
                }
                self.spaces_dir.join(&input.name)
            }
        };

        let mut state = self.lock();

        let conversations = meta::conversations_dir(&root);
        std::fs::create_dir_all(&conversations)
            .map_err(|e| SpaceError::from_io(&conversations, e))?;

        let now = Utc::now();
        let meta = SpaceMeta {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            icon: input.icon,
            created_at: now,
            updated_at: now,
            preferences: None,
        };
        meta::write_meta(&root, &meta)?;

        let id = meta.id.clone();
        state.registry.set(id.clone(), root.clone());
        tracing::info!(space_id = %id, path = %root.display(), "Created space");
        Ok(meta.into_space(&id, root))
    }

    pub fn get_space(&self, id: &str) -> Result<Space, SpaceError> {
        if id == TEMP_SPACE_ID {
            return Ok(self.temp_space());
        }

        let mut state = self.lock();
        if let Some(space) = state.cache.get(id) {
            state.stats.cache_hits += 1;
            return Ok(space);
        }
        state.stats.cache_misses += 1;

        let space = state.materialize(id)?;
        state.cache.insert(space.clone());
        Ok(space)
    }

    /// Every registered space, newest `updated_at` first. Dead entries are
    /// pruned; results are not cached.
    pub fn list_spaces(&self) -> Vec<Space> {
        let mut state = self.lock();
        let entries = state.registry.list();
        state.evict_pruned();

        let mut spaces = Vec::with_capacity(entries.len());
        for (id, _) in entries {
            match state.materialize(&id) {
                Ok(space) => spaces.push(space),
                Err(e) => {
                    tracing::debug!(space_id = %id, error = %e, "Skipping space in listing");
                }
            }
        }
        spaces.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        spaces
    }

    pub fn update_space(&self, id: &str, update: UpdateSpace) -> Result<Space, SpaceError> {
        if id == TEMP_SPACE_ID {
            return Err(SpaceError::TempSpace);
        }
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(SpaceError::InvalidName(name.clone()));
            }
        }

        let mut state = self.lock();
        let (root, mut meta) = state.load_meta(id)?;
        if let Some(name) = update.name {
            meta.name = name;
        }
        if let Some(icon) = update.icon {
            meta.icon = icon;
        }
        meta.updated_at = Utc::now();
        meta::write_meta(&root, &meta)?;

        let space = meta.into_space(id, root);
        state.cache.insert(space.clone());
        tracing::info!(space_id = %id, "Updated space");
        Ok(space)
    }

    /// Merge `update` into the stored preferences (shallow at `layout`).
    /// Works for the temp space, whose meta.json is created on demand.
    pub fn update_space_preferences(
        &self,
        id: &str,
        update: SpacePreferences,
    ) -> Result<Space, SpaceError> {
        let mut state = self.lock();

        if id == TEMP_SPACE_ID {
            let mut meta = match meta::read_meta(&self.temp_dir) {
                Ok(meta) => meta,
                Err(SpaceError::Missing(_)) => self.temp_meta(),
                Err(err @ SpaceError::Corrupt { .. }) => {
                    tracing::warn!(error = %err, "Replacing corrupt temp space metadata");
                    self.temp_meta()
                }
                Err(err) => return Err(err),
            };
            meta.preferences = Some(meta.preferences.unwrap_or_default().merged(update));
            meta.updated_at = Utc::now();
            meta::write_meta(&self.temp_dir, &meta)?;
            drop(state);
            return Ok(self.temp_space());
        }

        let (root, mut meta) = state.load_meta(id)?;
        meta.preferences = Some(meta.preferences.unwrap_or_default().merged(update));
        meta.updated_at = Utc::now();
        meta::write_meta(&root, &meta)?;

        let space = meta.into_space(id, root);
        state.cache.insert(space.clone());
        tracing::debug!(space_id = %id, "Updated space preferences");
        Ok(space)
    }

    pub fn get_space_preferences(&self, id: &str) -> Result<SpacePreferences, SpaceError> {
        Ok(self.get_space(id)?.preferences.unwrap_or_default())
    }

    /// Delete a space. Spaces under the default directory lose their whole
    /// tree; adopted folders only lose `.halo`. On failure the index and
    /// cache are left untouched.
    pub fn delete_space(&self, id: &str) -> Result<(), SpaceError> {
        if id == TEMP_SPACE_ID {
            return Err(SpaceError::TempSpace);
        }

        let mut state = self.lock();
        let root = state.lookup(id)?;

        let target = if self.is_default_location(&root) {
            root.clone()
        } else {
            meta::control_dir(&root)
        };
        match std::fs::remove_dir_all(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    space_id = %id,
                    path = %target.display(),
                    error = %e,
                    "Failed to delete space"
                );
                return Err(SpaceError::from_io(&target, e));
            }
        }

        state.registry.remove(id);
        state.cache.remove(id);
        tracing::info!(space_id = %id, path = %target.display(), "Deleted space");
        Ok(())
    }

    /// Reveal the space in the file manager. The temp space opens its
    /// artifacts directory, which must already exist.
    pub fn open_space_folder(&self, id: &str) -> Result<(), SpaceError> {
        let space = self.get_space(id)?;
        let target = if space.is_temp {
            let artifacts = self.temp_dir.join(TEMP_ARTIFACTS_DIR);
            if !artifacts.is_dir() {
                return Err(SpaceError::Missing(artifacts));
            }
            artifacts
        } else {
            space.path
        };
        self.opener
            .open(&target)
            .map_err(|e| SpaceError::from_io(&target, e))
    }

    /// Temp root (always, even before it exists) followed by every
    /// registered root still present on disk.
    pub fn get_all_space_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.temp_dir.clone()];
        let registered = self.lock().registry.paths();
        for path in registered {
            if path.exists() && !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    fn lock(&self) -> MutexGuard<'_, RepositoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn temp_meta(&self) -> SpaceMeta {
        SpaceMeta {
            id: TEMP_SPACE_ID.to_string(),
            name: TEMP_SPACE_NAME.to_string(),
            icon: TEMP_SPACE_ICON.to_string(),
            created_at: self.temp_timestamp,
            updated_at: self.temp_timestamp,
            preferences: None,
        }
    }

    fn temp_space(&self) -> Space {
        let preferences = match meta::read_meta(&self.temp_dir) {
            Ok(meta) => meta.preferences,
            Err(SpaceError::Missing(_)) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable temp space metadata");
                None
            }
        };
        Space {
            preferences,
            ..self.temp_meta().into_space(TEMP_SPACE_ID, self.temp_dir.clone())
        }
    }

    /// Strictly beneath the default spaces directory.
    fn is_default_location(&self, root: &Path) -> bool {
        let root = hl_fs::resolve_path(root).unwrap_or_else(|_| root.to_path_buf());
        let spaces_dir =
            hl_fs::resolve_path(&self.spaces_dir).unwrap_or_else(|_| self.spaces_dir.clone());
        root != spaces_dir && root.starts_with(&spaces_dir)
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
