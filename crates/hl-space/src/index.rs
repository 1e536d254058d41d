//! The durable id -> path index file and its legacy migration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::meta;
use crate::model::TEMP_SPACE_ID;

const INDEX_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub path: PathBuf,
}

pub type SpaceIndex = BTreeMap<String, IndexEntry>;

#[derive(Deserialize)]
struct CurrentIndexFile {
    version: u32,
    spaces: SpaceIndex,
}

#[derive(Serialize)]
struct CurrentIndexFileRef<'a> {
    version: u32,
    spaces: &'a SpaceIndex,
}

#[derive(Deserialize)]
struct LegacyIndexFile {
    #[serde(rename = "customPaths")]
    custom_paths: Vec<PathBuf>,
}

/// What an index file on disk turned out to be.
#[derive(Debug)]
enum IndexFile {
    Current(SpaceIndex),
    Legacy(Vec<PathBuf>),
    Unrecognized,
}

impl IndexFile {
    fn parse(content: &str) -> Self {
        if let Ok(file) = serde_json::from_str::<CurrentIndexFile>(content) {
            if file.version == INDEX_VERSION {
                return IndexFile::Current(file.spaces);
            }
            tracing::warn!(version = file.version, "Unsupported space index version");
            return IndexFile::Unrecognized;
        }
        match serde_json::from_str::<LegacyIndexFile>(content) {
            Ok(file) => IndexFile::Legacy(file.custom_paths),
            Err(_) => IndexFile::Unrecognized,
        }
    }
}

/// Result of reading the index file.
#[derive(Debug)]
pub enum LoadedIndex {
    /// A current-format file, used as is.
    Current(SpaceIndex),
    /// Rebuilt from disk and not yet persisted.
    Rebuilt(SpaceIndex),
}

/// Owns the index file: load (with migration) and atomic persist.
#[derive(Debug, Clone)]
pub struct IndexStore {
    index_path: PathBuf,
    spaces_dir: PathBuf,
}

impl IndexStore {
    pub fn new(index_path: PathBuf, spaces_dir: PathBuf) -> Self {
        Self {
            index_path,
            spaces_dir,
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Default parent directory scanned during migration.
    pub fn spaces_dir(&self) -> &Path {
        &self.spaces_dir
    }

    /// Read the index and persist it when it had to be rebuilt. A persist
    /// failure is logged and the rebuilt map is still returned.
    pub fn load(&self) -> SpaceIndex {
        match self.read() {
            LoadedIndex::Current(spaces) => spaces,
            LoadedIndex::Rebuilt(spaces) => {
                let _ = self.persist(&spaces);
                spaces
            }
        }
    }

    /// Read the index without writing. A current-format file is trusted as
    /// is; anything else triggers a rescan of the disk.
    pub fn read(&self) -> LoadedIndex {
        let custom_paths = match std::fs::read_to_string(&self.index_path) {
            Ok(content) => match IndexFile::parse(&content) {
                IndexFile::Current(spaces) => {
                    tracing::debug!(count = spaces.len(), "Loaded space index");
                    return LoadedIndex::Current(spaces);
                }
                IndexFile::Legacy(custom_paths) => {
                    tracing::info!(
                        custom_paths = custom_paths.len(),
                        "Migrating legacy space index"
                    );
                    custom_paths
                }
                IndexFile::Unrecognized => {
                    tracing::warn!(
                        path = %self.index_path.display(),
                        "Space index is corrupt or unrecognized; rebuilding from disk"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No space index found; building from disk");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.index_path.display(),
                    error = %e,
                    "Failed to read space index; rebuilding from disk"
                );
                Vec::new()
            }
        };

        LoadedIndex::Rebuilt(self.migrate(&custom_paths))
    }

    /// Atomically replace the index file with `spaces` in the current format.
    pub fn persist(&self, spaces: &SpaceIndex) -> std::io::Result<()> {
        let file = CurrentIndexFileRef {
            version: INDEX_VERSION,
            spaces,
        };
        hl_fs::write_json_atomic(&self.index_path, &file).inspect_err(|e| {
            tracing::error!(
                path = %self.index_path.display(),
                error = %e,
                "Failed to persist space index"
            );
        })
    }

    fn migrate(&self, custom_paths: &[PathBuf]) -> SpaceIndex {
        let mut spaces = SpaceIndex::new();

        let mut candidates = list_subdirectories(&self.spaces_dir);
        candidates.extend(custom_paths.iter().cloned());

        for root in candidates {
            let meta = match meta::read_meta(&root) {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::debug!(
                        path = %root.display(),
                        error = %e,
                        "Skipping directory during index rebuild"
                    );
                    continue;
                }
            };
            if meta.id == TEMP_SPACE_ID {
                continue;
            }
            if let Some(existing) = spaces.get(&meta.id) {
                tracing::warn!(
                    space_id = %meta.id,
                    kept = %existing.path.display(),
                    ignored = %root.display(),
                    "Duplicate space id during index rebuild"
                );
                continue;
            }
            spaces.insert(meta.id, IndexEntry { path: root });
        }

        tracing::info!(count = spaces.len(), "Rebuilt space index");
        spaces
    }
}

/// Subdirectories of `dir`, sorted so rebuilds are deterministic.
fn list_subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to scan spaces directory"
                );
            }
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}
