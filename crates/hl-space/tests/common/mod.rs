#![allow(dead_code)]

use chrono::Utc;
use hl_config::{ConfigPaths, HaloConfig};
use hl_space::{meta, FolderOpener, SpaceMeta, SpaceRepository};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub paths: ConfigPaths,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::with_base(dir.path().join("data"));
        paths.ensure_config_dir().unwrap();
        Self { dir, paths }
    }

    pub fn repository(&self) -> SpaceRepository {
        self.repository_with_capacity(10)
    }

    pub fn repository_with_capacity(&self, capacity: usize) -> SpaceRepository {
        let mut config = HaloConfig::load_from(&self.paths).unwrap();
        config.spaces.cache_capacity = capacity;
        SpaceRepository::from_config(&config).unwrap()
    }

    /// A directory outside the data root, for custom-path spaces.
    pub fn outside(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("elsewhere").join(name);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn index_json(&self) -> serde_json::Value {
        let content = std::fs::read_to_string(self.paths.index_path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    pub fn indexed_ids(&self) -> Vec<String> {
        self.index_json()["spaces"]
            .as_object()
            .map(|spaces| spaces.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Write a meta.json by hand, as an older build of the app would have.
pub fn write_space_meta(root: &Path, id: &str, name: &str) {
    let now = Utc::now();
    let meta = SpaceMeta {
        id: id.to_string(),
        name: name.to_string(),
        icon: "folder".to_string(),
        created_at: now,
        updated_at: now,
        preferences: None,
    };
    meta::write_meta(root, &meta).unwrap();
}

#[derive(Clone, Default)]
pub struct RecordingOpener {
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl FolderOpener for RecordingOpener {
    fn open(&self, path: &Path) -> std::io::Result<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
