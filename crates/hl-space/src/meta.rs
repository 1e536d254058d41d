//! Layout of a space's `.halo` control directory.

use std::path::{Path, PathBuf};

use crate::error::SpaceError;
use crate::model::SpaceMeta;

pub const CONTROL_DIR: &str = ".halo";
pub const META_FILE: &str = "meta.json";

pub fn control_dir(root: &Path) -> PathBuf {
    root.join(CONTROL_DIR)
}

pub fn meta_path(root: &Path) -> PathBuf {
    control_dir(root).join(META_FILE)
}

pub fn conversations_dir(root: &Path) -> PathBuf {
    control_dir(root).join("conversations")
}

pub fn skills_dir(root: &Path) -> PathBuf {
    control_dir(root).join("skills")
}

/// Cheap liveness probe used by registry validation; does not parse.
pub fn has_meta(root: &Path) -> bool {
    meta_path(root).is_file()
}

pub fn read_meta(root: &Path) -> Result<SpaceMeta, SpaceError> {
    let path = meta_path(root);
    let content = std::fs::read_to_string(&path).map_err(|e| SpaceError::from_io(&path, e))?;
    serde_json::from_str(&content).map_err(|source| SpaceError::Corrupt { path, source })
}

pub fn write_meta(root: &Path, meta: &SpaceMeta) -> Result<(), SpaceError> {
    let path = meta_path(root);
    hl_fs::write_json_atomic(&path, meta).map_err(|e| SpaceError::from_io(&path, e))
}
