//! Skill file storage confined to known space roots.

use hl_fs::PathAuthority;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::SpaceError;
use crate::meta;
use crate::repository::SpaceRepository;

/// Saves and deletes skill files under the global skills directory or a
/// registered space's `.halo/skills`, and nowhere else.
pub struct SkillStore {
    repository: Arc<SpaceRepository>,
    global_dir: PathBuf,
}

impl SkillStore {
    pub fn new(repository: Arc<SpaceRepository>, global_dir: PathBuf) -> Self {
        Self {
            repository,
            global_dir,
        }
    }

    /// Allow-list built from the repository's current roots. Rebuilt on
    /// every call so deleted spaces stop being writable immediately.
    pub fn authority(&self) -> PathAuthority {
        let mut roots = vec![self.global_dir.clone()];
        roots.extend(
            self.repository
                .get_all_space_paths()
                .iter()
                .map(|path| meta::skills_dir(path)),
        );
        PathAuthority::new(roots)
    }

    /// The global directory for `None`, otherwise `<space root>/.halo/skills`.
    pub fn skills_dir(&self, space_id: Option<&str>) -> Result<PathBuf, SpaceError> {
        match space_id {
            None => Ok(self.global_dir.clone()),
            Some(id) => Ok(meta::skills_dir(&self.repository.get_space(id)?.path)),
        }
    }

    /// Entry names in the skills directory, sorted; empty when absent.
    pub fn list(&self, space_id: Option<&str>) -> Result<Vec<String>, SpaceError> {
        let dir = self.skills_dir(space_id)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SpaceError::from_io(&dir, e)),
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn save(&self, target: &Path, contents: &[u8]) -> Result<PathBuf, SpaceError> {
        let resolved = self.authority().authorize(target)?;
        hl_fs::write_bytes_atomic(&resolved, contents)
            .map_err(|e| SpaceError::from_io(&resolved, e))?;
        tracing::info!(path = %resolved.display(), "Saved skill file");
        Ok(resolved)
    }

    pub fn delete(&self, target: &Path) -> Result<(), SpaceError> {
        let resolved = self.authority().authorize(target)?;
        let result = if resolved.is_dir() {
            std::fs::remove_dir_all(&resolved)
        } else {
            std::fs::remove_file(&resolved)
        };
        result.map_err(|e| SpaceError::from_io(&resolved, e))?;
        tracing::info!(path = %resolved.display(), "Deleted skill file");
        Ok(())
    }
}
