use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the data root.
pub const DATA_DIR_ENV: &str = "HALO_DATA_DIR";

/// Holds a configurable base directory for every file the space registry
/// touches outside of the spaces themselves.
///
/// Use `ConfigPaths::new()` for production (resolves `$HALO_DATA_DIR`, then
/// `~/.halo`), or `ConfigPaths::with_base()` for testing with an isolated
/// directory.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    base: PathBuf,
}

impl ConfigPaths {
    /// Create paths rooted at `$HALO_DATA_DIR` or `~/.halo`. Returns an error
    /// if neither is available.
    pub fn new() -> anyhow::Result<Self> {
        if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self {
                base: PathBuf::from(dir),
            });
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self {
            base: home.join(".halo"),
        })
    }

    /// Create paths rooted at a custom base directory (useful for tests).
    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_dir(&self) -> &Path {
        &self.base
    }

    pub fn config_path(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    /// The id -> path index file.
    pub fn index_path(&self) -> PathBuf {
        self.base.join("spaces-index.json")
    }

    /// Default parent directory for spaces created without a custom path.
    pub fn spaces_dir(&self) -> PathBuf {
        self.base.join("spaces")
    }

    /// Root of the always-available temp space.
    pub fn temp_space_dir(&self) -> PathBuf {
        self.base.join("temp")
    }

    /// Skills shared by every space.
    pub fn global_skills_dir(&self) -> PathBuf {
        self.base.join("skills")
    }

    /// Ensure the config directory exists, creating it if necessary.
    pub fn ensure_config_dir(&self) -> anyhow::Result<PathBuf> {
        if !self.base.exists() {
            std::fs::create_dir_all(&self.base)?;
        }
        Ok(self.base.clone())
    }
}
