use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::paths::ConfigPaths;
use crate::spaces::SpacesConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HaloConfig {
    #[serde(default)]
    pub spaces: SpacesConfig,
    #[serde(skip)]
    paths: Option<ConfigPaths>,
}

impl HaloConfig {
    /// Returns the `ConfigPaths` for this config. If paths haven't been set,
    /// creates the default paths (may fail if `$HOME` is unset).
    pub fn paths(&self) -> anyhow::Result<ConfigPaths> {
        match &self.paths {
            Some(p) => Ok(p.clone()),
            None => ConfigPaths::new(),
        }
    }

    /// Set a custom `ConfigPaths` (useful for testing or multi-instance).
    pub fn set_paths(&mut self, paths: ConfigPaths) {
        self.paths = Some(paths);
    }

    /// Load config from the default location (`~/.halo/config.toml`).
    pub fn load() -> anyhow::Result<Self> {
        let paths = ConfigPaths::new()?;
        Self::load_from(&paths)
    }

    /// Load config from a specific `ConfigPaths`.
    pub fn load_from(paths: &ConfigPaths) -> anyhow::Result<Self> {
        let config_file = paths.config_path();
        let mut config = if config_file.exists() {
            let content = std::fs::read_to_string(&config_file)?;
            let config: HaloConfig = toml::from_str(&content)?;
            config
        } else {
            Self::default()
        };
        config.paths = Some(paths.clone());
        config.validate()?;
        Ok(config)
    }

    /// Validate config values. Called automatically by `load` / `load_from`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.spaces.cache_capacity == 0 {
            anyhow::bail!("spaces.cache_capacity must be greater than 0");
        }
        if let Some(dir) = &self.spaces.spaces_dir {
            if !dir.is_absolute() {
                anyhow::bail!("spaces.spaces_dir must be an absolute path");
            }
        }
        Ok(())
    }

    /// Default parent directory for new spaces, honoring the config override.
    pub fn spaces_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.spaces.spaces_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.paths()?.spaces_dir()),
        }
    }
}
