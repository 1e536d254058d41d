use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_cache_capacity() -> usize {
    10
}

/// `[spaces]` table of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacesConfig {
    /// Number of materialized spaces kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Overrides `<data root>/spaces` as the default parent for new spaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spaces_dir: Option<PathBuf>,
}

impl Default for SpacesConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            spaces_dir: None,
        }
    }
}
