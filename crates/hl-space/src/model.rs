use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Id of the fixed, never-registered temp space.
pub const TEMP_SPACE_ID: &str = "halo-temp";

pub(crate) const TEMP_SPACE_NAME: &str = "Halo";
pub(crate) const TEMP_SPACE_ICON: &str = "sparkles";

fn default_icon() -> String {
    "folder".to_string()
}

/// A fully materialized space: registry path plus the fields of its meta.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub path: PathBuf,
    pub is_temp: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<SpacePreferences>,
}

/// Contents of `<root>/.halo/meta.json`, authoritative for mutable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceMeta {
    pub id: String,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<SpacePreferences>,
}

impl SpaceMeta {
    /// Build the public view. The registry key wins over the id stored in
    /// the file.
    pub fn into_space(self, id: &str, path: PathBuf) -> Space {
        Space {
            id: id.to_string(),
            name: self.name,
            icon: self.icon,
            path,
            is_temp: id == TEMP_SPACE_ID,
            created_at: self.created_at,
            updated_at: self.updated_at,
            preferences: self.preferences,
        }
    }
}

/// Per-space UI preferences. Keys this crate does not know about are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpacePreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutPreferences>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_rail_expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_width: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpacePreferences {
    /// Apply a partial update.
    ///
    /// The merge is shallow at the `layout` key: fields set in
    /// `update.layout` replace stored ones, `None` fields keep the stored
    /// value. Top-level unknown keys are replaced key by key.
    pub fn merged(&self, update: SpacePreferences) -> SpacePreferences {
        let mut merged = self.clone();
        merged.extra.extend(update.extra);

        if let Some(patch) = update.layout {
            let mut layout = merged.layout.take().unwrap_or_default();
            if patch.artifact_rail_expanded.is_some() {
                layout.artifact_rail_expanded = patch.artifact_rail_expanded;
            }
            if patch.chat_width.is_some() {
                layout.chat_width = patch.chat_width;
            }
            layout.extra.extend(patch.extra);
            merged.layout = Some(layout);
        }
        merged
    }
}

/// Input for `SpaceRepository::create_space`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpace {
    pub name: String,
    pub icon: String,
    /// Adopt an existing folder instead of creating `<spaces dir>/<name>`.
    #[serde(default)]
    pub custom_path: Option<PathBuf>,
}

/// Input for `SpaceRepository::update_space`; `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSpace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}
