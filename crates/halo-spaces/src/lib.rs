//! Shared helpers used by the `halo` command-line binary.

use hl_space::{LayoutPreferences, Space, SpacePreferences};
use serde::Serialize;

/// Build-time version string.
///
/// When `HALO_VERSION` is provided in the build environment (for example by
/// CI release workflows), that value is used. Otherwise we fall back to the
/// crate package version.
pub const HALO_VERSION: &str = match option_env!("HALO_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One-line summary used by `halo list`.
pub fn format_space_line(space: &Space) -> String {
    let marker = if space.is_temp { " (temp)" } else { "" };
    format!(
        "{}  {} {}{}  {}  updated {}",
        space.id,
        space.icon,
        space.name,
        marker,
        space.path.display(),
        space.updated_at.format("%Y-%m-%d %H:%M"),
    )
}

/// Multi-line description used by `halo show`.
pub fn format_space_details(space: &Space) -> String {
    let mut out = String::new();
    out.push_str(&format!("id:       {}\n", space.id));
    out.push_str(&format!("name:     {}\n", space.name));
    out.push_str(&format!("icon:     {}\n", space.icon));
    out.push_str(&format!("path:     {}\n", space.path.display()));
    out.push_str(&format!("temp:     {}\n", space.is_temp));
    out.push_str(&format!("created:  {}\n", space.created_at.to_rfc3339()));
    out.push_str(&format!("updated:  {}\n", space.updated_at.to_rfc3339()));
    if let Some(layout) = space.preferences.as_ref().and_then(|p| p.layout.as_ref()) {
        if let Some(expanded) = layout.artifact_rail_expanded {
            let rail = if expanded { "expanded" } else { "collapsed" };
            out.push_str(&format!("rail:     {rail}\n"));
        }
        if let Some(width) = layout.chat_width {
            out.push_str(&format!("chat:     {width}px\n"));
        }
    }
    out
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Turn `halo prefs` flags into a partial update; `None` when no flag was set.
pub fn preferences_update(
    artifact_rail_expanded: Option<bool>,
    chat_width: Option<u32>,
) -> Option<SpacePreferences> {
    if artifact_rail_expanded.is_none() && chat_width.is_none() {
        return None;
    }
    Some(SpacePreferences {
        layout: Some(LayoutPreferences {
            artifact_rail_expanded,
            chat_width,
            ..Default::default()
        }),
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
