use serde::Serialize;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// `<path>.tmp`, the staging file used by the atomic writers.
pub fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("file"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to a `.tmp` sibling and rename it over `path`.
///
/// The parent directory is created when missing. On failure the staging
/// file is removed best-effort and the original error is returned; the
/// previous contents of `path` are left untouched.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = tmp_sibling(path);
    let result = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, path));
    if let Err(e) = result {
        if let Err(cleanup) = std::fs::remove_file(&tmp) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                tracing::debug!(
                    path = %tmp.display(),
                    error = %cleanup,
                    "Failed to remove temp file after aborted write"
                );
            }
        }
        return Err(e);
    }
    Ok(())
}

/// Pretty-print `value` as JSON and write it atomically to `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    write_bytes_atomic(path, json.as_bytes())
}
