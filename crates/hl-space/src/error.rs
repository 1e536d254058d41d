use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    #[error("Space not found: {0}")]
    NotFound(String),
    #[error("Path does not exist: {0}")]
    Missing(PathBuf),
    #[error("Corrupt space metadata at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Operation not permitted on the temp space")]
    TempSpace,
    #[error("Invalid space name: {0:?}")]
    InvalidName(String),
    #[error("Path must be absolute: {0}")]
    InvalidPath(PathBuf),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Fs(#[from] hl_fs::FsError),
}

impl SpaceError {
    /// Classify an IO failure on `path`.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SpaceError::Missing(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                SpaceError::PermissionDenied(path.to_path_buf())
            }
            _ => SpaceError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// True for failures that mean the space's metadata is gone or unusable,
    /// as opposed to a transient read problem.
    pub fn is_dead_metadata(&self) -> bool {
        matches!(self, SpaceError::Missing(_) | SpaceError::Corrupt { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SpaceError::NotFound(_) => "SPACE_NOT_FOUND",
            SpaceError::Missing(_) => "SPACE_PATH_MISSING",
            SpaceError::Corrupt { .. } => "SPACE_META_CORRUPT",
            SpaceError::PermissionDenied(_) => "SPACE_PERMISSION_DENIED",
            SpaceError::TempSpace => "SPACE_TEMP_IMMUTABLE",
            SpaceError::InvalidName(_) => "SPACE_INVALID_NAME",
            SpaceError::InvalidPath(_) => "SPACE_INVALID_PATH",
            SpaceError::Io { .. } => "SPACE_IO_ERROR",
            SpaceError::Fs(e) => e.error_code(),
        }
    }
}
