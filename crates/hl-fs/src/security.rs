use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("Path must be absolute: {0}")]
    RelativePath(PathBuf),
    #[error("Path is outside every allowed root: {0}")]
    OutsideAllowedRoots(PathBuf),
    #[error("Path has `..` after a component that does not exist: {0}")]
    PathTraversal(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FsError::RelativePath(_) => "PATH_NOT_ABSOLUTE",
            FsError::OutsideAllowedRoots(_) => "PATH_OUTSIDE_ALLOWED_ROOTS",
            FsError::PathTraversal(_) => "PATH_TRAVERSAL",
            FsError::Io(_) => "FS_IO_ERROR",
        }
    }
}

/// Resolve `path` to the location a filesystem write would actually land on.
///
/// Every existing prefix is canonicalized as it is walked, so symlinks are
/// followed before a later `..` is applied. Once a component does not exist
/// the rest of the path is appended as is and may not contain `..`, since
/// climbing back into existing directories would skip their symlinks.
/// Dangling symlinks surface as `FsError::Io`.
pub fn resolve_path(path: &Path) -> Result<PathBuf, FsError> {
    if !path.is_absolute() {
        return Err(FsError::RelativePath(path.to_path_buf()));
    }

    let mut resolved = PathBuf::new();
    let mut on_disk = true;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir if !on_disk => {
                return Err(FsError::PathTraversal(path.to_path_buf()));
            }
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if on_disk {
                    if std::fs::symlink_metadata(&resolved).is_ok() {
                        resolved = std::fs::canonicalize(&resolved)?;
                    } else {
                        on_disk = false;
                    }
                }
            }
        }
    }

    if on_disk {
        // Catches a bare root or a path made only of `..`.
        if let Ok(canonical) = std::fs::canonicalize(&resolved) {
            resolved = canonical;
        }
    }
    Ok(resolved)
}

/// Allow-list of directories that writes and deletes may target.
///
/// Roots are resolved once at construction; a candidate is accepted when its
/// resolved form equals a root or lies strictly beneath one.
#[derive(Debug, Clone, Default)]
pub struct PathAuthority {
    roots: Vec<PathBuf>,
}

impl PathAuthority {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut resolved_roots = Vec::new();
        for root in roots {
            let root = root.as_ref();
            match resolve_path(root) {
                Ok(resolved) => {
                    if !resolved_roots.contains(&resolved) {
                        resolved_roots.push(resolved);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %root.display(),
                        error = %e,
                        "Skipping unresolvable allow-list root"
                    );
                }
            }
        }
        Self {
            roots: resolved_roots,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Returns the resolved target when it falls inside an allowed root.
    pub fn authorize(&self, candidate: &Path) -> Result<PathBuf, FsError> {
        let resolved = resolve_path(candidate)?;
        // `starts_with` compares whole components, so `/a/bc` is not under `/a/b`.
        if self.roots.iter().any(|root| resolved.starts_with(root)) {
            Ok(resolved)
        } else {
            tracing::warn!(
                path = %candidate.display(),
                resolved = %resolved.display(),
                "Rejected path outside allowed roots"
            );
            Err(FsError::OutsideAllowedRoots(candidate.to_path_buf()))
        }
    }

    pub fn is_allowed(&self, candidate: &Path) -> bool {
        self.authorize(candidate).is_ok()
    }
}
