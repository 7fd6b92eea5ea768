//! Filesystem access confined to the application root.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ResolutionError;

/// Read-only file access for content sources.
pub trait FileSystem: Send + Sync {
    /// Check whether `path` resolves to a readable file.
    fn exists(&self, path: &Path) -> bool;

    /// Read the file at `path`.
    fn read(&self, path: &Path) -> Result<Vec<u8>, ResolutionError>;
}

/// Local filesystem rooted at the application root.
///
/// Relative paths are joined to the root and may not contain `..`.
/// Absolute paths must point inside the root unless `trust_absolute` is set,
/// in which case they are treated as pre-resolved by trusted configuration.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
    trust_absolute: bool,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            trust_absolute: false,
        }
    }

    /// Accept absolute paths outside the root.
    pub fn trust_absolute_paths(mut self, trust: bool) -> Self {
        self.trust_absolute = trust;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a configured path onto the filesystem, enforcing the sandbox.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, ResolutionError> {
        if path.as_os_str().is_empty() {
            return Err(ResolutionError::NotFound("empty path".to_string()));
        }

        if path.is_absolute() {
            if self.trust_absolute {
                return Ok(path.to_path_buf());
            }
            return self.confine(path.to_path_buf(), path);
        }

        // Reject directory traversal before touching the filesystem
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            warn!(path = %path.display(), "rejected path with parent directory component");
            return Err(ResolutionError::NotFound(path.display().to_string()));
        }

        self.confine(self.root.join(path), path)
    }

    /// Ensure `candidate` lies inside the root, following symlinks when the
    /// file exists.
    fn confine(&self, candidate: PathBuf, requested: &Path) -> Result<PathBuf, ResolutionError> {
        let outside = || {
            warn!(
                path = %requested.display(),
                root = %self.root.display(),
                "rejected path outside application root"
            );
            ResolutionError::NotFound(requested.display().to_string())
        };

        let (Ok(root), Ok(resolved)) = (self.root.canonicalize(), candidate.canonicalize()) else {
            // Nothing to follow: compare lexically.
            if candidate.starts_with(&self.root)
                && !candidate.components().any(|c| c == Component::ParentDir)
            {
                return Ok(candidate);
            }
            return Err(outside());
        };

        if resolved.starts_with(&root) {
            Ok(resolved)
        } else {
            Err(outside())
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_ok_and(|p| p.is_file())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, ResolutionError> {
        let resolved = self.resolve(path)?;
        let data = std::fs::read(&resolved).map_err(|e| {
            debug!(path = %resolved.display(), error = %e, "content file not readable");
            ResolutionError::NotFound(path.display().to_string())
        })?;
        debug!(path = %resolved.display(), size = data.len(), "content file read");
        Ok(data)
    }
}
