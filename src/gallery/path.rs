use super::{GalleryError, RelPath};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The configured gallery directory, in both its absolute and canonical forms.
#[derive(Debug, Clone)]
pub struct ContentRoot {
    path: PathBuf,
    canonical: PathBuf,
}

impl ContentRoot {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let path = std::path::absolute(&directory).unwrap_or(directory);
        let canonical = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        Self { path, canonical }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn absolute(&self, rel: &RelPath) -> PathBuf {
        rel.to_fs_path(&self.path)
    }

    /// Map an untrusted URL segment to a directory inside the root.
    ///
    /// Any `..` component rejects the whole input, as does a target that is
    /// missing, not a directory, or whose canonical location is outside the root.
    pub fn resolve(&self, input: &str) -> Result<RelPath, GalleryError> {
        let rel = normalize(input)?;
        let full_path = self.absolute(&rel);

        if !full_path.starts_with(&self.path) {
            warn!("Path escapes content root: {:?}", input);
            return Err(GalleryError::InvalidPath);
        }

        let metadata = std::fs::metadata(&full_path).map_err(|e| {
            debug!("Cannot stat {:?}: {}", full_path, e);
            GalleryError::NotFound
        })?;

        if !metadata.is_dir() {
            return Err(GalleryError::NotFound);
        }

        if !self.contains_target(&full_path) {
            warn!("Symlinked path leaves content root: {:?}", input);
            return Err(GalleryError::InvalidPath);
        }

        Ok(rel)
    }

    /// True when the fully-resolved location of `path` is inside the root.
    pub(crate) fn contains_target(&self, path: &Path) -> bool {
        match std::fs::canonicalize(path) {
            Ok(canonical) => canonical.starts_with(&self.canonical),
            Err(_) => false,
        }
    }

    /// Entries reached through a symlink must still land inside the root.
    /// Plain entries of a contained directory are contained by construction.
    pub(crate) fn admits_entry(&self, path: &Path) -> bool {
        match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => self.contains_target(path),
            Ok(_) => true,
            Err(_) => false,
        }
    }
}

/// Lexical normalization: drop empty and `.` segments, refuse `..`.
pub(crate) fn normalize(input: &str) -> Result<RelPath, GalleryError> {
    let mut components = Vec::new();

    for component in input.split(['/', '\\']) {
        match component {
            "" | "." => continue,
            ".." => return Err(GalleryError::InvalidPath),
            c if c.contains('\0') => return Err(GalleryError::InvalidPath),
            c => components.push(c),
        }
    }

    Ok(RelPath::from_components(components))
}
