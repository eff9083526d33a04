use std::path::{Path, PathBuf};

/// One enumerated filesystem entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathEntry {
    pub(crate) path: PathBuf,
    pub(crate) is_dir: bool,
}

impl PathEntry {
    /// Creates an entry from an absolute path and its directory flag.
    #[must_use]
    pub fn new(path: PathBuf, is_dir: bool) -> Self {
        Self { path, is_dir }
    }

    /// Returns the absolute local path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reports whether the entry is a directory (symlinks never are).
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Consumes the entry and returns the owned path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}
