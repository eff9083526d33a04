use crate::builder::WalkBuilder;
use crate::entry::PathEntry;
use crate::error::WalkError;
use logging::trace_flist;
use std::path::{Path, PathBuf};

/// Flat, ordered enumeration of one directory tree.
#[derive(Clone, Debug)]
pub struct PathList {
    root: PathBuf,
    entries: Vec<PathEntry>,
}

impl PathList {
    /// Returns the absolute root the list was enumerated from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the entries in enumeration order, the root first.
    #[must_use]
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// Returns the part of `entry`'s path that follows the root.
    ///
    /// The root entry itself yields an empty path. Entries that do not live
    /// under the root (which [`enumerate`] never produces) are returned whole.
    #[must_use]
    pub fn suffix<'a>(&self, entry: &'a PathEntry) -> &'a Path {
        entry.path().strip_prefix(&self.root).unwrap_or(entry.path())
    }

    /// Number of entries, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for PathList {
    type Item = PathEntry;
    type IntoIter = std::vec::IntoIter<PathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Enumerates `dir` into a [`PathList`].
///
/// The root is resolved to an absolute path and emitted first. When `dir` is a
/// regular file the list contains only that file.
pub fn enumerate(dir: impl AsRef<Path>) -> Result<PathList, WalkError> {
    let walker = WalkBuilder::new(dir.as_ref()).build()?;
    let root = walker.root().to_path_buf();
    let entries = walker.collect::<Result<Vec<_>, _>>()?;
    trace_flist!("enumerated {} entries under {:?}", entries.len(), root);
    Ok(PathList { root, entries })
}
