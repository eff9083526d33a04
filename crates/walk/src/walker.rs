use crate::entry::PathEntry;
use crate::error::WalkError;
use logging::trace_flist;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Depth-first, pre-order iterator over a directory tree.
pub struct Walker {
    root: PathBuf,
    pending_root: Option<bool>,
    stack: Vec<DirectoryState>,
    finished: bool,
}

impl Walker {
    pub(crate) fn new(root: PathBuf, include_root: bool) -> Result<Self, WalkError> {
        let root = absolutize(root)?;
        trace_flist!("enumerating {:?}", root);

        let metadata = fs::symlink_metadata(&root)
            .map_err(|error| WalkError::root_metadata(root.clone(), error))?;
        let root_is_dir = metadata.file_type().is_dir();

        let mut stack = Vec::new();
        if root_is_dir {
            stack.push(DirectoryState::read(root.clone())?);
        }

        Ok(Self {
            root,
            pending_root: include_root.then_some(root_is_dir),
            stack,
            finished: false,
        })
    }

    /// Returns the absolute root of the traversal.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn prepare_entry(&mut self, path: PathBuf) -> Result<PathEntry, WalkError> {
        let metadata =
            fs::symlink_metadata(&path).map_err(|error| WalkError::metadata(path.clone(), error))?;
        let is_dir = metadata.file_type().is_dir();
        if is_dir {
            self.stack.push(DirectoryState::read(path.clone())?);
        }
        Ok(PathEntry { path, is_dir })
    }
}

impl Iterator for Walker {
    type Item = Result<PathEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Some(is_dir) = self.pending_root.take() {
            return Some(Ok(PathEntry {
                path: self.root.clone(),
                is_dir,
            }));
        }

        loop {
            let state = self.stack.last_mut()?;
            let Some(name) = state.next_name() else {
                self.stack.pop();
                continue;
            };
            let path = state.path.join(name);

            return match self.prepare_entry(path) {
                Ok(entry) => Some(Ok(entry)),
                Err(error) => {
                    self.finished = true;
                    Some(Err(error))
                }
            };
        }
    }
}

struct DirectoryState {
    path: PathBuf,
    names: std::vec::IntoIter<OsString>,
}

impl DirectoryState {
    fn read(path: PathBuf) -> Result<Self, WalkError> {
        let mut names = Vec::new();
        let read_dir =
            fs::read_dir(&path).map_err(|error| WalkError::read_dir(path.clone(), error))?;
        for entry in read_dir {
            let entry = entry.map_err(|error| WalkError::read_dir_entry(path.clone(), error))?;
            names.push(entry.file_name());
        }
        names.sort();

        trace_flist!("found {} entries in {:?}", names.len(), path);

        Ok(Self {
            path,
            names: names.into_iter(),
        })
    }

    fn next_name(&mut self) -> Option<OsString> {
        self.names.next()
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf, WalkError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = env::current_dir().map_err(|error| WalkError::current_dir(path.clone(), error))?;
        // Collecting components drops interior `.` segments (`./dir` -> `dir`).
        Ok(cwd.join(path).components().collect())
    }
}
