use crate::error::WalkError;
use crate::walker::Walker;
use std::path::PathBuf;

/// Configures a directory enumeration rooted at a specific path.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: PathBuf,
    include_root: bool,
}

impl WalkBuilder {
    /// Creates a new builder that will traverse the provided root path.
    ///
    /// Relative roots are resolved against the current working directory when
    /// the walker is built.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            include_root: true,
        }
    }

    /// Controls whether the root entry is the first item yielded.
    ///
    /// Directory sends keep the root so the remote root directory is created
    /// before anything is copied into it.
    #[must_use]
    pub const fn include_root(mut self, include: bool) -> Self {
        self.include_root = include;
        self
    }

    /// Builds a [`Walker`] using the configured options.
    pub fn build(self) -> Result<Walker, WalkError> {
        Walker::new(self.root, self.include_root)
    }
}
