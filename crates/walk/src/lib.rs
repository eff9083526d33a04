#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` enumerates a local directory tree into a flat, ordered list of
//! absolute paths tagged with whether each entry is a directory. Directory
//! sends replay that list against a remote root: every directory becomes a
//! `mkdir -p`, every other entry becomes a file copy. Because a directory is
//! always listed before anything inside it, replaying the list in order never
//! copies a file into a directory that has not been created yet.
//!
//! # Design
//!
//! - [`WalkBuilder`] configures the traversal root and whether the root itself
//!   is emitted.
//! - [`Walker`] implements [`Iterator`] and yields [`PathEntry`] values in
//!   depth-first pre-order. Directory contents are sorted by file name before
//!   they are yielded, so the sequence does not depend on the filesystem's
//!   native iteration order.
//! - [`PathList`] is the collected result of [`enumerate`]: the absolute root
//!   plus every entry beneath it, with [`PathList::suffix`] recovering the part
//!   of an entry's path that follows the root.
//! - [`WalkError`] records the path that failed together with the underlying
//!   [`io::Error`](std::io::Error).
//!
//! # Invariants
//!
//! - Every emitted path is absolute and starts with the enumerated root.
//! - Symbolic links are reported as non-directory entries and never descended
//!   into, so traversal cannot loop.
//! - Traversal stops at the first failure; no entry is yielded after an error.
//!
//! # Examples
//!
//! ```
//! use std::fs;
//! use std::path::Path;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let root = temp.path().join("site");
//! fs::create_dir_all(root.join("css"))?;
//! fs::write(root.join("index.html"), b"<html/>")?;
//! fs::write(root.join("css/main.css"), b"body{}")?;
//!
//! let list = walk::enumerate(&root)?;
//! let suffixes: Vec<_> = list
//!     .entries()
//!     .iter()
//!     .map(|entry| (list.suffix(entry).to_path_buf(), entry.is_dir()))
//!     .collect();
//!
//! assert_eq!(suffixes[0], (Path::new("").to_path_buf(), true));
//! assert_eq!(suffixes[1], (Path::new("css").to_path_buf(), true));
//! assert_eq!(suffixes[2], (Path::new("css/main.css").to_path_buf(), false));
//! assert_eq!(suffixes[3], (Path::new("index.html").to_path_buf(), false));
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod builder;
mod entry;
mod error;
mod list;
mod walker;

pub use builder::WalkBuilder;
pub use entry::PathEntry;
pub use error::{WalkError, WalkErrorKind};
pub use list::{PathList, enumerate};
pub use walker::Walker;

#[cfg(test)]
mod tests;
