//! Operation set shared by every backend.

use std::path::Path;

use crate::error::{BatchError, RemoteError};

/// Commands, file pushes and script runs against one target.
///
/// Implemented by the per-call [`RemoteShell`](crate::RemoteShell), by the
/// [`Transaction`](crate::Transaction) handed to a transaction closure, and by
/// [`LocalShell`](crate::LocalShell).
pub trait Shell {
    /// Runs one command and returns its combined output.
    fn run_command(&mut self, command: &str) -> Result<String, RemoteError>;

    /// Runs commands in order, stopping at the first failure.
    fn run_commands(&mut self, commands: &[&str]) -> Result<Vec<String>, BatchError>;

    /// Copies a local file to `remote`, creating the remote parent directory.
    fn send_file(&mut self, local: &Path, remote: &str) -> Result<(), RemoteError>;

    /// Mirrors a local directory tree below `remote_dir`.
    fn send_dir(&mut self, local_dir: &Path, remote_dir: &str) -> Result<(), RemoteError>;

    /// Uploads a `.sh` script into `remote_dir`, runs it with `params`, and
    /// removes it afterwards.
    ///
    /// The remote script path is `remote_dir` followed directly by the script
    /// file name, so `remote_dir` should end with `/`. Fails with
    /// [`RemoteError::Format`] before connecting when `script` is not `.sh`.
    fn run_shell(
        &mut self,
        script: &Path,
        remote_dir: &str,
        params: &[&str],
    ) -> Result<Vec<String>, BatchError>;
}

/// A [`Shell`] with an identity and transaction support.
pub trait Target: Shell {
    /// `host:port` of the target.
    fn url(&self) -> String;

    /// Host of the target.
    fn ip(&self) -> String;

    /// Runs `body` with a [`Shell`] whose operations all share one connection.
    fn run_transaction<R, F>(&mut self, body: F) -> Result<R, RemoteError>
    where
        F: FnOnce(&mut dyn Shell) -> Result<R, RemoteError>,
        Self: Sized;
}
