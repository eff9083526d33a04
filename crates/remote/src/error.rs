//! Error types for the remote execution core.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use walk::WalkError;

use crate::transport::ExitStatus;

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// I/O failure on the underlying socket or pipe.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The dial did not complete within the configured timeout.
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The host identity verifier refused the server's key.
    #[error("host key for {0} was rejected")]
    HostKeyRejected(String),

    /// Every offered authentication method was refused.
    #[error("authentication rejected for user '{0}'")]
    AuthRejected(String),

    /// Key material could not be decoded.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// Protocol-level failure described by the backend.
    #[error("{0}")]
    Protocol(String),

    /// Error raised by the embedded SSH client.
    #[cfg(feature = "embedded-ssh")]
    #[error(transparent)]
    Ssh(#[from] russh::Error),
}

/// Errors surfaced by every remote operation.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Network or authentication failure while dialing.
    #[error("failed to connect to {address}: {source}")]
    Dial {
        /// `host:port` that was dialed.
        address: String,
        /// Transport failure.
        #[source]
        source: TransportError,
    },

    /// The key file was read but does not hold a usable private key.
    #[error("failed to parse private key '{}': {source}", path.display())]
    AuthParse {
        /// Key file that failed to parse.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: TransportError,
    },

    /// The key file could not be read.
    #[error("failed to read private key '{}': {source}", path.display())]
    KeyRead {
        /// Key file that could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },

    /// An authentication mode name that is not recognised.
    #[error("does not support mode: {0}")]
    UnsupportedMode(String),

    /// A remote command exited unsuccessfully.
    #[error("remote command `{command}` failed with {status}")]
    Command {
        /// Command line as sent to the remote interpreter.
        command: String,
        /// Exit status reported by the remote side.
        status: ExitStatus,
        /// Combined output captured before the failure was reported.
        output: String,
    },

    /// Writing the copy exchange failed part-way.
    #[error("copy to '{destination}' failed: {source}")]
    CopyProtocol {
        /// Remote destination path of the copy.
        destination: String,
        /// Underlying write or read failure.
        #[source]
        source: io::Error,
    },

    /// A script path without the `.sh` suffix was given to `run_shell`.
    #[error("not a shell script (expected `.sh` suffix): {}", path.display())]
    Format {
        /// Rejected script path.
        path: PathBuf,
    },

    /// A local source file is missing or unreadable.
    #[error("cannot read local file '{}': {source}", path.display())]
    LocalFile {
        /// Local path that failed.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },

    /// Opening or driving a session failed.
    #[error("session failure: {0}")]
    Session(#[source] TransportError),

    /// Enumerating a local directory failed.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The backend intentionally does not implement the operation.
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        /// Backend name.
        backend: &'static str,
        /// Operation name.
        operation: &'static str,
    },
}

impl RemoteError {
    /// Returns the captured output when the error is a failed command.
    #[must_use]
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Self::Command { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Reports whether the error happened before a connection was established.
    #[must_use]
    pub const fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            Self::Dial { .. } | Self::AuthParse { .. } | Self::KeyRead { .. } | Self::UnsupportedMode(_)
        )
    }

    pub(crate) fn local_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LocalFile {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a command batch: the outputs gathered before the failure plus the
/// error that stopped the batch.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct BatchError {
    outputs: Vec<String>,
    error: RemoteError,
}

impl BatchError {
    /// Creates a batch failure.
    #[must_use]
    pub fn new(outputs: Vec<String>, error: RemoteError) -> Self {
        Self { outputs, error }
    }

    /// Outputs of the commands that completed before the failure.
    #[must_use]
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// The error that stopped the batch.
    #[must_use]
    pub fn error(&self) -> &RemoteError {
        &self.error
    }

    /// Splits the failure into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, RemoteError) {
        (self.outputs, self.error)
    }
}

impl From<RemoteError> for BatchError {
    fn from(error: RemoteError) -> Self {
        Self::new(Vec::new(), error)
    }
}

impl From<BatchError> for RemoteError {
    fn from(batch: BatchError) -> Self {
        batch.error
    }
}
