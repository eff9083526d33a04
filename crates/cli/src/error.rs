use std::io;
use std::path::PathBuf;

use remote::RemoteError;

/// Exit code for usage and configuration problems.
pub const EXIT_USAGE: i32 = 1;
/// Exit code for connection and authentication failures.
pub const EXIT_CONNECT: i32 = 2;
/// Exit code for a remote command failure without a usable exit code.
pub const EXIT_COMMAND: i32 = 3;
/// Exit code for file transfer failures.
pub const EXIT_TRANSFER: i32 = 4;

/// Failure of one `rexec` invocation.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid or incomplete arguments.
    #[error("{0}")]
    Usage(String),

    /// A file named on the command line could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    ReadFile {
        /// File that failed.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },

    /// The endpoint file is not a valid description.
    #[error("invalid endpoint file '{}': {source}", path.display())]
    EndpointFile {
        /// File that failed.
        path: PathBuf,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A batch file line could not be parsed.
    #[error("batch line {line}: {message}")]
    Batch {
        /// One-based line number.
        line: usize,
        /// What is wrong with the line.
        message: String,
    },

    /// The operation failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Captured output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl CliError {
    /// Process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Remote(error) => remote_exit_code(error),
            Self::Usage(_)
            | Self::ReadFile { .. }
            | Self::EndpointFile { .. }
            | Self::Batch { .. }
            | Self::Output(_) => EXIT_USAGE,
        }
    }
}

fn remote_exit_code(error: &RemoteError) -> i32 {
    if error.is_connect_failure() {
        return EXIT_CONNECT;
    }
    match error {
        RemoteError::Command { status, .. } => status
            .code()
            .and_then(|code| i32::try_from(code).ok())
            .filter(|code| (1..=255).contains(code))
            .unwrap_or(EXIT_COMMAND),
        RemoteError::Session(_) => EXIT_COMMAND,
        RemoteError::CopyProtocol { .. } | RemoteError::LocalFile { .. } | RemoteError::Walk(_) => {
            EXIT_TRANSFER
        }
        _ => EXIT_USAGE,
    }
}
