//! Capability traits the core consumes from a secure transport.
//!
//! The core never talks to sockets directly. It dials through a [`Transport`],
//! opens one [`Session`] per logical operation on the resulting
//! [`Connection`], and either captures a command's combined output or drives a
//! copy receiver through the session's [`InputPipe`]. The production
//! implementation lives in [`crate::ssh`]; tests substitute a scripted
//! transport that records every call.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::error::TransportError;
use crate::host_key::HostKeyVerifier;

/// Exit status of a remote process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitStatus {
    code: Option<u32>,
}

impl ExitStatus {
    /// Status carrying an explicit exit code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        Self { code: Some(code) }
    }

    /// Status of a process that ended without reporting a code (for example
    /// when it was killed by a signal or the channel closed early).
    #[must_use]
    pub const fn unknown() -> Self {
        Self { code: None }
    }

    /// The reported exit code, if any.
    #[must_use]
    pub const fn code(self) -> Option<u32> {
        self.code
    }

    /// `true` only for an explicit exit code of zero.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => f.write_str("no exit status"),
        }
    }
}

/// Output captured from a command with standard output and standard error
/// merged in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinedOutput {
    /// Captured bytes.
    pub output: Vec<u8>,
    /// Exit status reported by the remote side.
    pub status: ExitStatus,
}

/// One resolved authentication method handed to [`Transport::dial`].
pub enum AuthMethod<K> {
    /// Password authentication.
    Password(Zeroizing<String>),
    /// Public-key authentication with an already parsed private key.
    PublicKey(K),
}

impl<K> fmt::Debug for AuthMethod<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::PublicKey(_) => f.write_str("PublicKey(<redacted>)"),
        }
    }
}

/// Everything a transport needs to establish one connection.
pub struct DialRequest<K> {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Remote principal.
    pub user: String,
    /// Methods to try, in order.
    pub auth: Vec<AuthMethod<K>>,
    /// Upper bound for connect + handshake + authentication.
    pub timeout: Duration,
    /// Trust decision for the server's host key.
    pub verifier: Arc<dyn HostKeyVerifier>,
}

impl<K> DialRequest<K> {
    /// `host:port` form used in diagnostics.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dials authenticated connections.
pub trait Transport {
    /// Parsed private key type accepted by [`AuthMethod::PublicKey`].
    type Key;
    /// Connection type produced by [`dial`](Self::dial).
    type Connection: Connection;

    /// Decodes private key material (for example an OpenSSH PEM block).
    fn parse_private_key(&self, material: &str) -> Result<Self::Key, TransportError>;

    /// Establishes and authenticates a connection.
    fn dial(&self, request: DialRequest<Self::Key>) -> Result<Self::Connection, TransportError>;
}

/// A live, authenticated link to one endpoint.
pub trait Connection {
    /// Session type multiplexed over this connection.
    type Session: Session;

    /// Opens a new session scoped to one operation.
    fn open_session(&mut self) -> Result<Self::Session, TransportError>;

    /// Tears the connection down. Consumes the connection so it cannot be reused.
    fn close(self);
}

/// One logical channel that runs exactly one remote command.
pub trait Session: Send {
    /// Runs `command` and captures standard output and standard error together.
    fn combined_output(&mut self, command: &str) -> Result<CombinedOutput, TransportError>;

    /// Returns a writer feeding the standard input of the command started by
    /// [`start`](Self::start). The writer is independent of the session borrow
    /// so it can be driven while another thread blocks in [`wait`](Self::wait).
    fn input_pipe(&mut self) -> Result<Box<dyn InputPipe>, TransportError>;

    /// Starts `command` without waiting for it to finish.
    fn start(&mut self, command: &str) -> Result<(), TransportError>;

    /// Blocks until the started command exits.
    fn wait(&mut self) -> Result<ExitStatus, TransportError>;

    /// Closes the session.
    fn close(self);
}

/// Write half feeding a remote process.
pub trait InputPipe: Write + Send {
    /// Flushes pending bytes and signals end-of-input to the remote process.
    fn close(self: Box<Self>) -> std::io::Result<()>;
}
