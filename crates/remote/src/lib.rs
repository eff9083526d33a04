#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Overview
//!
//! `remote` runs shell commands, pushes files and directory trees, and executes
//! uploaded scripts on a host reachable over SSH. The same operation set is
//! available for the local machine so callers can target either through the
//! [`Shell`] and [`Target`] traits.
//!
//! # Design
//!
//! - [`Connector`] resolves credentials, dials through a [`Transport`], and
//!   scopes the resulting connection to one callback. The connection is closed
//!   exactly once when the callback returns.
//! - [`session::with_session`] opens one session per logical operation and
//!   closes only that session, so a connection can carry many operations.
//! - [`copy`] encodes the `scp -t` sink exchange: a header line, exactly the
//!   announced number of bytes, and a terminating NUL.
//! - [`RemoteShell`] dials once per call. [`Target::run_transaction`] dials once
//!   and hands a [`Transaction`] to the closure so every operation inside it
//!   shares that connection.
//! - [`LocalShell`] implements the same traits over a local interpreter.
//!
//! The production transport is [`ssh::SshTransport`] (feature `embedded-ssh`,
//! enabled by default). Tests substitute an in-memory transport.
//!
//! # Invariants
//!
//! - A session never outlives its connection; both are released from `Drop`
//!   guards on every exit path.
//! - The copy encoder writes exactly the size it announced or fails with
//!   [`RemoteError::CopyProtocol`].
//! - `run_commands` never starts a command after one has failed.
//! - `run_shell` rejects scripts without the `.sh` suffix before dialing.
//! - Host keys are accepted unconditionally unless a [`HostKeyVerifier`] is
//!   installed.
//!
//! # Examples
//!
//! ```no_run
//! # #[cfg(feature = "embedded-ssh")]
//! # fn main() -> Result<(), remote::RemoteError> {
//! use std::path::Path;
//! use remote::{RemoteEndpoint, RemoteShell, Shell, Target};
//!
//! let endpoint = RemoteEndpoint::builder("10.0.0.5", "deploy")
//!     .password("secret")
//!     .build()?;
//! let mut shell = RemoteShell::new(endpoint);
//! shell.run_transaction(|tx| {
//!     tx.send_file(Path::new("build/app.tar.gz"), "/srv/app/app.tar.gz")?;
//!     tx.run_command("tar -xzf /srv/app/app.tar.gz -C /srv/app")?;
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "embedded-ssh"))]
//! # fn main() {}
//! ```

pub mod copy;
mod connector;
mod endpoint;
mod error;
mod facade;
mod guard;
mod host_key;
mod local;
pub mod ops;
pub mod session;
mod shell;
#[cfg(feature = "embedded-ssh")]
#[cfg_attr(docsrs, doc(cfg(feature = "embedded-ssh")))]
pub mod ssh;
mod transaction;
mod transport;

pub use connector::Connector;
pub use endpoint::{
    AuthMode, Credentials, DEFAULT_PORT, DEFAULT_TIMEOUT, EndpointConfig, RemoteEndpoint,
    RemoteEndpointBuilder,
};
pub use error::{BatchError, RemoteError, TransportError};
pub use facade::RemoteShell;
pub use guard::{ConnectionGuard, SessionGuard};
pub use host_key::{AcceptAnyHostKey, HostIdentity, HostKeyVerifier, PinnedFingerprint};
pub use local::{LOCAL_FILE_MODE, LocalShell};
pub use shell::{Shell, Target};
pub use transaction::Transaction;
pub use transport::{
    AuthMethod, CombinedOutput, Connection, DialRequest, ExitStatus, InputPipe, Session, Transport,
};
