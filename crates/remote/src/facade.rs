//! Per-call remote facade.

use std::path::Path;
use std::sync::Arc;

use logging::trace_connect;

use crate::connector::Connector;
use crate::endpoint::RemoteEndpoint;
use crate::error::{BatchError, RemoteError};
use crate::host_key::HostKeyVerifier;
use crate::ops;
use crate::session;
use crate::shell::{Shell, Target};
use crate::transaction::Transaction;
use crate::transport::Transport;

/// Remote target where every operation dials its own connection.
///
/// Use [`Target::run_transaction`] to share one connection between several
/// operations.
///
/// ```no_run
/// # #[cfg(feature = "embedded-ssh")]
/// # fn main() -> Result<(), remote::RemoteError> {
/// use remote::{RemoteEndpoint, RemoteShell, Shell};
///
/// let endpoint = RemoteEndpoint::builder("10.0.0.5", "deploy")
///     .key_file("/home/deploy/.ssh/id_ed25519")
///     .build()?;
/// let mut shell = RemoteShell::new(endpoint);
/// let uptime = shell.run_command("uptime")?;
/// print!("{uptime}");
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "embedded-ssh"))]
/// # fn main() {}
/// ```
pub struct RemoteShell<T: Transport> {
    connector: Connector<T>,
}

#[cfg(feature = "embedded-ssh")]
impl RemoteShell<crate::ssh::SshTransport> {
    /// Facade over the embedded SSH transport.
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self::with_transport(endpoint, crate::ssh::SshTransport::new())
    }
}

impl<T: Transport> RemoteShell<T> {
    /// Facade over a caller-supplied transport.
    pub fn with_transport(endpoint: RemoteEndpoint, transport: T) -> Self {
        Self {
            connector: Connector::new(endpoint, transport),
        }
    }

    /// Replaces the default accept-any host key policy.
    #[must_use]
    pub fn with_host_key_verifier(self, verifier: Arc<dyn HostKeyVerifier>) -> Self {
        Self {
            connector: self.connector.with_verifier(verifier),
        }
    }

    /// The endpoint this facade targets.
    pub const fn endpoint(&self) -> &RemoteEndpoint {
        self.connector.endpoint()
    }

    /// The transport used for dialing.
    pub const fn transport(&self) -> &T {
        self.connector.transport()
    }
}

impl<T: Transport> Shell for RemoteShell<T> {
    fn run_command(&mut self, command: &str) -> Result<String, RemoteError> {
        self.connector
            .connect(|connection| session::run_command(connection, command))
    }

    fn run_commands(&mut self, commands: &[&str]) -> Result<Vec<String>, BatchError> {
        self.connector
            .connect(|connection| session::run_commands(connection, commands))
    }

    fn send_file(&mut self, local: &Path, remote: &str) -> Result<(), RemoteError> {
        self.connector
            .connect(|connection| ops::send_file(connection, local, remote))
    }

    fn send_dir(&mut self, local_dir: &Path, remote_dir: &str) -> Result<(), RemoteError> {
        self.connector
            .connect(|connection| ops::send_dir(connection, local_dir, remote_dir))
    }

    fn run_shell(
        &mut self,
        script: &Path,
        remote_dir: &str,
        params: &[&str],
    ) -> Result<Vec<String>, BatchError> {
        // Rejected before any dial.
        let destination = ops::script_destination(script, remote_dir)?;
        self.connector
            .connect(|connection| ops::run_script(connection, script, &destination, params))
    }
}

impl<T: Transport> Target for RemoteShell<T> {
    fn url(&self) -> String {
        self.endpoint().address()
    }

    fn ip(&self) -> String {
        self.endpoint().host().to_owned()
    }

    fn run_transaction<R, F>(&mut self, body: F) -> Result<R, RemoteError>
    where
        F: FnOnce(&mut dyn Shell) -> Result<R, RemoteError>,
    {
        self.connector.connect(|connection| {
            trace_connect!("transaction started");
            let mut transaction = Transaction::new(connection);
            body(&mut transaction)
        })
    }
}
