//! Transaction context: the operation set over one borrowed connection.

use std::path::Path;

use crate::error::{BatchError, RemoteError};
use crate::ops;
use crate::session;
use crate::shell::Shell;
use crate::transport::Connection;

/// A handle on a connection opened by
/// [`Target::run_transaction`](crate::Target::run_transaction).
///
/// The handle borrows the connection, so it cannot escape the transaction
/// closure. Each operation opens and closes its own session; the connection
/// itself is closed once the closure returns.
pub struct Transaction<'c, C: Connection> {
    connection: &'c mut C,
}

impl<'c, C: Connection> Transaction<'c, C> {
    /// Wraps an open connection.
    pub fn new(connection: &'c mut C) -> Self {
        Self { connection }
    }
}

impl<C: Connection> Shell for Transaction<'_, C> {
    fn run_command(&mut self, command: &str) -> Result<String, RemoteError> {
        session::run_command(self.connection, command)
    }

    fn run_commands(&mut self, commands: &[&str]) -> Result<Vec<String>, BatchError> {
        session::run_commands(self.connection, commands)
    }

    fn send_file(&mut self, local: &Path, remote: &str) -> Result<(), RemoteError> {
        ops::send_file(self.connection, local, remote)
    }

    fn send_dir(&mut self, local_dir: &Path, remote_dir: &str) -> Result<(), RemoteError> {
        ops::send_dir(self.connection, local_dir, remote_dir)
    }

    fn run_shell(
        &mut self,
        script: &Path,
        remote_dir: &str,
        params: &[&str],
    ) -> Result<Vec<String>, BatchError> {
        let destination = ops::script_destination(script, remote_dir)?;
        ops::run_script(self.connection, script, &destination, params)
    }
}
