//! Session runner: one session per logical operation.
//!
//! Only the session is released here. The connection it came from stays open
//! for the next operation and is closed by the orchestrator's guard.

use logging::trace_cmd;

use crate::error::{BatchError, RemoteError};
use crate::guard::SessionGuard;
use crate::transport::{CombinedOutput, Connection, Session};

/// Opens a session on `connection`, hands it to `operation`, and closes it
/// on every exit path.
///
/// # Errors
///
/// [`RemoteError::Session`] when the session cannot be opened, otherwise the
/// error returned by `operation`.
pub fn with_session<C, T, F>(connection: &mut C, operation: F) -> Result<T, RemoteError>
where
    C: Connection,
    F: FnOnce(&mut C::Session) -> Result<T, RemoteError>,
{
    let session = connection.open_session().map_err(RemoteError::Session)?;
    let mut guard = SessionGuard::new(session);
    operation(&mut *guard)
}

/// Runs `command` and returns its combined standard output and error.
///
/// # Errors
///
/// A non-zero exit yields [`RemoteError::Command`] carrying the output that
/// was captured.
pub fn run_command<C: Connection>(connection: &mut C, command: &str) -> Result<String, RemoteError> {
    with_session(connection, |session| {
        trace_cmd!(command, "running");
        let CombinedOutput { output, status } = session
            .combined_output(command)
            .map_err(RemoteError::Session)?;
        let output = String::from_utf8_lossy(&output).into_owned();
        trace_cmd!(command, %status, bytes = output.len(), "finished");
        if status.success() {
            Ok(output)
        } else {
            Err(RemoteError::Command {
                command: command.to_owned(),
                status,
                output,
            })
        }
    })
}

/// Runs `commands` in order, each in its own session, and stops at the first
/// failure. Commands after a failure are never started.
///
/// # Errors
///
/// A [`BatchError`] holding the outputs of the commands that succeeded and
/// the failure of the one that did not.
pub fn run_commands<C, S>(connection: &mut C, commands: &[S]) -> Result<Vec<String>, BatchError>
where
    C: Connection,
    S: AsRef<str>,
{
    let mut outputs = Vec::with_capacity(commands.len());
    for command in commands {
        match run_command(connection, command.as_ref()) {
            Ok(output) => outputs.push(output),
            Err(error) => return Err(BatchError::new(outputs, error)),
        }
    }
    Ok(outputs)
}
