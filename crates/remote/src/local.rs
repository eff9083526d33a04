//! Local backend: the operation set against this machine.
//!
//! Commands go to `bash -c` (PowerShell on Windows) with standard output and
//! standard error written into one pipe. Directory sends, script runs and
//! transactions are not provided here and report [`RemoteError::Unsupported`].

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use logging::trace_cmd;

use crate::error::{BatchError, RemoteError, TransportError};
use crate::shell::{Shell, Target};
use crate::transport::ExitStatus;

const BACKEND: &str = "local";

/// Mode given to files written by [`LocalShell::send_file`].
pub const LOCAL_FILE_MODE: u32 = 0o644;

/// Runs operations on the local machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalShell;

impl LocalShell {
    /// Creates the local backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn execute(command: &str) -> io::Result<(Vec<u8>, ExitStatus)> {
        let (mut reader, writer) = io::pipe()?;
        let mut child = {
            let mut process = interpreter(command);
            process
                .stdin(Stdio::null())
                .stdout(writer.try_clone()?)
                .stderr(writer);
            process.spawn()?
            // `process` drops here, releasing the parent's write ends.
        };
        let mut output = Vec::new();
        reader.read_to_end(&mut output)?;
        let status = child.wait()?;
        let status = status
            .code()
            .and_then(|code| u32::try_from(code).ok())
            .map_or_else(ExitStatus::unknown, ExitStatus::from_code);
        Ok((output, status))
    }
}

#[cfg(windows)]
fn interpreter(command: &str) -> Command {
    let mut process = Command::new("powershell");
    process.arg(command);
    process
}

#[cfg(not(windows))]
fn interpreter(command: &str) -> Command {
    let mut process = Command::new("bash");
    process.arg("-c").arg(command);
    process
}

fn unsupported(operation: &'static str) -> RemoteError {
    RemoteError::Unsupported {
        backend: BACKEND,
        operation,
    }
}

impl Shell for LocalShell {
    fn run_command(&mut self, command: &str) -> Result<String, RemoteError> {
        trace_cmd!(command, "running locally");
        let (output, status) =
            Self::execute(command).map_err(|error| RemoteError::Session(TransportError::Io(error)))?;
        let output = String::from_utf8_lossy(&output).into_owned();
        if status.success() {
            Ok(output)
        } else {
            Err(RemoteError::Command {
                command: command.to_owned(),
                status,
                output,
            })
        }
    }

    fn run_commands(&mut self, commands: &[&str]) -> Result<Vec<String>, BatchError> {
        let mut outputs = Vec::with_capacity(commands.len());
        for command in commands {
            match self.run_command(command) {
                Ok(output) => outputs.push(output),
                Err(error) => return Err(BatchError::new(outputs, error)),
            }
        }
        Ok(outputs)
    }

    fn send_file(&mut self, local: &Path, remote: &str) -> Result<(), RemoteError> {
        let contents = fs::read(local).map_err(|error| RemoteError::local_file(local, error))?;
        let destination = Path::new(remote);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(LOCAL_FILE_MODE);
        }
        options
            .open(destination)
            .and_then(|mut file| file.write_all(&contents))
            .map_err(|error| RemoteError::local_file(destination, error))
    }

    fn send_dir(&mut self, _local_dir: &Path, _remote_dir: &str) -> Result<(), RemoteError> {
        Err(unsupported("send_dir"))
    }

    fn run_shell(
        &mut self,
        _script: &Path,
        _remote_dir: &str,
        _params: &[&str],
    ) -> Result<Vec<String>, BatchError> {
        Err(unsupported("run_shell").into())
    }
}

impl Target for LocalShell {
    fn url(&self) -> String {
        "localhost".to_owned()
    }

    fn ip(&self) -> String {
        "localhost".to_owned()
    }

    fn run_transaction<R, F>(&mut self, _body: F) -> Result<R, RemoteError>
    where
        F: FnOnce(&mut dyn Shell) -> Result<R, RemoteError>,
    {
        Err(unsupported("run_transaction"))
    }
}
