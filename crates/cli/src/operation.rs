//! Operations requested on the command line or listed in a batch file.

use std::path::PathBuf;

use remote::{BatchError, RemoteError, Shell};

use crate::error::CliError;

/// One operation against a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Run commands; more than one runs as a stop-at-first-failure batch.
    Run(Vec<String>),
    /// Copy a file, creating the remote directory.
    SendFile {
        /// Local source file.
        local: PathBuf,
        /// Remote destination path.
        remote: String,
    },
    /// Mirror a directory tree.
    SendDir {
        /// Local source directory.
        local: PathBuf,
        /// Remote destination directory.
        remote: String,
    },
    /// Upload, run and remove a script.
    RunShell {
        /// Local `.sh` script.
        script: PathBuf,
        /// Remote directory the script is placed in.
        remote_dir: String,
        /// Parameters appended to the invocation.
        params: Vec<String>,
    },
}

impl Operation {
    /// Applies the operation to `shell`, appending captured output to
    /// `outputs` as it becomes available.
    pub fn apply(&self, shell: &mut dyn Shell, outputs: &mut Vec<String>) -> Result<(), RemoteError> {
        match self {
            Self::Run(commands) => match commands.as_slice() {
                [command] => {
                    outputs.push(shell.run_command(command)?);
                    Ok(())
                }
                _ => {
                    let commands: Vec<&str> = commands.iter().map(String::as_str).collect();
                    collect(shell.run_commands(&commands), outputs)
                }
            },
            Self::SendFile { local, remote } => shell.send_file(local, remote),
            Self::SendDir { local, remote } => shell.send_dir(local, remote),
            Self::RunShell {
                script,
                remote_dir,
                params,
            } => {
                let params: Vec<&str> = params.iter().map(String::as_str).collect();
                collect(shell.run_shell(script, remote_dir, &params), outputs)
            }
        }
    }
}

fn collect(result: Result<Vec<String>, BatchError>, outputs: &mut Vec<String>) -> Result<(), RemoteError> {
    match result {
        Ok(batch) => {
            outputs.extend(batch);
            Ok(())
        }
        Err(error) => {
            let (batch, error) = error.into_parts();
            outputs.extend(batch);
            Err(error)
        }
    }
}

/// Parses a batch file: one operation per line.
///
/// ```text
/// # comments and blank lines are ignored
/// run systemctl stop app
/// send-file build/app /srv/app/app
/// send-dir assets /srv/app/assets
/// run-shell migrate.sh /srv/app/ --yes
/// ```
///
/// Everything after `run ` is passed to the remote shell verbatim. The other
/// operations split their arguments with POSIX shell quoting rules.
pub fn parse_batch(text: &str) -> Result<Vec<Operation>, CliError> {
    let mut operations = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let operation = parse_line(line).map_err(|message| CliError::Batch {
            line: index + 1,
            message,
        })?;
        operations.push(operation);
    }
    Ok(operations)
}

fn parse_line(line: &str) -> Result<Operation, String> {
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));
    if verb == "run" {
        if rest.is_empty() {
            return Err("`run` needs a command".to_owned());
        }
        return Ok(Operation::Run(vec![rest.to_owned()]));
    }

    let words = shell_words::split(rest).map_err(|error| error.to_string())?;
    match (verb, words.as_slice()) {
        ("send-file", [local, remote]) => Ok(Operation::SendFile {
            local: PathBuf::from(local),
            remote: remote.clone(),
        }),
        ("send-dir", [local, remote]) => Ok(Operation::SendDir {
            local: PathBuf::from(local),
            remote: remote.clone(),
        }),
        ("run-shell", [script, remote_dir, params @ ..]) => Ok(Operation::RunShell {
            script: PathBuf::from(script),
            remote_dir: remote_dir.clone(),
            params: params.to_vec(),
        }),
        ("send-file" | "send-dir", _) => Err(format!("`{verb}` takes exactly two paths")),
        ("run-shell", _) => Err("`run-shell` needs a script and a remote directory".to_owned()),
        _ => Err(format!("unknown operation `{verb}`")),
    }
}
