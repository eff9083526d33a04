#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `rexec` command line: run commands, push files and
//! directory trees, and execute scripts on a remote host over SSH, or on this
//! machine with `--local`.
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for standard
//! output and error so the binary and the tests drive the exact same code. A
//! [`clap`](https://docs.rs/clap/) builder definition parses the arguments into
//! an [`Operation`] (or a batch of them read from a file) and the connection
//! settings. Operations run against any [`remote::Target`]; a batch runs inside
//! one transaction so every step shares a single connection.
//!
//! # Errors
//!
//! Failures are reported on standard error as `rexec: <message>` and mapped to
//! exit codes: `1` usage or configuration, `2` connection or authentication,
//! `3` remote command failure (the remote exit code is passed through when it
//! lies in `1..=255`), `4` transfer failure.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["rexec", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8_lossy(&stdout).starts_with("rexec "));
//! ```

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use clap::error::ErrorKind;
use logging::{VerbosityConfig, init_tracing};
use remote::{
    EndpointConfig, LocalShell, PinnedFingerprint, RemoteEndpoint, RemoteShell, Target, Transport,
};

mod command;
mod error;
mod operation;

pub use error::{CliError, EXIT_COMMAND, EXIT_CONNECT, EXIT_TRANSFER, EXIT_USAGE};
pub use operation::{Operation, parse_batch};


/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// What the invocation asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Plan {
    Single(Operation),
    Batch(PathBuf),
}

/// Where to connect and how to authenticate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ConnectionArgs {
    endpoint_file: Option<PathBuf>,
    host: Option<String>,
    port: u16,
    user: Option<String>,
    identity: Option<PathBuf>,
    password_env: Option<String>,
    timeout: u64,
    fingerprints: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ParsedArgs {
    verbose: u8,
    local: bool,
    connection: ConnectionArgs,
    plan: Plan,
}

/// Runs the command line described by `arguments`.
///
/// Captured command output is written to `stdout`; diagnostics go to
/// `stderr`. Returns the process exit code.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(arguments) {
        Ok(parsed) => parsed,
        Err(error) => return report_clap_error(&error, stdout, stderr),
    };
    init_tracing(VerbosityConfig::from_verbose_level(parsed.verbose));

    match dispatch(&parsed, stdout) {
        Ok(()) => 0,
        Err(error) => {
            let _ = writeln!(stderr, "{}: {error}", command::PROGRAM_NAME);
            error.exit_code()
        }
    }
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

fn report_clap_error<Out: Write, Err: Write>(
    error: &clap::Error,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32 {
    let rendered = error.render().to_string();
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = stdout.write_all(rendered.as_bytes());
            0
        }
        _ => {
            let _ = stderr.write_all(rendered.as_bytes());
            EXIT_USAGE
        }
    }
}

fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from(command::PROGRAM_NAME));
    }

    let mut matches = command::clap_command().try_get_matches_from(args)?;
    let connection = ConnectionArgs {
        endpoint_file: matches.remove_one::<PathBuf>("endpoint"),
        host: matches.remove_one::<String>("host"),
        port: matches.remove_one::<u16>("port").unwrap_or(remote::DEFAULT_PORT),
        user: matches.remove_one::<String>("user"),
        identity: matches.remove_one::<PathBuf>("identity"),
        password_env: matches.remove_one::<String>("password-env"),
        timeout: matches
            .remove_one::<u64>("timeout")
            .unwrap_or(remote::DEFAULT_TIMEOUT.as_secs()),
        fingerprints: matches
            .remove_many::<String>("host-fingerprint")
            .map(Iterator::collect)
            .unwrap_or_default(),
    };
    let verbose = matches.get_count("verbose");
    let local = matches.get_flag("local");
    let plan = match matches.remove_subcommand() {
        Some((name, sub)) => plan_from(&name, sub),
        None => None,
    };
    let plan = plan.ok_or_else(|| {
        command::clap_command().error(ErrorKind::MissingSubcommand, "a subcommand is required")
    })?;

    Ok(ParsedArgs {
        verbose,
        local,
        connection,
        plan,
    })
}

fn plan_from(name: &str, mut sub: ArgMatches) -> Option<Plan> {
    let strings = |sub: &mut ArgMatches, id: &str| -> Vec<String> {
        sub.remove_many::<String>(id)
            .map(Iterator::collect)
            .unwrap_or_default()
    };
    let operation = match name {
        "run" => Operation::Run(strings(&mut sub, "commands")),
        "send-file" => Operation::SendFile {
            local: sub.remove_one::<PathBuf>("local")?,
            remote: sub.remove_one::<String>("remote")?,
        },
        "send-dir" => Operation::SendDir {
            local: sub.remove_one::<PathBuf>("local")?,
            remote: sub.remove_one::<String>("remote")?,
        },
        "run-shell" => Operation::RunShell {
            script: sub.remove_one::<PathBuf>("script")?,
            remote_dir: sub.remove_one::<String>("remote")?,
            params: strings(&mut sub, "params"),
        },
        "batch" => return sub.remove_one::<PathBuf>("file").map(Plan::Batch),
        _ => return None,
    };
    Some(Plan::Single(operation))
}

fn dispatch<Out: Write>(parsed: &ParsedArgs, stdout: &mut Out) -> Result<(), CliError> {
    let operations = match &parsed.plan {
        Plan::Single(operation) => vec![operation.clone()],
        Plan::Batch(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::ReadFile {
                path: path.clone(),
                source,
            })?;
            parse_batch(&text)?
        }
    };
    let batch = matches!(parsed.plan, Plan::Batch(_));

    if parsed.local {
        return execute(&mut LocalShell::new(), &operations, batch, stdout);
    }
    dispatch_remote(&parsed.connection, &operations, batch, stdout)
}

#[cfg(feature = "embedded-ssh")]
fn dispatch_remote<Out: Write>(
    connection: &ConnectionArgs,
    operations: &[Operation],
    batch: bool,
    stdout: &mut Out,
) -> Result<(), CliError> {
    execute_remote(connection, remote::ssh::SshTransport::new(), operations, batch, stdout)
}

#[cfg(not(feature = "embedded-ssh"))]
fn dispatch_remote<Out: Write>(
    _connection: &ConnectionArgs,
    _operations: &[Operation],
    _batch: bool,
    _stdout: &mut Out,
) -> Result<(), CliError> {
    Err(CliError::Usage(
        "this build has no SSH transport; use --local".to_owned(),
    ))
}

#[cfg_attr(not(feature = "embedded-ssh"), allow(dead_code))]
fn execute_remote<T: Transport, Out: Write>(
    connection: &ConnectionArgs,
    transport: T,
    operations: &[Operation],
    batch: bool,
    stdout: &mut Out,
) -> Result<(), CliError> {
    let endpoint = connection.endpoint()?;
    let mut shell = RemoteShell::with_transport(endpoint, transport);
    if !connection.fingerprints.is_empty() {
        let pinned = PinnedFingerprint::new(&connection.fingerprints);
        shell = shell.with_host_key_verifier(Arc::new(pinned));
    }
    execute(&mut shell, operations, batch, stdout)
}

/// Runs `operations` against `target`, printing captured output in order.
///
/// A batch runs inside one transaction; otherwise the single operation dials
/// on its own. Output gathered before a failure is printed too, followed by
/// the failing command's output when there is one.
fn execute<T: Target, Out: Write>(
    target: &mut T,
    operations: &[Operation],
    batch: bool,
    stdout: &mut Out,
) -> Result<(), CliError> {
    let mut outputs = Vec::new();
    let result = if batch {
        target.run_transaction(|shell| {
            operations
                .iter()
                .try_for_each(|operation| operation.apply(shell, &mut outputs))
        })
    } else {
        operations
            .iter()
            .try_for_each(|operation| operation.apply(target, &mut outputs))
    };

    for output in &outputs {
        stdout.write_all(output.as_bytes()).map_err(CliError::Output)?;
    }
    if let Some(output) = result.as_ref().err().and_then(|error| error.command_output()) {
        stdout.write_all(output.as_bytes()).map_err(CliError::Output)?;
    }
    stdout.flush().map_err(CliError::Output)?;
    result.map_err(CliError::from)
}

impl ConnectionArgs {
    fn endpoint(&self) -> Result<RemoteEndpoint, CliError> {
        if let Some(path) = &self.endpoint_file {
            let text = fs::read_to_string(path).map_err(|source| CliError::ReadFile {
                path: path.clone(),
                source,
            })?;
            let config = EndpointConfig::from_json(&text).map_err(|source| CliError::EndpointFile {
                path: path.clone(),
                source,
            })?;
            return Ok(config.into_endpoint()?);
        }

        let host = self.host.as_deref().ok_or_else(|| {
            CliError::Usage("--host is required unless --endpoint or --local is given".to_owned())
        })?;
        let user = self
            .user
            .as_deref()
            .ok_or_else(|| CliError::Usage("--user is required with --host".to_owned()))?;
        let builder = RemoteEndpoint::builder(host, user)
            .port(self.port)
            .timeout(Duration::from_secs(self.timeout));
        let builder = match (&self.identity, &self.password_env) {
            (Some(key), _) => builder.key_file(key),
            (None, Some(variable)) => {
                let password = std::env::var(variable).map_err(|_| {
                    CliError::Usage(format!("environment variable {variable} is not set"))
                })?;
                builder.password(password)
            }
            (None, None) => {
                return Err(CliError::Usage(
                    "one of --identity or --password-env is required".to_owned(),
                ));
            }
        };
        Ok(builder.build()?)
    }
}
