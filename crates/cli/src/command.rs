//! clap definition of the `rexec` command line.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

/// Name used in usage lines and diagnostics.
pub(crate) const PROGRAM_NAME: &str = "rexec";

pub(crate) fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run commands, push files and execute scripts on a remote host over SSH.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase diagnostic output (repeat for more).")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("local")
                .long("local")
                .help("Target this machine instead of a remote host.")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["endpoint", "host"]),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .value_name("FILE")
                .help("Read host, user and credentials from a JSON endpoint file.")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with_all(["host", "user", "identity", "password-env"]),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Remote host name or address."),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Remote SSH port.")
                .value_parser(value_parser!(u16))
                .default_value("22"),
        )
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .value_name("USER")
                .help("Remote user name."),
        )
        .arg(
            Arg::new("identity")
                .short('i')
                .long("identity")
                .value_name("KEY_FILE")
                .help("Authenticate with the private key stored in KEY_FILE.")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("password-env"),
        )
        .arg(
            Arg::new("password-env")
                .long("password-env")
                .value_name("VAR")
                .help("Authenticate with the password held in environment variable VAR."),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("Give up connecting after SECONDS.")
                .value_parser(value_parser!(u64))
                .default_value("60"),
        )
        .arg(
            Arg::new("host-fingerprint")
                .long("host-fingerprint")
                .value_name("SHA256")
                .help("Only accept a server key with this SHA-256 fingerprint (repeatable).")
                .action(ArgAction::Append),
        )
        .subcommand(
            Command::new("run")
                .about("Run one or more commands; several run as a batch that stops at the first failure.")
                .arg(
                    Arg::new("commands")
                        .value_name("COMMAND")
                        .required(true)
                        .num_args(1..)
                        .allow_hyphen_values(true),
                ),
        )
        .subcommand(
            Command::new("send-file")
                .about("Copy a local file to a remote path, creating the remote directory.")
                .arg(
                    Arg::new("local")
                        .value_name("LOCAL")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(Arg::new("remote").value_name("REMOTE").required(true)),
        )
        .subcommand(
            Command::new("send-dir")
                .about("Mirror a local directory tree below a remote directory.")
                .arg(
                    Arg::new("local")
                        .value_name("LOCAL_DIR")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(Arg::new("remote").value_name("REMOTE_DIR").required(true)),
        )
        .subcommand(
            Command::new("run-shell")
                .about("Upload a .sh script into REMOTE_DIR, run it with PARAMs, then remove it.")
                .arg(
                    Arg::new("script")
                        .value_name("SCRIPT")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(Arg::new("remote").value_name("REMOTE_DIR").required(true))
                .arg(
                    Arg::new("params")
                        .value_name("PARAM")
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true),
                ),
        )
        .subcommand(
            Command::new("batch")
                .about("Run every operation listed in FILE over a single connection.")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}
