//! Operations shared by the per-call facade and the transaction context.
//!
//! Every function here runs on a connection that is already open and never
//! closes it.

use std::path::{MAIN_SEPARATOR, Path};

use crate::copy::copy_path;
use crate::error::{BatchError, RemoteError};
use crate::session::{run_command, run_commands, with_session};
use crate::transport::Connection;

/// Suffix a script must carry to be accepted by [`run_script`].
pub const SCRIPT_SUFFIX: &str = ".sh";

/// Converts a path to forward-slash form.
#[must_use]
pub fn to_slash(path: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        path.to_owned()
    } else {
        path.replace(MAIN_SEPARATOR, "/")
    }
}

/// Remote parent directory of `remote`: the text before the last `/`.
///
/// Returns `None` when `remote` has no `/`, and `/` when the only slash is
/// the leading one.
#[must_use]
pub fn remote_parent(remote: &str) -> Option<&str> {
    match remote.rfind('/') {
        Some(0) => Some("/"),
        Some(index) => Some(&remote[..index]),
        None => None,
    }
}

/// `mkdir -p <dir>` with `dir` quoted for the remote shell.
#[must_use]
pub fn mkdir_command(dir: &str) -> String {
    format!("mkdir -p {}", shell_words::quote(dir))
}

/// Remote location of an enumerated entry: `remote_dir` followed by the
/// entry's path below the local root, in forward-slash form.
#[must_use]
pub fn remote_entry_path(remote_dir: &str, suffix: &Path) -> String {
    let mut remote = remote_dir.to_owned();
    if !suffix.as_os_str().is_empty() {
        if !remote.ends_with('/') && !remote.ends_with(MAIN_SEPARATOR) {
            remote.push(MAIN_SEPARATOR);
        }
        remote.push_str(&suffix.to_string_lossy());
    }
    to_slash(&remote)
}

/// Validates `script` and computes its remote destination, `remote_dir`
/// immediately followed by the script's file name.
///
/// # Errors
///
/// [`RemoteError::Format`] unless the path as given ends in `.sh`. A
/// trailing separator or `/.` is not stripped first.
pub fn script_destination(script: &Path, remote_dir: &str) -> Result<String, RemoteError> {
    let format = || RemoteError::Format {
        path: script.to_path_buf(),
    };
    if !script.as_os_str().to_string_lossy().ends_with(SCRIPT_SUFFIX) {
        return Err(format());
    }
    let name = script
        .file_name()
        .map(|name| name.to_string_lossy())
        .filter(|name| name.ends_with(SCRIPT_SUFFIX))
        .ok_or_else(format)?;
    Ok(format!("{}{name}", to_slash(remote_dir)))
}

/// The four-step batch that prepares, runs and removes an uploaded script.
#[must_use]
pub fn script_batch(destination: &str, params: &[&str]) -> [String; 4] {
    let quoted = shell_words::quote(destination);
    let mut invocation = quoted.to_string();
    for param in params {
        invocation.push(' ');
        invocation.push_str(param);
    }
    [
        format!("chmod a+x {quoted}"),
        format!("sed -i 's/\\r$//' {quoted}"),
        invocation,
        format!("rm -f {quoted}"),
    ]
}

/// Creates the parent directory of `remote` and copies `local` there.
pub fn send_file<C: Connection>(
    connection: &mut C,
    local: &Path,
    remote: &str,
) -> Result<(), RemoteError> {
    let remote = to_slash(remote);
    if let Some(dir) = remote_parent(&remote) {
        run_command(connection, &mkdir_command(dir))?;
    }
    copy_file(connection, local, &remote)
}

/// Mirrors `local_dir` below `remote_dir`, stopping at the first failure.
///
/// Entries already created remotely are left in place when a later one fails.
pub fn send_dir<C: Connection>(
    connection: &mut C,
    local_dir: &Path,
    remote_dir: &str,
) -> Result<(), RemoteError> {
    let list = walk::enumerate(local_dir)?;
    for entry in list.entries() {
        let remote = remote_entry_path(remote_dir, list.suffix(entry));
        if entry.is_dir() {
            run_command(connection, &mkdir_command(&remote))?;
        } else {
            copy_file(connection, entry.path(), &remote)?;
        }
    }
    Ok(())
}

/// Uploads `script` to `destination` and runs the cleanup batch.
///
/// The destination directory is not created. A failing step skips the rest
/// of the batch, so a failed invocation leaves the script on the remote host.
pub fn run_script<C: Connection>(
    connection: &mut C,
    script: &Path,
    destination: &str,
    params: &[&str],
) -> Result<Vec<String>, BatchError> {
    copy_file(connection, script, destination)?;
    run_commands(connection, &script_batch(destination, params))
}

fn copy_file<C: Connection>(connection: &mut C, local: &Path, remote: &str) -> Result<(), RemoteError> {
    with_session(connection, |session| copy_path(session, local, remote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parent_is_text_before_last_slash() {
        assert_eq!(remote_parent("/remote/dir/a.txt"), Some("/remote/dir"));
        assert_eq!(remote_parent("/a.txt"), Some("/"));
        assert_eq!(remote_parent("relative/a.txt"), Some("relative"));
        assert_eq!(remote_parent("a.txt"), None);
    }

    #[test]
    fn mkdir_quotes_only_when_needed() {
        assert_eq!(mkdir_command("/remote/dir"), "mkdir -p /remote/dir");
        assert_eq!(mkdir_command("/remote/my dir"), "mkdir -p '/remote/my dir'");
    }

    #[test]
    fn entry_paths_replace_the_local_root() {
        assert_eq!(remote_entry_path("/srv/app", Path::new("")), "/srv/app");
        assert_eq!(
            remote_entry_path("/srv/app", &PathBuf::from("bin").join("run.sh")),
            "/srv/app/bin/run.sh"
        );
        assert_eq!(remote_entry_path("/srv/app/", Path::new("a")), "/srv/app/a");
    }

    #[test]
    fn script_destination_requires_sh_suffix() {
        let error = script_destination(Path::new("deploy.py"), "/tmp/").expect_err("format");
        assert!(matches!(error, RemoteError::Format { .. }));
        assert!(script_destination(Path::new("sh"), "/tmp/").is_err());
        assert!(script_destination(Path::new("job.sh/"), "/tmp/").is_err());
        assert!(script_destination(Path::new("job.sh/."), "/tmp/").is_err());
        assert_eq!(
            script_destination(Path::new("scripts/deploy.sh"), "/tmp/").expect("dest"),
            "/tmp/deploy.sh"
        );
    }

    #[test]
    fn script_batch_has_fixed_order() {
        let batch = script_batch("/tmp/deploy.sh", &["--force", "prod"]);
        assert_eq!(
            batch,
            [
                "chmod a+x /tmp/deploy.sh".to_owned(),
                "sed -i 's/\\r$//' /tmp/deploy.sh".to_owned(),
                "/tmp/deploy.sh --force prod".to_owned(),
                "rm -f /tmp/deploy.sh".to_owned(),
            ]
        );
    }
}
