use std::fs;
use std::path::Path;
use std::sync::Arc;

use remote::{PinnedFingerprint, RemoteEndpoint, RemoteError, RemoteShell, Shell, Target, TransportError};
use test_support::{AuthKind, Event, SCRIPTED_FINGERPRINT, ScriptedTransport, temp_tree, write_file};

fn shell(transport: &ScriptedTransport) -> RemoteShell<ScriptedTransport> {
    let endpoint = RemoteEndpoint::builder("10.1.2.3", "deploy")
        .port(2222)
        .password("secret")
        .build()
        .expect("endpoint");
    RemoteShell::with_transport(endpoint, transport.clone())
}

#[test]
fn run_command_dials_once_and_closes_everything() {
    let transport = ScriptedTransport::new();
    transport.respond("uptime", " 10:00 up 3 days\n");

    let output = shell(&transport).run_command("uptime").expect("uptime");
    assert_eq!(output, " 10:00 up 3 days\n");
    assert_eq!(
        transport.events(),
        vec![
            Event::Dial {
                address: "10.1.2.3:2222".to_owned(),
                user: "deploy".to_owned(),
                auth: vec![AuthKind::Password],
            },
            Event::OpenSession,
            Event::Exec("uptime".to_owned()),
            Event::CloseSession,
            Event::CloseConnection,
        ]
    );
}

#[test]
fn failed_command_carries_captured_output() {
    let transport = ScriptedTransport::new();
    transport.fail("make", 2, "make: *** No targets.\n");

    let error = shell(&transport).run_command("make").expect_err("make fails");
    assert_eq!(error.command_output(), Some("make: *** No targets.\n"));
    assert!(matches!(
        error,
        RemoteError::Command { ref status, .. } if status.code() == Some(2)
    ));
    assert_eq!(transport.connection_closes(), 1);
    assert_eq!(transport.sessions_closed(), 1);
}

#[test]
fn run_commands_stops_at_first_failure() {
    let transport = ScriptedTransport::new();
    transport
        .respond("echo a", "a\n")
        .fail("false", 1, "")
        .respond("echo c", "c\n");

    let error = shell(&transport)
        .run_commands(&["echo a", "false", "echo c"])
        .expect_err("batch fails");
    assert_eq!(error.outputs(), ["a\n".to_owned()]);
    assert!(matches!(error.error(), RemoteError::Command { command, .. } if command == "false"));
    assert_eq!(transport.commands(), vec!["echo a", "false"]);
    assert_eq!(transport.dials(), 1);
}

#[test]
fn run_commands_returns_every_output_on_success() {
    let transport = ScriptedTransport::new();
    transport.respond("echo a", "a\n").respond("echo b", "b\n");

    let outputs = shell(&transport)
        .run_commands(&["echo a", "echo b"])
        .expect("batch");
    assert_eq!(outputs, vec!["a\n", "b\n"]);
    assert_eq!(transport.sessions_opened(), 2);
    assert_eq!(transport.sessions_closed(), 2);
}

#[cfg(unix)]
#[test]
fn send_file_creates_parent_then_copies() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().expect("tempdir");
    let local = write_file(temp.path(), "a.txt", b"hello world").expect("write");
    fs::set_permissions(&local, fs::Permissions::from_mode(0o640)).expect("chmod");
    let transport = ScriptedTransport::new();

    shell(&transport)
        .send_file(&local, "/remote/dir/a.txt")
        .expect("send_file");

    assert_eq!(
        transport.remote_effects(),
        vec!["exec:mkdir -p /remote/dir", "copy:scp -t /remote/dir/a.txt"]
    );
    let copies = transport.copies();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].name, "a.txt");
    assert_eq!(copies[0].mode, 0o640);
    assert_eq!(copies[0].size, 11);
    assert_eq!(copies[0].content, b"hello world");
    assert!(copies[0].terminated);
    assert_eq!(transport.dials(), 1);
    assert_eq!(transport.connection_closes(), 1);
}

#[test]
fn send_file_without_slash_skips_mkdir() {
    let temp = tempfile::tempdir().expect("tempdir");
    let local = write_file(temp.path(), "notes.txt", b"x").expect("write");
    let transport = ScriptedTransport::new();

    shell(&transport).send_file(&local, "notes.txt").expect("send_file");
    assert_eq!(transport.remote_effects(), vec!["copy:scp -t notes.txt"]);
}

#[test]
fn send_file_reports_missing_local_file() {
    let transport = ScriptedTransport::new();
    let error = shell(&transport)
        .send_file(Path::new("/definitely/missing.txt"), "/tmp/missing.txt")
        .expect_err("missing source");
    assert!(matches!(error, RemoteError::LocalFile { .. }));
    assert!(transport.copies().is_empty());
    assert_eq!(transport.connection_closes(), 1);
}

#[test]
fn failing_receiver_is_a_command_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let local = write_file(temp.path(), "a.txt", b"data").expect("write");
    let transport = ScriptedTransport::new();
    transport.receiver_exit(1);

    let error = shell(&transport)
        .send_file(&local, "/ro/a.txt")
        .expect_err("receiver fails");
    assert!(matches!(error, RemoteError::Command { command, .. } if command == "scp -t /ro/a.txt"));
    assert_eq!(transport.sessions_opened(), transport.sessions_closed());
}

#[test]
fn send_dir_visits_entries_in_enumeration_order() {
    let tree = temp_tree(&[
        ("app/bin/run", &b"#!/bin/sh\n"[..]),
        ("app/conf/", &b""[..]),
        ("app/readme.md", &b"docs"[..]),
    ])
    .expect("tree");
    let transport = ScriptedTransport::new();

    shell(&transport)
        .send_dir(&tree.path().join("app"), "/srv/app")
        .expect("send_dir");

    assert_eq!(
        transport.remote_effects(),
        vec![
            "exec:mkdir -p /srv/app",
            "exec:mkdir -p /srv/app/bin",
            "copy:scp -t /srv/app/bin/run",
            "exec:mkdir -p /srv/app/conf",
            "copy:scp -t /srv/app/readme.md",
        ]
    );
    let names: Vec<String> = transport.copies().into_iter().map(|copy| copy.name).collect();
    assert_eq!(names, vec!["run", "readme.md"]);
    assert_eq!(transport.dials(), 1);
}

#[test]
fn send_dir_stops_at_first_failure_without_rollback() {
    let tree = temp_tree(&[("site/a/", &b""[..]), ("site/b/", &b""[..])]).expect("tree");
    let transport = ScriptedTransport::new();
    transport.fail("mkdir -p /www/a", 1, "permission denied\n");

    let error = shell(&transport)
        .send_dir(&tree.path().join("site"), "/www")
        .expect_err("mkdir fails");
    assert_eq!(error.command_output(), Some("permission denied\n"));
    assert_eq!(transport.commands(), vec!["mkdir -p /www", "mkdir -p /www/a"]);
    assert_eq!(transport.connection_closes(), 1);
}

#[test]
fn send_dir_missing_root_is_a_walk_error() {
    let transport = ScriptedTransport::new();
    let error = shell(&transport)
        .send_dir(Path::new("/no/such/tree"), "/srv")
        .expect_err("missing tree");
    assert!(matches!(error, RemoteError::Walk(_)));
    assert!(transport.remote_effects().is_empty());
}

#[test]
fn run_shell_rejects_non_script_before_dialing() {
    let transport = ScriptedTransport::new();
    let error = shell(&transport)
        .run_shell(Path::new("deploy.py"), "/tmp/", &[])
        .expect_err("format");
    assert!(matches!(error.error(), RemoteError::Format { .. }));
    assert!(error.outputs().is_empty());
    assert!(transport.events().is_empty());
}

#[test]
fn run_shell_checks_suffix_of_the_path_as_given() {
    let transport = ScriptedTransport::new();
    let mut shell = shell(&transport);
    for script in ["/tmp/job.sh/", "job.sh/."] {
        let error = shell
            .run_shell(Path::new(script), "/tmp/", &[])
            .expect_err("trailing separator");
        assert!(matches!(error.error(), RemoteError::Format { .. }), "{script}");
    }
    assert!(transport.events().is_empty());
}

#[test]
fn run_shell_runs_the_fixed_batch() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = write_file(temp.path(), "deploy.sh", b"echo deployed\r\n").expect("write");
    let transport = ScriptedTransport::new();
    transport.respond("/opt/jobs/deploy.sh prod --fast", "deployed\n");

    let outputs = shell(&transport)
        .run_shell(&script, "/opt/jobs/", &["prod", "--fast"])
        .expect("run_shell");

    assert_eq!(outputs, vec!["", "", "deployed\n", ""]);
    assert_eq!(
        transport.remote_effects(),
        vec![
            "copy:scp -t /opt/jobs/deploy.sh",
            "exec:chmod a+x /opt/jobs/deploy.sh",
            "exec:sed -i 's/\\r$//' /opt/jobs/deploy.sh",
            "exec:/opt/jobs/deploy.sh prod --fast",
            "exec:rm -f /opt/jobs/deploy.sh",
        ]
    );
    assert_eq!(transport.dials(), 1);
}

#[test]
fn failed_script_skips_cleanup() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = write_file(temp.path(), "job.sh", b"exit 4\n").expect("write");
    let transport = ScriptedTransport::new();
    transport.fail("/tmp/job.sh", 4, "boom\n");

    let error = shell(&transport)
        .run_shell(&script, "/tmp/", &[])
        .expect_err("script fails");
    assert_eq!(error.outputs(), ["".to_owned(), "".to_owned()]);
    assert_eq!(error.error().command_output(), Some("boom\n"));
    assert!(!transport.commands().iter().any(|command| command.starts_with("rm -f")));
}

#[test]
fn run_shell_surfaces_dial_failures() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = write_file(temp.path(), "job.sh", b"true\n").expect("write");
    let transport = ScriptedTransport::new();
    transport.fail_dial("connection refused");

    let error = shell(&transport)
        .run_shell(&script, "/tmp/", &[])
        .expect_err("dial fails");
    assert!(matches!(
        error.error(),
        RemoteError::Dial { address, source: TransportError::Protocol(_) } if address == "10.1.2.3:2222"
    ));
    assert!(error.error().is_connect_failure());
}

#[test]
fn pinned_fingerprint_gates_the_dial() {
    let transport = ScriptedTransport::new();
    let mut pinned = shell(&transport)
        .with_host_key_verifier(Arc::new(PinnedFingerprint::new(["SHA256:someone-else"])));
    let error = pinned.run_command("true").expect_err("rejected");
    assert!(matches!(
        error,
        RemoteError::Dial { source: TransportError::HostKeyRejected(_), .. }
    ));
    assert_eq!(transport.dials(), 0);

    let mut trusted =
        shell(&transport).with_host_key_verifier(Arc::new(PinnedFingerprint::new([SCRIPTED_FINGERPRINT])));
    trusted.run_command("true").expect("accepted");
    assert_eq!(transport.dials(), 1);
}

#[test]
fn target_identity_comes_from_the_endpoint() {
    let transport = ScriptedTransport::new();
    let target = shell(&transport);
    assert_eq!(target.url(), "10.1.2.3:2222");
    assert_eq!(target.ip(), "10.1.2.3");
}
