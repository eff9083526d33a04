use remote::{RemoteEndpoint, RemoteError, RemoteShell, Shell, Target};
use test_support::{Event, ScriptedTransport, temp_tree, write_file};

fn shell(transport: &ScriptedTransport) -> RemoteShell<ScriptedTransport> {
    let endpoint = RemoteEndpoint::builder("build-01", "ci")
        .password("pw")
        .build()
        .expect("endpoint");
    RemoteShell::with_transport(endpoint, transport.clone())
}

#[test]
fn many_operations_share_one_connection() {
    let tree = temp_tree(&[("pkg/lib.so", &b"\x7fELF"[..]), ("job.sh", &b"true\n"[..])])
        .expect("tree");
    let transport = ScriptedTransport::new();
    transport.respond("ls /opt/pkg", "lib.so\n");

    let listing = shell(&transport)
        .run_transaction(|tx| {
            tx.send_file(&tree.path().join("job.sh"), "/opt/job.sh")?;
            tx.send_dir(&tree.path().join("pkg"), "/opt/pkg")?;
            tx.run_commands(&["sync", "sync"])?;
            tx.run_shell(&tree.path().join("job.sh"), "/opt/", &[])?;
            tx.run_command("ls /opt/pkg")
        })
        .expect("transaction");

    assert_eq!(listing, "lib.so\n");
    assert_eq!(transport.dials(), 1);
    assert_eq!(transport.connection_closes(), 1);
    assert_eq!(transport.sessions_opened(), transport.sessions_closed());
    assert!(transport.sessions_opened() > 5);
    assert_eq!(transport.events().last(), Some(&Event::CloseConnection));
}

#[test]
fn sessions_close_before_the_connection() {
    let transport = ScriptedTransport::new();
    shell(&transport)
        .run_transaction(|tx| {
            tx.run_command("a")?;
            tx.run_command("b")?;
            Ok(())
        })
        .expect("transaction");

    assert_eq!(
        transport.events()[1..],
        [
            Event::OpenSession,
            Event::Exec("a".to_owned()),
            Event::CloseSession,
            Event::OpenSession,
            Event::Exec("b".to_owned()),
            Event::CloseSession,
            Event::CloseConnection,
        ]
    );
}

#[test]
fn closure_error_still_closes_the_connection_once() {
    let transport = ScriptedTransport::new();
    transport.fail("migrate", 5, "schema locked\n");

    let error = shell(&transport)
        .run_transaction(|tx| {
            tx.run_command("backup")?;
            tx.run_command("migrate")?;
            tx.run_command("restart")?;
            Ok(())
        })
        .expect_err("migrate fails");

    assert_eq!(error.command_output(), Some("schema locked\n"));
    assert_eq!(transport.commands(), vec!["backup", "migrate"]);
    assert_eq!(transport.dials(), 1);
    assert_eq!(transport.connection_closes(), 1);
}

#[test]
fn closure_may_continue_after_a_command_error() {
    let transport = ScriptedTransport::new();
    transport.fail("test -d /data", 1, "");

    let created = shell(&transport)
        .run_transaction(|tx| {
            if tx.run_command("test -d /data").is_err() {
                tx.run_command("mkdir /data")?;
                return Ok(true);
            }
            Ok(false)
        })
        .expect("transaction");

    assert!(created);
    assert_eq!(transport.commands(), vec!["test -d /data", "mkdir /data"]);
    assert_eq!(transport.dials(), 1);
}

#[test]
fn transaction_run_shell_checks_suffix_without_touching_the_host() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = write_file(temp.path(), "job.bash", b"true\n").expect("write");
    let transport = ScriptedTransport::new();

    let error = shell(&transport)
        .run_transaction(|tx| tx.run_shell(&script, "/tmp/", &[]).map(|_| ()).map_err(RemoteError::from))
        .expect_err("format");

    assert!(matches!(error, RemoteError::Format { .. }));
    assert!(transport.remote_effects().is_empty());
    assert_eq!(transport.connection_closes(), 1);
}

#[test]
fn dial_failure_never_runs_the_closure() {
    let transport = ScriptedTransport::new();
    transport.fail_dial("no route to host");

    let mut ran = false;
    let error = shell(&transport)
        .run_transaction(|_| {
            ran = true;
            Ok(())
        })
        .expect_err("dial fails");

    assert!(!ran);
    assert!(error.is_connect_failure());
    assert_eq!(transport.connection_closes(), 0);
}
