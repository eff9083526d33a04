#![deny(unsafe_code)]

//! Scripted in-memory transport and filesystem fixtures for tests.
//!
//! [`ScriptedTransport`] implements the `remote` transport traits without any
//! network. It records every dial, session, command, started receiver and
//! copied byte stream as an [`Event`], and can be told to fail dials or to
//! give specific commands a non-zero exit.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use remote::{
    AuthMethod, CombinedOutput, Connection, DialRequest, ExitStatus, HostIdentity, InputPipe,
    Session, Transport, TransportError,
};
use tempfile::TempDir;

/// Fingerprint the scripted server presents during the dial.
pub const SCRIPTED_FINGERPRINT: &str = "SHA256:c2NyaXB0ZWQtaG9zdC1rZXk";

/// Authentication method kinds seen by a dial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthKind {
    /// Password.
    Password,
    /// Public key.
    PublicKey,
}

/// One observable call on the scripted transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A connection was established.
    Dial {
        /// `host:port`.
        address: String,
        /// Remote principal.
        user: String,
        /// Methods offered, in order.
        auth: Vec<AuthKind>,
    },
    /// A session was opened.
    OpenSession,
    /// A command ran with captured output.
    Exec(String),
    /// A command was started without capture (the copy receiver).
    Start(String),
    /// Bytes written to a started command before its input was closed.
    Copy {
        /// Command the bytes were fed to.
        command: String,
        /// Everything written, header and terminator included.
        bytes: Vec<u8>,
    },
    /// A session was closed.
    CloseSession,
    /// A connection was closed.
    CloseConnection,
}

/// A decoded copy exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyRecord {
    /// Receiver command line.
    pub command: String,
    /// Mode field of the header.
    pub mode: u32,
    /// Size field of the header.
    pub size: u64,
    /// Name field of the header.
    pub name: String,
    /// Content bytes between header and terminator.
    pub content: Vec<u8>,
    /// Whether the exchange ended with a single NUL byte.
    pub terminated: bool,
}

impl CopyRecord {
    /// Parses the raw bytes of one exchange.
    ///
    /// Returns `None` when the header is malformed.
    pub fn parse(command: &str, bytes: &[u8]) -> Option<Self> {
        let newline = bytes.iter().position(|byte| *byte == b'\n')?;
        let header = std::str::from_utf8(&bytes[..newline]).ok()?;
        let header = header.strip_prefix('C')?.strip_suffix(' ')?;
        let mut fields = header.splitn(3, ' ');
        let mode = u32::from_str_radix(fields.next()?, 8).ok()?;
        let size = fields.next()?.parse::<u64>().ok()?;
        let name = fields.next()?.to_owned();
        let body = &bytes[newline + 1..];
        let (content, terminated) = match body.split_last() {
            Some((0, content)) => (content.to_vec(), true),
            _ => (body.to_vec(), false),
        };
        Some(Self {
            command: command.to_owned(),
            mode,
            size,
            name,
            content,
            terminated,
        })
    }
}

#[derive(Clone, Debug)]
struct Reply {
    code: u32,
    output: String,
}

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    replies: HashMap<String, Reply>,
    dial_error: Option<String>,
    receiver_exit: u32,
}

/// In-memory [`Transport`] that records every call.
///
/// Clones share the same recording, so a clone kept by the test observes
/// everything done through the clone handed to the code under test.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<State>>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedTransport {
    /// Transport where every command succeeds with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `command` succeed with `output`.
    pub fn respond(&self, command: &str, output: &str) -> &Self {
        self.reply(command, 0, output)
    }

    /// Makes `command` exit with `code` after printing `output`.
    pub fn fail(&self, command: &str, code: u32, output: &str) -> &Self {
        self.reply(command, code, output)
    }

    /// Makes every dial fail with `message`.
    pub fn fail_dial(&self, message: &str) -> &Self {
        lock(&self.state).dial_error = Some(message.to_owned());
        self
    }

    /// Makes the copy receiver exit with `code`.
    pub fn receiver_exit(&self, code: u32) -> &Self {
        lock(&self.state).receiver_exit = code;
        self
    }

    fn reply(&self, command: &str, code: u32, output: &str) -> &Self {
        lock(&self.state).replies.insert(
            command.to_owned(),
            Reply {
                code,
                output: output.to_owned(),
            },
        );
        self
    }

    /// Every recorded event in order.
    pub fn events(&self) -> Vec<Event> {
        lock(&self.state).events.clone()
    }

    /// Number of successful dials.
    pub fn dials(&self) -> usize {
        self.count(|event| matches!(event, Event::Dial { .. }))
    }

    /// Number of connection closes.
    pub fn connection_closes(&self) -> usize {
        self.count(|event| matches!(event, Event::CloseConnection))
    }

    /// Number of sessions opened.
    pub fn sessions_opened(&self) -> usize {
        self.count(|event| matches!(event, Event::OpenSession))
    }

    /// Number of sessions closed.
    pub fn sessions_closed(&self) -> usize {
        self.count(|event| matches!(event, Event::CloseSession))
    }

    /// Commands run with captured output, in order.
    pub fn commands(&self) -> Vec<String> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Exec(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    /// Copy exchanges, decoded, in order.
    pub fn copies(&self) -> Vec<CopyRecord> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Copy { command, bytes } => CopyRecord::parse(command, bytes),
                _ => None,
            })
            .collect()
    }

    /// Commands and copies only, as `exec:<cmd>` and `copy:<receiver>` lines.
    pub fn remote_effects(&self) -> Vec<String> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Exec(command) => Some(format!("exec:{command}")),
                Event::Copy { command, .. } => Some(format!("copy:{command}")),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        lock(&self.state)
            .events
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}

impl Transport for ScriptedTransport {
    type Key = String;
    type Connection = ScriptedConnection;

    fn parse_private_key(&self, material: &str) -> Result<String, TransportError> {
        if material.trim_start().starts_with("-----BEGIN") {
            Ok(material.to_owned())
        } else {
            Err(TransportError::InvalidKey("no PEM armour".to_owned()))
        }
    }

    fn dial(&self, request: DialRequest<String>) -> Result<ScriptedConnection, TransportError> {
        let mut state = lock(&self.state);
        if let Some(message) = &state.dial_error {
            return Err(TransportError::Protocol(message.clone()));
        }
        let identity = HostIdentity {
            host: request.host.clone(),
            port: request.port,
            algorithm: "ssh-ed25519".to_owned(),
            fingerprint: SCRIPTED_FINGERPRINT.to_owned(),
        };
        if !request.verifier.verify(&identity) {
            return Err(TransportError::HostKeyRejected(request.address()));
        }
        let auth = request
            .auth
            .iter()
            .map(|method| match method {
                AuthMethod::Password(_) => AuthKind::Password,
                AuthMethod::PublicKey(_) => AuthKind::PublicKey,
            })
            .collect();
        state.events.push(Event::Dial {
            address: request.address(),
            user: request.user,
            auth,
        });
        Ok(ScriptedConnection {
            state: Arc::clone(&self.state),
        })
    }
}

/// Connection produced by [`ScriptedTransport`].
#[derive(Debug)]
pub struct ScriptedConnection {
    state: Arc<Mutex<State>>,
}

impl Connection for ScriptedConnection {
    type Session = ScriptedSession;

    fn open_session(&mut self) -> Result<ScriptedSession, TransportError> {
        lock(&self.state).events.push(Event::OpenSession);
        Ok(ScriptedSession {
            state: Arc::clone(&self.state),
            started: None,
        })
    }

    fn close(self) {
        lock(&self.state).events.push(Event::CloseConnection);
    }
}

/// Session produced by [`ScriptedConnection`].
#[derive(Debug)]
pub struct ScriptedSession {
    state: Arc<Mutex<State>>,
    started: Option<String>,
}

impl Session for ScriptedSession {
    fn combined_output(&mut self, command: &str) -> Result<CombinedOutput, TransportError> {
        let mut state = lock(&self.state);
        state.events.push(Event::Exec(command.to_owned()));
        let reply = state.replies.get(command).cloned().unwrap_or(Reply {
            code: 0,
            output: String::new(),
        });
        Ok(CombinedOutput {
            output: reply.output.into_bytes(),
            status: ExitStatus::from_code(reply.code),
        })
    }

    fn input_pipe(&mut self) -> Result<Box<dyn InputPipe>, TransportError> {
        Ok(Box::new(ScriptedPipe {
            state: Arc::clone(&self.state),
            bytes: Vec::new(),
        }))
    }

    fn start(&mut self, command: &str) -> Result<(), TransportError> {
        lock(&self.state).events.push(Event::Start(command.to_owned()));
        self.started = Some(command.to_owned());
        Ok(())
    }

    fn wait(&mut self) -> Result<ExitStatus, TransportError> {
        match &self.started {
            Some(_) => Ok(ExitStatus::from_code(lock(&self.state).receiver_exit)),
            None => Err(TransportError::Protocol("wait without start".to_owned())),
        }
    }

    fn close(self) {
        lock(&self.state).events.push(Event::CloseSession);
    }
}

/// Input pipe that records the bytes it receives.
#[derive(Debug)]
pub struct ScriptedPipe {
    state: Arc<Mutex<State>>,
    bytes: Vec<u8>,
}

impl Write for ScriptedPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl InputPipe for ScriptedPipe {
    fn close(self: Box<Self>) -> io::Result<()> {
        let mut state = lock(&self.state);
        let command = state
            .events
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::Start(command) => Some(command.clone()),
                _ => None,
            })
            .unwrap_or_default();
        let bytes = self.bytes.clone();
        state.events.push(Event::Copy { command, bytes });
        Ok(())
    }
}

/// Creates a temporary directory populated with `files`.
///
/// Paths ending in `/` create directories; all other entries create files with
/// the given contents. Parents are created as needed.
pub fn temp_tree(files: &[(&str, &[u8])]) -> io::Result<TempDir> {
    let temp = tempfile::tempdir()?;
    for (relative, contents) in files {
        let path = temp.path().join(relative);
        if relative.ends_with('/') {
            fs::create_dir_all(&path)?;
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, contents)?;
        }
    }
    Ok(temp)
}

/// Writes `contents` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> io::Result<std::path::PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}
