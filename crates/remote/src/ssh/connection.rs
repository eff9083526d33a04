use std::sync::Arc;

use logging::trace_connect;
use russh::Disconnect;
use russh::client;
use tokio::runtime::Runtime;

use super::handler::ClientHandler;
use super::session::SshSession;
use crate::error::TransportError;
use crate::transport::Connection;

/// Authenticated SSH connection with its private runtime.
pub struct SshConnection {
    runtime: Arc<Runtime>,
    handle: client::Handle<ClientHandler>,
}

impl SshConnection {
    pub(super) fn new(runtime: Arc<Runtime>, handle: client::Handle<ClientHandler>) -> Self {
        Self { runtime, handle }
    }
}

impl Connection for SshConnection {
    type Session = SshSession;

    fn open_session(&mut self) -> Result<SshSession, TransportError> {
        let channel = self.runtime.block_on(self.handle.channel_open_session())?;
        Ok(SshSession::new(Arc::clone(&self.runtime), channel))
    }

    fn close(self) {
        let result = self.runtime.block_on(self.handle.disconnect(
            Disconnect::ByApplication,
            "",
            "en",
        ));
        if let Err(error) = result {
            trace_connect!(%error, "disconnect failed");
        }
    }
}
