use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Arc;

use logging::trace_session;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::runtime::Runtime;

use crate::error::TransportError;
use crate::transport::{CombinedOutput, ExitStatus, InputPipe, Session};

/// One SSH `session` channel.
pub struct SshSession {
    runtime: Arc<Runtime>,
    channel: Channel<Msg>,
}

impl SshSession {
    pub(super) fn new(runtime: Arc<Runtime>, channel: Channel<Msg>) -> Self {
        Self { runtime, channel }
    }
}

impl Session for SshSession {
    fn combined_output(&mut self, command: &str) -> Result<CombinedOutput, TransportError> {
        let channel = &mut self.channel;
        self.runtime.block_on(async move {
            channel.exec(true, command).await?;
            let mut output = Vec::new();
            let mut status = ExitStatus::unknown();
            while let Some(message) = channel.wait().await {
                match message {
                    ChannelMsg::Data { data } | ChannelMsg::ExtendedData { data, .. } => {
                        output.extend_from_slice(&data);
                    }
                    ChannelMsg::ExitStatus { exit_status } => {
                        status = ExitStatus::from_code(exit_status);
                    }
                    ChannelMsg::Close => break,
                    _ => {}
                }
            }
            Ok::<_, TransportError>(CombinedOutput { output, status })
        })
    }

    fn input_pipe(&mut self) -> Result<Box<dyn InputPipe>, TransportError> {
        Ok(Box::new(SshInputPipe {
            runtime: Arc::clone(&self.runtime),
            writer: Box::pin(self.channel.make_writer()),
        }))
    }

    fn start(&mut self, command: &str) -> Result<(), TransportError> {
        self.runtime.block_on(self.channel.exec(true, command))?;
        Ok(())
    }

    fn wait(&mut self) -> Result<ExitStatus, TransportError> {
        let channel = &mut self.channel;
        let status = self.runtime.block_on(async move {
            let mut status = ExitStatus::unknown();
            while let Some(message) = channel.wait().await {
                match message {
                    ChannelMsg::ExitStatus { exit_status } => {
                        status = ExitStatus::from_code(exit_status);
                    }
                    ChannelMsg::Close => break,
                    // Receiver acknowledgements are not interpreted.
                    _ => {}
                }
            }
            status
        });
        Ok(status)
    }

    fn close(self) {
        if let Err(error) = self.runtime.block_on(self.channel.close()) {
            trace_session!(%error, "channel close failed");
        }
    }
}

/// Standard input of a command started on an [`SshSession`].
pub struct SshInputPipe {
    runtime: Arc<Runtime>,
    writer: Pin<Box<dyn AsyncWrite + Send>>,
}

impl Write for SshInputPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.runtime.block_on(self.writer.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.runtime.block_on(self.writer.flush())
    }
}

impl InputPipe for SshInputPipe {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        // Shutting the writer down sends EOF on the channel.
        self.runtime.block_on(self.writer.shutdown())
    }
}
