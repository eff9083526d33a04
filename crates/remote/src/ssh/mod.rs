//! Embedded SSH transport built on `russh`.
//!
//! Each connection owns a small private tokio runtime and drives the async
//! client with `block_on`, so the crate's public API stays blocking. Sessions
//! map to SSH `session` channels; the copy receiver's standard input is a
//! channel writer that can be fed while another thread waits for the exit
//! status.

mod connection;
mod handler;
mod session;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logging::trace_connect;
use russh::client;
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg};

use crate::error::TransportError;
use crate::transport::{AuthMethod, DialRequest, Transport};

pub use connection::SshConnection;
pub use session::{SshInputPipe, SshSession};

use handler::ClientHandler;

/// [`Transport`] backed by the embedded `russh` client.
#[derive(Clone, Debug)]
pub struct SshTransport {
    config: Arc<client::Config>,
}

impl SshTransport {
    /// Transport with the default client configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(client::Config::default())
    }

    /// Transport with a caller-tuned client configuration.
    #[must_use]
    pub fn with_config(config: client::Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SshTransport {
    type Key = PrivateKey;
    type Connection = SshConnection;

    fn parse_private_key(&self, material: &str) -> Result<PrivateKey, TransportError> {
        russh::keys::decode_secret_key(material, None)
            .map_err(|error| TransportError::InvalidKey(error.to_string()))
    }

    fn dial(&self, request: DialRequest<PrivateKey>) -> Result<SshConnection, TransportError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("rexec-ssh")
            .enable_all()
            .build()?;
        let timeout = request.timeout;
        let handle = runtime
            .block_on(async {
                tokio::time::timeout(timeout, establish(Arc::clone(&self.config), request)).await
            })
            .map_err(|_| TransportError::Timeout(timeout))??;
        Ok(SshConnection::new(Arc::new(runtime), handle))
    }
}

async fn establish(
    config: Arc<client::Config>,
    request: DialRequest<PrivateKey>,
) -> Result<client::Handle<ClientHandler>, TransportError> {
    let address = request.address();
    let rejected = Arc::new(AtomicBool::new(false));
    let handler = ClientHandler::new(
        request.host.clone(),
        request.port,
        Arc::clone(&request.verifier),
        Arc::clone(&rejected),
    );

    let mut handle = match client::connect(config, (request.host.as_str(), request.port), handler).await {
        Ok(handle) => handle,
        Err(_) if rejected.load(Ordering::Acquire) => {
            return Err(TransportError::HostKeyRejected(address));
        }
        Err(error) => return Err(error.into()),
    };
    trace_connect!(address = %address, "handshake complete");

    for method in request.auth {
        let result = match method {
            AuthMethod::Password(password) => {
                handle
                    .authenticate_password(request.user.as_str(), password.as_str())
                    .await?
            }
            AuthMethod::PublicKey(key) => {
                let hash = handle.best_supported_rsa_hash().await?.flatten();
                handle
                    .authenticate_publickey(
                        request.user.as_str(),
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash),
                    )
                    .await?
            }
        };
        if result.success() {
            trace_connect!(address = %address, user = %request.user, "authenticated");
            return Ok(handle);
        }
    }
    Err(TransportError::AuthRejected(request.user))
}
