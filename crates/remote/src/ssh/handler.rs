use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logging::warn_target;
use russh::client;
use russh::keys::{HashAlg, PublicKey};

use crate::host_key::{HostIdentity, HostKeyVerifier};

/// Client callbacks: host key checks go to the configured verifier.
pub(crate) struct ClientHandler {
    host: String,
    port: u16,
    verifier: Arc<dyn HostKeyVerifier>,
    rejected: Arc<AtomicBool>,
}

impl ClientHandler {
    pub(crate) fn new(
        host: String,
        port: u16,
        verifier: Arc<dyn HostKeyVerifier>,
        rejected: Arc<AtomicBool>,
    ) -> Self {
        Self {
            host,
            port,
            verifier,
            rejected,
        }
    }

    fn identity(&self, key: &PublicKey) -> HostIdentity {
        HostIdentity {
            host: self.host.clone(),
            port: self.port,
            algorithm: key.algorithm().to_string(),
            fingerprint: key.fingerprint(HashAlg::Sha256).to_string(),
        }
    }
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let identity = self.identity(server_public_key);
        let accepted = self.verifier.verify(&identity);
        if !accepted {
            self.rejected.store(true, Ordering::Release);
            warn_target!(
                "rexec::connect",
                host = %identity.host,
                fingerprint = %identity.fingerprint,
                "host key rejected"
            );
        }
        Ok(accepted)
    }
}
