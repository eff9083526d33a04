//! Connection orchestrator.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use logging::trace_connect;

use crate::endpoint::{Credentials, RemoteEndpoint};
use crate::error::{RemoteError, TransportError};
use crate::guard::ConnectionGuard;
use crate::host_key::{AcceptAnyHostKey, HostKeyVerifier};
use crate::transport::{AuthMethod, DialRequest, Transport};

/// Resolves credentials, dials, and scopes one connection to a callback.
///
/// Every call to [`connect`](Self::connect) dials exactly once and closes the
/// connection exactly once, whatever the callback returns. Host keys are
/// accepted unconditionally unless a verifier is installed with
/// [`with_verifier`](Self::with_verifier).
pub struct Connector<T: Transport> {
    endpoint: RemoteEndpoint,
    transport: T,
    verifier: Arc<dyn HostKeyVerifier>,
}

impl<T: Transport> Connector<T> {
    /// Creates an orchestrator for `endpoint` using `transport`.
    pub fn new(endpoint: RemoteEndpoint, transport: T) -> Self {
        Self {
            endpoint,
            transport,
            verifier: Arc::new(AcceptAnyHostKey),
        }
    }

    /// Replaces the host key verifier.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn HostKeyVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// The endpoint this orchestrator dials.
    pub const fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    /// The transport used for dialing.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Dials the endpoint, runs `operation` on the live connection, then
    /// closes it.
    ///
    /// # Errors
    ///
    /// Credential problems ([`RemoteError::KeyRead`], [`RemoteError::AuthParse`])
    /// and dial failures ([`RemoteError::Dial`]) are raised before `operation`
    /// runs. Otherwise the callback's own error is returned unchanged.
    pub fn connect<R, E, F>(&self, operation: F) -> Result<R, E>
    where
        E: From<RemoteError>,
        F: FnOnce(&mut T::Connection) -> Result<R, E>,
    {
        let request = DialRequest {
            host: self.endpoint.host().to_owned(),
            port: self.endpoint.port(),
            user: self.endpoint.user().to_owned(),
            auth: self.resolve_auth()?,
            timeout: self.endpoint.timeout(),
            verifier: Arc::clone(&self.verifier),
        };
        let address = request.address();
        trace_connect!(
            address = %address,
            user = self.endpoint.user(),
            mode = %self.endpoint.credentials().mode(),
            "dialing"
        );
        let connection = self
            .transport
            .dial(request)
            .map_err(|source| RemoteError::Dial {
                address: address.clone(),
                source,
            })?;
        trace_connect!(address = %address, "connected");
        let mut guard = ConnectionGuard::new(connection, address);
        operation(&mut *guard)
    }

    fn resolve_auth(&self) -> Result<Vec<AuthMethod<T::Key>>, RemoteError> {
        match self.endpoint.credentials() {
            Credentials::Password(password) => Ok(vec![AuthMethod::Password(password.clone())]),
            Credentials::KeyFile(path) => {
                let key = self.load_key(path)?;
                Ok(vec![AuthMethod::PublicKey(key)])
            }
        }
    }

    fn load_key(&self, path: &Path) -> Result<T::Key, RemoteError> {
        let bytes = fs::read(path).map_err(|source| RemoteError::KeyRead {
            path: path.to_path_buf(),
            source,
        })?;
        let material = zeroize::Zeroizing::new(bytes);
        let text = std::str::from_utf8(&material).map_err(|_| RemoteError::AuthParse {
            path: path.to_path_buf(),
            source: TransportError::InvalidKey("key file is not valid UTF-8".to_owned()),
        })?;
        self.transport
            .parse_private_key(text)
            .map_err(|source| RemoteError::AuthParse {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl<T: Transport + fmt::Debug> fmt::Debug for Connector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("endpoint", &self.endpoint)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
