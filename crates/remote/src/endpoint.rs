//! Endpoint description: where to connect and how to authenticate.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::RemoteError;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default upper bound for connect, handshake and authentication.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Credential material for one endpoint.
#[derive(Clone)]
pub enum Credentials {
    /// Password authentication.
    Password(Zeroizing<String>),
    /// Public-key authentication with the private key read from this file.
    KeyFile(PathBuf),
}

impl Credentials {
    /// Authentication mode this credential belongs to.
    #[must_use]
    pub const fn mode(&self) -> AuthMode {
        match self {
            Self::Password(_) => AuthMode::Password,
            Self::KeyFile(_) => AuthMode::KeyFile,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
        }
    }
}

/// Authentication mode names accepted in endpoint descriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// `password`
    Password,
    /// `key-file` (also spelled `public-key-file`)
    KeyFile,
}

impl FromStr for AuthMode {
    type Err = RemoteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "password" => Ok(Self::Password),
            "key-file" | "keyfile" | "public-key-file" => Ok(Self::KeyFile),
            other => Err(RemoteError::UnsupportedMode(other.to_owned())),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Password => "password",
            Self::KeyFile => "key-file",
        })
    }
}

/// One logical remote target. Immutable once built.
#[derive(Clone, Debug)]
pub struct RemoteEndpoint {
    host: String,
    port: u16,
    user: String,
    credentials: Credentials,
    timeout: Duration,
}

impl RemoteEndpoint {
    /// Starts building an endpoint for `user@host`.
    #[must_use]
    pub fn builder(host: impl Into<String>, user: impl Into<String>) -> RemoteEndpointBuilder {
        RemoteEndpointBuilder {
            host: host.into(),
            user: user.into(),
            port: DEFAULT_PORT,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Remote principal.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Credential material.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Dial timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for [`RemoteEndpoint`].
#[derive(Debug)]
pub struct RemoteEndpointBuilder {
    host: String,
    user: String,
    port: u16,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl RemoteEndpointBuilder {
    /// Overrides the port (default 22).
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Authenticates with a password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Password(Zeroizing::new(password.into())));
        self
    }

    /// Authenticates with the private key stored in `path`.
    #[must_use]
    pub fn key_file(mut self, path: impl AsRef<Path>) -> Self {
        self.credentials = Some(Credentials::KeyFile(path.as_ref().to_path_buf()));
        self
    }

    /// Sets credentials directly.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Overrides the dial timeout (default 60 seconds).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Finishes the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::UnsupportedMode`] when no credentials were
    /// supplied, since no authentication mode can be selected.
    pub fn build(self) -> Result<RemoteEndpoint, RemoteError> {
        let credentials = self
            .credentials
            .ok_or_else(|| RemoteError::UnsupportedMode("none".to_owned()))?;
        Ok(RemoteEndpoint {
            host: self.host,
            port: self.port,
            user: self.user,
            credentials,
            timeout: self.timeout,
        })
    }
}

/// Serialisable endpoint description.
///
/// ```json
/// { "host": "10.0.0.5", "user": "deploy", "mode": "key-file",
///   "credential": "/home/deploy/.ssh/id_ed25519", "timeout_secs": 30 }
/// ```
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Remote principal.
    pub user: String,
    /// Authentication mode name.
    pub mode: String,
    /// Password, or path of the private key file, depending on `mode`.
    #[serde(default)]
    pub credential: String,
    /// Dial timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("mode", &self.mode)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl EndpointConfig {
    /// Parses a JSON description.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the document is malformed.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Resolves the description into an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::UnsupportedMode`] for an unrecognised `mode`.
    pub fn into_endpoint(self) -> Result<RemoteEndpoint, RemoteError> {
        let mode: AuthMode = self.mode.parse()?;
        let credentials = match mode {
            AuthMode::Password => Credentials::Password(Zeroizing::new(self.credential)),
            AuthMode::KeyFile => Credentials::KeyFile(PathBuf::from(self.credential)),
        };
        RemoteEndpoint::builder(self.host, self.user)
            .port(self.port)
            .timeout(Duration::from_secs(self.timeout_secs))
            .credentials(credentials)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let endpoint = RemoteEndpoint::builder("10.0.0.1", "root")
            .password("secret")
            .build()
            .expect("endpoint");
        assert_eq!(endpoint.port(), 22);
        assert_eq!(endpoint.timeout(), Duration::from_secs(60));
        assert_eq!(endpoint.address(), "10.0.0.1:22");
        assert_eq!(endpoint.credentials().mode(), AuthMode::Password);
    }

    #[test]
    fn builder_without_credentials_has_no_mode() {
        let error = RemoteEndpoint::builder("h", "u").build().expect_err("no mode");
        assert!(matches!(error, RemoteError::UnsupportedMode(ref m) if m == "none"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let endpoint = RemoteEndpoint::builder("h", "u")
            .password("hunter2")
            .build()
            .expect("endpoint");
        let rendered = format!("{endpoint:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn config_parses_key_file_mode() {
        let config = EndpointConfig::from_json(
            r#"{"host":"example.com","port":2222,"user":"deploy","mode":"public-key-file","credential":"/keys/id"}"#,
        )
        .expect("json");
        let endpoint = config.into_endpoint().expect("endpoint");
        assert_eq!(endpoint.port(), 2222);
        assert_eq!(endpoint.timeout(), DEFAULT_TIMEOUT);
        assert!(matches!(
            endpoint.credentials(),
            Credentials::KeyFile(path) if path == Path::new("/keys/id")
        ));
    }

    #[test]
    fn config_rejects_unknown_mode_before_dialing() {
        let config = EndpointConfig::from_json(
            r#"{"host":"h","user":"u","mode":"agent","credential":""}"#,
        )
        .expect("json");
        let error = config.into_endpoint().expect_err("agent is unsupported");
        assert_eq!(error.to_string(), "does not support mode: agent");
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(EndpointConfig::from_json(r#"{"host":"h","user":"u","mode":"password","extra":1}"#).is_err());
    }
}
