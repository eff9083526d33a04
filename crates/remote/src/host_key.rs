//! Host identity verification.
//!
//! The core takes no position on whether a server key is trustworthy. It asks
//! a caller-supplied [`HostKeyVerifier`] and aborts the dial when the verifier
//! says no. [`AcceptAnyHostKey`] is the permissive default; it is a deliberate
//! trust boundary, not a verification.

use std::collections::BTreeSet;

/// Identity presented by a server during the handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostIdentity {
    /// Host name or address that was dialed.
    pub host: String,
    /// Port that was dialed.
    pub port: u16,
    /// Key algorithm name, e.g. `ssh-ed25519`.
    pub algorithm: String,
    /// SHA-256 fingerprint in OpenSSH form, e.g. `SHA256:abc...`.
    pub fingerprint: String,
}

/// Accept-or-reject decision for a server identity.
pub trait HostKeyVerifier: Send + Sync {
    /// Returns `true` to continue the handshake.
    fn verify(&self, identity: &HostIdentity) -> bool;
}

impl<F> HostKeyVerifier for F
where
    F: Fn(&HostIdentity) -> bool + Send + Sync,
{
    fn verify(&self, identity: &HostIdentity) -> bool {
        self(identity)
    }
}

/// Accepts every host key.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAnyHostKey;

impl HostKeyVerifier for AcceptAnyHostKey {
    fn verify(&self, _identity: &HostIdentity) -> bool {
        true
    }
}

/// Accepts only keys whose fingerprint is in a fixed set.
#[derive(Clone, Debug, Default)]
pub struct PinnedFingerprint {
    allowed: BTreeSet<String>,
}

impl PinnedFingerprint {
    /// Creates a verifier accepting the given fingerprints.
    ///
    /// Entries may be given with or without the `SHA256:` prefix.
    #[must_use]
    pub fn new<I, S>(fingerprints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = fingerprints
            .into_iter()
            .map(|fp| normalize(fp.as_ref()))
            .collect();
        Self { allowed }
    }
}

impl HostKeyVerifier for PinnedFingerprint {
    fn verify(&self, identity: &HostIdentity) -> bool {
        self.allowed.contains(&normalize(&identity.fingerprint))
    }
}

fn normalize(fingerprint: &str) -> String {
    let trimmed = fingerprint.trim();
    let body = trimmed.strip_prefix("SHA256:").unwrap_or(trimmed);
    format!("SHA256:{}", body.trim_end_matches('='))
}
