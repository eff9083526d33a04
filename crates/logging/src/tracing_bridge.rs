//! crates/logging/src/tracing_bridge.rs
//! Global subscriber installation.

use super::config::VerbosityConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Result of [`init_tracing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// The subscriber was installed by this call.
    Installed,
    /// Another global subscriber was already present; nothing changed.
    AlreadyInstalled,
}

/// Builds the filter used by [`init_tracing`].
///
/// A non-empty `RUST_LOG` wins over the verbosity-derived directive so ad-hoc
/// debugging does not require rebuilding the command line.
#[must_use]
pub fn build_filter(config: VerbosityConfig) -> EnvFilter {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.trim().is_empty() => {
            EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(config.directive()))
        }
        _ => EnvFilter::new(config.directive()),
    }
}

/// Installs a formatting subscriber writing to standard error.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, init_tracing};
///
/// init_tracing(VerbosityConfig::from_verbose_level(1));
/// tracing::info!(target: "rexec::copy", "copied");
/// ```
pub fn init_tracing(config: VerbosityConfig) -> InitOutcome {
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    match tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt)
        .try_init()
    {
        Ok(()) => InitOutcome::Installed,
        Err(_) => InitOutcome::AlreadyInstalled,
    }
}
