#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` centralises the diagnostics plumbing shared by the rexec
//! workspace. Every subsystem emits [`tracing`] events under a fixed target so
//! operators can filter connection setup, session lifecycle, command execution,
//! copy exchanges, and directory enumeration independently.
//!
//! # Design
//!
//! - [`targets`] lists the target strings. The `trace_*` macros wrap the
//!   standard `tracing` macros with the matching target and the level each
//!   subsystem uses by default.
//! - [`VerbosityConfig`] converts the `-v` count accepted by the command line
//!   into an [`EnvFilter`](tracing_subscriber::EnvFilter) directive.
//! - [`init_tracing`] installs a global formatting subscriber that writes to
//!   standard error. `RUST_LOG` takes precedence over the computed directive.
//!
//! # Invariants
//!
//! - Initialisation is idempotent: a second call leaves the first subscriber in
//!   place and reports [`InitOutcome::AlreadyInstalled`].
//! - The macros never evaluate their arguments when the target is disabled,
//!   matching the behaviour of the underlying `tracing` macros.
//!
//! # Examples
//!
//! ```
//! use logging::{VerbosityConfig, trace_cmd};
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert_eq!(config.directive(), "warn,rexec=debug");
//!
//! // Without an installed subscriber the event is simply discarded.
//! trace_cmd!(command = "uptime", "running remote command");
//! ```

mod config;
mod tracing_bridge;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use tracing_bridge::{InitOutcome, build_filter, init_tracing};

#[doc(hidden)]
pub use tracing as __tracing;

/// Target strings attached to every event emitted by the workspace.
pub mod targets {
    /// Dialing, authentication, and connection teardown.
    pub const CONNECT: &str = "rexec::connect";
    /// Session open/close on an established connection.
    pub const SESSION: &str = "rexec::session";
    /// Remote command execution and captured output sizes.
    pub const CMD: &str = "rexec::cmd";
    /// Copy sub-protocol exchanges.
    pub const COPY: &str = "rexec::copy";
    /// Local directory enumeration.
    pub const FLIST: &str = "rexec::flist";
}
