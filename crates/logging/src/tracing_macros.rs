//! crates/logging/src/tracing_macros.rs
//! Convenience macros for rexec-specific tracing.
//!
//! These macros wrap the standard tracing macros with the target used by each
//! subsystem. They go through a hidden re-export so dependants do not need a
//! direct `tracing` dependency.

/// Emit a connection trace.
///
/// # Example
/// ```ignore
/// trace_connect!(host = %host, "dialing");
/// ```
#[macro_export]
macro_rules! trace_connect {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!(target: "rexec::connect", $($arg)*);
    };
}

/// Emit a session lifecycle trace.
///
/// # Example
/// ```ignore
/// trace_session!("session closed");
/// ```
#[macro_export]
macro_rules! trace_session {
    ($($arg:tt)*) => {
        $crate::__tracing::trace!(target: "rexec::session", $($arg)*);
    };
}

/// Emit a remote command trace.
///
/// # Example
/// ```ignore
/// trace_cmd!(command = %cmd, "running");
/// ```
#[macro_export]
macro_rules! trace_cmd {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!(target: "rexec::cmd", $($arg)*);
    };
}

/// Emit a copy exchange trace.
///
/// # Example
/// ```ignore
/// trace_copy!(size, "sending {}", name);
/// ```
#[macro_export]
macro_rules! trace_copy {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "rexec::copy", $($arg)*);
    };
}

/// Emit a directory enumeration trace.
///
/// # Example
/// ```ignore
/// trace_flist!("found {} entries", count);
/// ```
#[macro_export]
macro_rules! trace_flist {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!(target: "rexec::flist", $($arg)*);
    };
}

/// Emit a warning under an explicit target.
///
/// # Example
/// ```ignore
/// warn_target!("rexec::connect", "close failed: {}", err);
/// ```
#[macro_export]
macro_rules! warn_target {
    ($target:literal, $($arg:tt)*) => {
        $crate::__tracing::warn!(target: $target, $($arg)*);
    };
}
