//! Logging facilities for Horizon Relay.
//!
//! Horizon Relay is instrumented with the `tracing` crate and never installs
//! a subscriber itself. To see its output, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_relay_core::controller=debug")
//!     .init();
//! ```
//!
//! Levels used:
//! - `trace`: fan-out, setter dispatch misses, registry pruning
//! - `debug`: model and view enrollment changes
//! - `warn`: a view failed to handle a change event

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_relay_core";
    /// Controller fan-out and dispatch.
    pub const CONTROLLER: &str = "horizon_relay_core::controller";
    /// Model listener registries.
    pub const MODEL: &str = "horizon_relay_core::model";
    /// Setter tables.
    pub const SETTER: &str = "horizon_relay_core::setter";
    /// Weak observer registries.
    pub const WEAK_LIST: &str = "horizon_relay_core::weak_list";

    /// Every subsystem target, for building filters.
    pub const ALL: &[&str] = &[CONTROLLER, MODEL, SETTER, WEAK_LIST];
}

/// Build an `EnvFilter`-style directive enabling `level` for every relay
/// target, e.g. `"horizon_relay_core::controller=debug,..."`.
pub fn filter_directive(level: &str) -> String {
    targets::ALL
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[doc(hidden)]
pub use tracing;

/// Macros for common tracing patterns.
///
/// Thin wrappers around the `tracing` macros that log under the core crate
/// target, so callers need no direct `tracing` dependency.
#[macro_export]
macro_rules! relay_trace {
    ($($arg:tt)*) => {
        $crate::logging::tracing::trace!(target: "horizon_relay_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! relay_debug {
    ($($arg:tt)*) => {
        $crate::logging::tracing::debug!(target: "horizon_relay_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! relay_warn {
    ($($arg:tt)*) => {
        $crate::logging::tracing::warn!(target: "horizon_relay_core", $($arg)*)
    };
}
