//! ---
//! rack_section: "03-logging"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Structured rack event helpers."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Event helpers shared by the rack libraries and the `rackctl` binary.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

/// `rack_info!`, `rack_warn!` and `rack_error!`.
pub mod macros;

/// Initialize a baseline tracing subscriber suitable for tests and tooling.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Rack the event concerns.
    pub rack: Option<&'a str>,
    /// Rack version involved (current or target).
    pub version: Option<&'a str>,
    /// Operation being performed (`update`, `params`, `start`, ...).
    pub operation: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a rack name.
    pub fn with_rack(mut self, rack: &'a str) -> Self {
        self.rack = Some(rack);
        self
    }

    /// Attach a version identifier.
    pub fn with_version(mut self, version: &'a str) -> Self {
        self.version = Some(version);
        self
    }

    /// Attach an operation name.
    pub fn with_operation(mut self, operation: &'a str) -> Self {
        self.operation = Some(operation);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// Nothing needed to change.
    Noop,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Noop => "noop",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized system event with a success/noop/fault outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    let rack = ctx.rack.unwrap_or("");
    let version = ctx.version.unwrap_or("");
    let operation = ctx.operation.unwrap_or("");
    let outcome_str = outcome.as_str();
    match outcome {
        SystemEventOutcome::Fault => tracing::error!(
            event,
            outcome = outcome_str,
            rack,
            version,
            operation,
            message = %message
        ),
        SystemEventOutcome::Success | SystemEventOutcome::Noop => tracing::info!(
            event,
            outcome = outcome_str,
            rack,
            version,
            operation,
            message = %message
        ),
    }
}
