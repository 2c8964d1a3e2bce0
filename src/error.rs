//! # Error types used by the servisor runtime.
//!
//! Three error enums, split by which side of the system raises them:
//!
//! - [`LoadError`] failures while reading and validating the dependency file.
//! - [`ControlError`] failures of control-plane operations (commands, queue, timeouts).
//! - [`PayloadError`] failures raised by payload executions.
//!
//! Load errors are fatal: the manager refuses to start and no registry is
//! exposed. Control errors are soft: the dispatcher logs them as events and
//! keeps serving commands. All types provide `as_label` for log/metric tags.

use thiserror::Error;

/// Errors raised while loading the dependency file into a service registry.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoadError {
    /// The dependency file could not be read.
    #[error("could not read dependency file: {0}")]
    Io(#[from] std::io::Error),

    /// The declared dependencies form a cycle; the registry is rejected whole.
    #[error("dependency cycle detected: {}", .cycle.join(" -> "))]
    CyclicGraph {
        /// One offending cycle, closed (first id repeated at the end).
        cycle: Vec<String>,
    },
}

impl LoadError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::Io(_) => "load_io",
            LoadError::CyclicGraph { .. } => "load_cyclic_graph",
        }
    }
}

/// Errors raised by control-plane operations.
///
/// These never crash the engine; the dispatcher converts them into warning
/// events and continues.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControlError {
    /// A command referenced a service id that is not in the registry.
    #[error("service '{id}' does not exist")]
    UnknownService {
        /// The unknown service id.
        id: String,
    },

    /// The command line did not match the grammar.
    #[error("malformed command: {input:?}")]
    MalformedCommand {
        /// The rejected input line.
        input: String,
    },

    /// A negative stop timeout was requested; the service is left unchanged.
    #[error("stop timeout must be non-negative, not {requested_ms}")]
    InvalidTimeout {
        /// The rejected value in milliseconds.
        requested_ms: i64,
    },

    /// The command queue is full (non-blocking push only).
    #[error("command queue is full")]
    QueueFull,

    /// The command queue was closed because the dispatcher exited.
    #[error("command queue is closed")]
    QueueClosed,

    /// `Manager::run` was called a second time on the same manager.
    #[error("manager is already running")]
    AlreadyRunning,
}

impl ControlError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlError::UnknownService { .. } => "control_unknown_service",
            ControlError::MalformedCommand { .. } => "control_malformed_command",
            ControlError::InvalidTimeout { .. } => "control_invalid_timeout",
            ControlError::QueueFull => "control_queue_full",
            ControlError::QueueClosed => "control_queue_closed",
            ControlError::AlreadyRunning => "control_already_running",
        }
    }
}

/// Errors produced by payload execution.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PayloadError {
    /// The payload observed the stop signal and wound down.
    ///
    /// This is **not an error** in the traditional sense, but signals
    /// intentional termination of one running epoch.
    #[error("payload canceled")]
    Canceled,

    /// The payload failed while doing work.
    #[error("payload failed: {reason}")]
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

impl PayloadError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            PayloadError::Canceled => "payload_canceled",
            PayloadError::Failed { .. } => "payload_failed",
        }
    }

    /// True when the payload ended because it was asked to stop.
    pub fn is_canceled(&self) -> bool {
        matches!(self, PayloadError::Canceled)
    }
}
