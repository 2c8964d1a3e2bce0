//! Lifecycle states of a service.

/// The lifecycle state of a service.
///
/// ```text
/// Created ──► WaitingRun ──► Running ──► WaitingStop ──► WaitingRun ...
///                 │                           │
///                 └────────► Terminated ◄─────┘
/// ```
///
/// `Terminated` is absorbing: no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed by the loader; no worker has started yet.
    Created,
    /// The worker is parked, waiting for a resume request, or pursuing the
    /// start handshake with its dependencies.
    WaitingRun,
    /// All dependencies were observed running and the payload is executing.
    Running,
    /// The stop handshake completed the dependent drain; the payload has
    /// been told to stop and is winding down.
    WaitingStop,
    /// Terminal state reached after a terminate request.
    Terminated,
}

impl ServiceState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceState::Created => "created",
            ServiceState::WaitingRun => "waiting_run",
            ServiceState::Running => "running",
            ServiceState::WaitingStop => "waiting_stop",
            ServiceState::Terminated => "terminated",
        }
    }
}
