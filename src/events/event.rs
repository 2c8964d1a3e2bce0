//! # Runtime events emitted by the manager and service workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Manager events**: dispatcher lifecycle and command handling
//! - **Service lifecycle events**: resume/stop requests and state changes
//! - **Drain events**: the bounded wait for dependents to leave running
//! - **Subscriber events**: fan-out overflow and panic isolation
//!
//! The [`Event`] struct carries metadata such as timestamps, service id,
//! the raw command line, error text and the relevant timeout.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so events can be ordered correctly even when delivered
//! out-of-order through async channels.
//!
//! ## Event flow example
//!
//! ```text
//! RESUME-SERVICE b
//!   → CommandReceived
//!   → ResumeRequested{b}  → ResumeRequested{a}   (cascade into dependencies)
//!   → ServiceRunning{a}   → ServiceRunning{b}
//!
//! STOP-SERVICE a
//!   → CommandReceived
//!   → StopRequested{a}    → StopRequested{b}     (cascade into dependents)
//!   → ServiceStopped{b}   → ServiceStopped{a}
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Manager events ===
    /// The dispatcher started listening on the command queue.
    ManagerStarted,
    /// The dispatcher processed `EXIT` and stopped.
    ManagerTerminated,
    /// An OS termination signal was received; treated as an implicit `EXIT`.
    ShutdownRequested,
    /// A command line was taken off the queue.
    CommandReceived,
    /// The command line did not match the grammar; dropped.
    UnknownCommand,
    /// A command referenced a service id that is not in the registry; dropped.
    UnknownService,

    // === Service lifecycle events ===
    /// A service was asked to resume.
    ResumeRequested,
    /// A service entered the running state (all dependencies up).
    ServiceRunning,
    /// A service was asked to stop and began draining its dependents.
    StopRequested,
    /// A service's payload wound down; the service is parked, resumable.
    ServiceStopped,
    /// A service reached its terminal state.
    ServiceTerminated,
    /// A payload ended with an error other than cancellation.
    PayloadFailed,

    // === Drain events ===
    /// Dependents failed to drain within the stop timeout; the stop
    /// proceeded anyway.
    DrainTimedOut,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    SubscriberOverflow,
    /// Subscriber panicked during event processing.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// ## Fields
/// - `seq`: unique sequence number for ordering (monotonically increasing)
/// - `at`: wall-clock timestamp (may go backwards due to NTP, logging only)
/// - `kind`: event classification
/// - `service`, `command`, `error`, `timeout`: optional metadata
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// Id of the service this event concerns, if applicable.
    pub service: Option<String>,
    /// Raw command line, if the event concerns command handling.
    pub command: Option<String>,
    /// Error message, if the event represents a failure.
    pub error: Option<String>,
    /// The relevant timeout (drain events).
    pub timeout: Option<Duration>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            command: None,
            error: None,
            timeout: None,
        }
    }

    /// Attaches a service id.
    pub fn with_service(mut self, id: impl Into<String>) -> Self {
        self.service = Some(id.into());
        self
    }

    /// Attaches the raw command line.
    pub fn with_command(mut self, line: impl Into<String>) -> Self {
        self.command = Some(line.into());
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    /// Attaches a timeout duration.
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout = Some(d);
        self
    }

    /// Creates a subscriber overflow event.
    ///
    /// Emitted when a subscriber's queue is full and an event is dropped.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_error(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    ///
    /// Emitted when a subscriber panics during event processing.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_error(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::now(EventKind::ManagerStarted);
        let b = Event::now(EventKind::ManagerStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_attach_metadata() {
        let ev = Event::now(EventKind::DrainTimedOut)
            .with_service("a")
            .with_timeout(Duration::from_millis(1));
        assert_eq!(ev.kind, EventKind::DrainTimedOut);
        assert_eq!(ev.service.as_deref(), Some("a"));
        assert_eq!(ev.timeout, Some(Duration::from_millis(1)));
    }
}
