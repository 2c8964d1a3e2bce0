//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [manager-started]
//! [command] line="RESUME-SERVICE b"
//! [resume-requested] service=a
//! [running] service=a
//! [stop-requested] service=a
//! [drain-timeout] service=a timeout=1ms
//! [stopped] service=a
//! [terminated] service=a
//! [unknown-service] id=x
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Not intended for production use; implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("?");
        match e.kind {
            EventKind::ManagerStarted => println!("[manager-started]"),
            EventKind::ManagerTerminated => println!("[manager-terminated]"),
            EventKind::ShutdownRequested => println!("[shutdown-requested]"),
            EventKind::CommandReceived => {
                println!("[command] line={:?}", e.command.as_deref().unwrap_or(""));
            }
            EventKind::UnknownCommand => {
                println!(
                    "[unknown-command] line={:?}",
                    e.command.as_deref().unwrap_or("")
                );
            }
            EventKind::UnknownService => println!("[unknown-service] id={service}"),
            EventKind::ResumeRequested => println!("[resume-requested] service={service}"),
            EventKind::ServiceRunning => println!("[running] service={service}"),
            EventKind::StopRequested => println!("[stop-requested] service={service}"),
            EventKind::ServiceStopped => println!("[stopped] service={service}"),
            EventKind::ServiceTerminated => println!("[terminated] service={service}"),
            EventKind::PayloadFailed => {
                println!(
                    "[payload-failed] service={service} err={:?}",
                    e.error.as_deref().unwrap_or("")
                );
            }
            EventKind::DrainTimedOut => {
                println!(
                    "[drain-timeout] service={service} timeout={:?}",
                    e.timeout.unwrap_or_default()
                );
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                eprintln!(
                    "[subscriber-trouble] {:?} {}",
                    e.kind,
                    e.error.as_deref().unwrap_or("")
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
