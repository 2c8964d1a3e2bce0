//! # servisor
//!
//! **Servisor** is a dependency-aware service supervisor.
//!
//! Given a declarative graph of long-running services with depends-on
//! relations, it exposes a command interface to resume and stop individual
//! services or the whole fleet, honoring two guarantees:
//!
//! - a service enters its running state only after every service it depends
//!   on is running;
//! - a service leaves its running state only after every service that
//!   depends on it has left running, or its stop timeout elapsed.
//!
//! ## Features
//!
//! | Area              | Description                                                        | Key types / traits               |
//! |-------------------|--------------------------------------------------------------------|----------------------------------|
//! | **Graph loading** | Parse a dependency file, reject cycles, build the registry.        | [`Manager::load`], [`Registry`]  |
//! | **Lifecycle**     | Per-service state machine with start/stop handshakes over the DAG. | [`Service`], [`ServiceState`]    |
//! | **Dispatch**      | Serialized command loop over a bounded queue.                      | [`Manager`], [`CommandQueue`]    |
//! | **Payloads**      | Pluggable, cancelable work units.                                  | [`Payload`], [`SleepingPayload`] |
//! | **Observability** | Event bus with non-blocking subscriber fan-out.                    | [`Subscribe`], [`LogWriter`]     |
//! | **Errors**        | Typed errors for loading, control and payloads.                    | [`LoadError`], [`ControlError`]  |
//!
//! ```no_run
//! use std::sync::Arc;
//! use servisor::{Config, LogWriter, Manager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // One service per line: "<id> [<dep-id> ...]".
//!     let manager = Arc::new(Manager::load(
//!         "services.txt",
//!         Config::default(),
//!         vec![Arc::new(LogWriter) as _],
//!     )?);
//!
//!     let queue = manager.queue();
//!     let run = tokio::spawn({
//!         let m = Arc::clone(&manager);
//!         async move { m.run().await }
//!     });
//!
//!     queue.push("RESUME-ALL").await?;
//!     queue.push("EXIT").await?;
//!     run.await??;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod graph;
mod manager;
mod payload;
mod service;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{ControlError, LoadError, PayloadError};
pub use events::{Bus, Event, EventKind};
pub use graph::Registry;
pub use manager::{Command, CommandQueue, Manager};
pub use payload::{Payload, PayloadContext, PayloadRef, SleepingPayload};
pub use service::{Service, ServiceState};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
