//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the manager, the service
//! workers and the stop cascade.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Manager` (commands, shutdown), `Service` (resume/stop
//!   requests, drain timeouts), service workers (running/stopped/terminated),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the manager's subscriber listener, which fans events out
//!   to the [`SubscriberSet`](crate::subscribers::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
