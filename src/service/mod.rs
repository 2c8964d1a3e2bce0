//! Service entity and per-service worker.
//!
//! A [`Service`] is a passive record: id, dependency links, lifecycle state
//! and control flags behind a monitor. The work happens in a
//! [`worker`](self::worker) task the engine spawns, at most one per service.
//!
//! ## Files & responsibilities
//! - **state.rs**: the five-state lifecycle enum.
//! - **service.rs**: the entity; resume/stop/terminate/join contract, the
//!   monitor + pulse channel that plays the condition-variable role, and the
//!   cross-service notification helpers.
//! - **worker.rs**: the worker loop: park, start handshake, payload, teardown.

mod service;
mod state;
mod worker;

pub use service::Service;
pub use state::ServiceState;
