//! Payload abstraction and the demo sleeping payload.
//!
//! A payload is the unit of work a service performs while it is running.
//! The engine treats it opaquely through the [`Payload`] trait; the bundled
//! [`SleepingPayload`] is the default installed by the loader.

mod context;
mod sleeping;
mod work;

pub use context::PayloadContext;
pub use sleeping::SleepingPayload;
pub use work::{Payload, PayloadRef};
