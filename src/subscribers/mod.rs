//! Event subscribers: the observability extension point.
//!
//! ## Contents
//! - [`Subscribe`] the subscriber trait (dedicated worker, bounded queue,
//!   panic isolation)
//! - [`SubscriberSet`] non-blocking fan-out over multiple subscribers
//! - [`LogWriter`] a simple stdout logger for demos and debugging

mod log;
mod set;
mod subscriber;

pub use self::log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
