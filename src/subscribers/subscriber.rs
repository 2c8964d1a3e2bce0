//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for plugging custom event
//! handlers into the runtime.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics caught, reported as `SubscriberPanicked`)
//!
//! ## Rules
//! - Slow subscribers only affect themselves (queue overflow → event drop)
//! - Panics are isolated and do not crash the runtime or other subscribers
//! - Subscribers never block publishers or each other

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
///
/// Receives events from the runtime via a dedicated worker task with a
/// bounded queue.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking operations
/// - Handle errors internally, do not panic
/// - Slow processing only backs up this subscriber's own queue
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from the subscriber's dedicated worker task, sequentially and
    /// in queue order.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name for logging and overflow reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
