//! # Payload trait: the work a service performs while running.
//!
//! A payload receives a [`PayloadContext`] carrying the stop signal for the
//! current running epoch and should either finish promptly or periodically
//! observe cancellation.
//!
//! ## Rules
//! - Returning `Ok(())` signals completion of the work.
//! - Returning [`PayloadError::Canceled`] signals a cooperative wind-down in
//!   response to the stop signal; the engine treats it as a normal stop.
//! - A payload that ignores cancellation keeps its service in the stopping
//!   state until it finally returns; upstream services fall back to their
//!   stop timeouts.

use async_trait::async_trait;

use crate::error::PayloadError;
use crate::payload::PayloadContext;

/// Shared handle to a payload object.
pub type PayloadRef = std::sync::Arc<dyn Payload>;

/// Asynchronous, cancelable unit of service work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use servisor::{Payload, PayloadContext, PayloadError};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Payload for Echo {
///     async fn run(&self, ctx: PayloadContext) -> Result<(), PayloadError> {
///         if ctx.is_cancelled() {
///             return Err(PayloadError::Canceled);
///         }
///         println!("service[{}] did one unit of work", ctx.id());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Payload: Send + Sync + 'static {
    /// Executes the payload for one running epoch of its service.
    ///
    /// Implementations should select on [`PayloadContext::cancelled`] or poll
    /// [`PayloadContext::is_cancelled`] and exit promptly when asked to stop.
    async fn run(&self, ctx: PayloadContext) -> Result<(), PayloadError>;
}
