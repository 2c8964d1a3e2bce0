//! Execution context handed to a payload for one running epoch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Context for a single running epoch of a service payload.
///
/// Carries the owning service's id, the epoch's cancellation token (cancelled
/// when the service is asked to stop) and the misbehaving-payload test hook.
#[derive(Clone)]
pub struct PayloadContext {
    id: String,
    token: CancellationToken,
    bad: Arc<AtomicBool>,
}

impl PayloadContext {
    pub(crate) fn new(id: String, token: CancellationToken, bad: Arc<AtomicBool>) -> Self {
        Self { id, token, bad }
    }

    /// Id of the service this payload runs for.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True once the service has been asked to stop this epoch.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the service has been asked to stop this epoch.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// True when the service is marked as ignoring stop requests.
    ///
    /// Test hook: a well-behaved payload consults this to deliberately
    /// misbehave and exercise the drain timeout path upstream.
    pub fn is_bad(&self) -> bool {
        self.bad.load(Ordering::Relaxed)
    }
}
