//! # Demo payload: sleep in random intervals and log.
//!
//! [`SleepingPayload`] sleeps for a uniformly random interval in
//! [0, 1000) ms, logs a tick, and loops until its epoch is cancelled.
//! When the owning service is marked bad it keeps sleeping regardless of
//! cancellation, which leaves the service stuck in its stopping state and
//! forces upstream drains onto their timeout path.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time;

use crate::error::PayloadError;
use crate::payload::{Payload, PayloadContext, PayloadRef};

/// Payload that prints in random intervals of 0 to 1 second.
#[derive(Debug, Default)]
pub struct SleepingPayload;

impl SleepingPayload {
    /// Creates the payload and returns it as a shared handle.
    pub fn arc() -> PayloadRef {
        std::sync::Arc::new(Self)
    }

    fn nap() -> Duration {
        Duration::from_millis(rand::rng().random_range(0..1000))
    }
}

#[async_trait]
impl Payload for SleepingPayload {
    async fn run(&self, ctx: PayloadContext) -> Result<(), PayloadError> {
        loop {
            if ctx.is_bad() {
                // Deliberately deaf to cancellation.
                time::sleep(Self::nap()).await;
                log::debug!("service[{}] working (ignoring stop)", ctx.id());
                continue;
            }

            tokio::select! {
                _ = time::sleep(Self::nap()) => {
                    log::debug!("service[{}] working", ctx.id());
                }
                _ = ctx.cancelled() => {
                    log::debug!("service[{}] stopped working", ctx.id());
                    return Err(PayloadError::Canceled);
                }
            }
        }
    }
}
