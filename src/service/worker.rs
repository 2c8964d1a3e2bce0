//! # ServiceWorker: the per-service task driving the lifecycle.
//!
//! One worker per service, spawned by the engine and serialized through the
//! service monitor. The worker owns every state transition of its service;
//! peers and the dispatcher only set flags and pulse.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► enter WaitingRun, park until resume or terminate
//!   ├─► start handshake:
//!   │     ├─► resume_for(self) on every dependency (registers + wakes them)
//!   │     └─► wait for running_dependencies to cover all dependencies
//!   │         (a terminate request aborts the wait)
//!   ├─► enter Running: clear stop flag, mint epoch token,
//!   │   notify every dependent, publish ServiceRunning
//!   ├─► run the payload until it returns or is cancelled
//!   ├─► teardown: detach from every neighbour's membership set
//!   └─► settle: terminate requested → Terminated (exit loop)
//!               otherwise           → park again
//! }
//! ```
//!
//! ## Rules
//! - At most one worker task per service; spawning is guarded by the monitor.
//! - The teardown runs on **every** exit from an epoch, aborted handshakes
//!   included, so membership sets stay accurate on both sides.
//! - A payload that returns **cleanly** without being asked to stop is
//!   started again on the next pass (the service keeps its workload until
//!   stopped). Failed payloads are not restarted; the service parks.
//! - Payload panics are caught and reported as `PayloadFailed`; the worker
//!   always reaches its terminal transition, so `join` never blocks on a
//!   dead task.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::events::{Event, EventKind};
use crate::service::service::{Service, Settled, Wake};

/// Drives the lifecycle of a single [`Service`].
pub(crate) struct ServiceWorker {
    service: Arc<Service>,
}

impl ServiceWorker {
    pub(crate) fn new(service: Arc<Service>) -> Self {
        Self { service }
    }

    /// Runs until a terminate request goes through.
    pub(crate) async fn run(self) {
        let svc = self.service;

        loop {
            svc.enter_waiting_run();
            if matches!(svc.park().await, Wake::Terminate) {
                break;
            }

            let mut ran = false;
            let mut crashed = false;
            if svc.await_dependencies().await {
                let ctx = svc.enter_running();
                ran = true;
                // Panic barrier: the payload is third-party code and must not
                // take the worker down with it.
                match AssertUnwindSafe(svc.payload().run(ctx)).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) if err.is_canceled() => {}
                    Ok(Err(err)) => {
                        crashed = true;
                        svc.bus().publish(
                            Event::now(EventKind::PayloadFailed)
                                .with_service(svc.id())
                                .with_error(err.to_string()),
                        );
                    }
                    Err(panic_err) => {
                        crashed = true;
                        svc.bus().publish(
                            Event::now(EventKind::PayloadFailed)
                                .with_service(svc.id())
                                .with_error(format!("payload panicked: {panic_err:?}")),
                        );
                    }
                }
            }

            svc.detach_from_peers();
            if ran {
                svc.bus()
                    .publish(Event::now(EventKind::ServiceStopped).with_service(svc.id()));
            }

            if matches!(svc.settle_after_payload(crashed), Settled::Terminate) {
                break;
            }
        }

        svc.finish_terminated();
    }
}
