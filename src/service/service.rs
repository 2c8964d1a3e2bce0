//! # Service entity: dependency links, lifecycle state, control protocol.
//!
//! A [`Service`] holds everything the engine knows about one unit of the
//! graph. All mutable state lives in one monitor (`parking_lot::Mutex`); a
//! `tokio::sync::watch` pulse channel plays the condition-variable role.
//! Waiters mark the current pulse seen, check their predicate under the
//! monitor, and await the next pulse, so a notification between check and
//! await is never lost.
//!
//! ## Cross-service notifications
//! Neighbours are told about state changes through small helpers
//! (`mark_dependency_running`, `clear_running_dependent`, ...) that lock the
//! peer's monitor, mutate one membership set, pulse, and release. Two service
//! monitors are never held at the same time; cascade iteration always runs
//! over a snapshot taken under the owner's monitor.
//!
//! ## Stop handshake ordering
//! `request_stop` drains `running_dependents` *before* moving the service to
//! `WaitingStop`, so a service is only observed stopping after every
//! dependent stopped or the stop timeout elapsed. The timeout deadline is
//! fixed when the wait begins; wakeups never reset it.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ControlError;
use crate::events::{Bus, Event, EventKind};
use crate::payload::{PayloadContext, PayloadRef};
use crate::service::state::ServiceState;
use crate::service::worker::ServiceWorker;

/// What woke a parked worker.
pub(crate) enum Wake {
    /// A resume request arrived; pursue the start handshake.
    Resume,
    /// A terminate request arrived; go terminal.
    Terminate,
}

/// Where the worker goes after a payload epoch ended.
pub(crate) enum Settled {
    /// Park again and wait for the next resume request.
    Park,
    /// Enter the terminal state.
    Terminate,
}

/// Mutable service state, guarded by the service monitor.
struct Inner {
    state: ServiceState,
    /// A resume was requested and not yet consumed by entering `Running`.
    resume_requested: bool,
    /// The payload of the current epoch was told to stop. Starts `true`
    /// (a freshly loaded service is stopped until resumed).
    stop_requested: bool,
    /// Set once by `terminate`; makes the worker go terminal instead of
    /// parking again.
    terminate_requested: bool,
    /// A dependent drain is in progress; guards against overlapping stops.
    stopping: bool,
    /// Bound for the dependent drain wait.
    stop_timeout: Duration,
    /// Ids of dependencies currently observed running.
    running_dependencies: HashSet<String>,
    /// Ids of dependents that registered for this service (resumed and not
    /// yet detached).
    running_dependents: HashSet<String>,
    /// Cancellation token of the current running epoch.
    epoch: CancellationToken,
    /// Handle of the worker task, if one was spawned.
    worker: Option<JoinHandle<()>>,
}

/// One service of the dependency graph.
///
/// Constructed by the loader, linked to its neighbours once, and controlled
/// through [`resume`](Service::resume), [`stop`](Service::stop),
/// [`terminate`](Service::terminate) and [`join`](Service::join).
pub struct Service {
    id: String,
    payload: PayloadRef,
    bus: Bus,
    /// Test hook: the payload ignores stop requests while set.
    bad: Arc<AtomicBool>,
    /// Strong downward links; safe because the graph is acyclic by load-time
    /// validation. Set once by the loader.
    deps: OnceLock<Vec<Arc<Service>>>,
    /// Weak upward links; the registry owns the strong references.
    dependents: OnceLock<Vec<Weak<Service>>>,
    inner: Mutex<Inner>,
    pulse: watch::Sender<u64>,
}

impl Service {
    pub(crate) fn new(id: String, payload: PayloadRef, bus: Bus, stop_timeout: Duration) -> Self {
        let (pulse, _) = watch::channel(0);
        Self {
            id,
            payload,
            bus,
            bad: Arc::new(AtomicBool::new(false)),
            deps: OnceLock::new(),
            dependents: OnceLock::new(),
            inner: Mutex::new(Inner {
                state: ServiceState::Created,
                resume_requested: false,
                stop_requested: true,
                terminate_requested: false,
                stopping: false,
                stop_timeout,
                running_dependencies: HashSet::new(),
                running_dependents: HashSet::new(),
                epoch: CancellationToken::new(),
                worker: None,
            }),
            pulse,
        }
    }

    /// The service id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.inner.lock().state
    }

    /// Ids of the services this one depends on.
    pub fn dependency_ids(&self) -> Vec<String> {
        self.dependencies()
            .iter()
            .map(|d| d.id().to_string())
            .collect()
    }

    /// Ids of the services that depend on this one.
    pub fn dependent_ids(&self) -> Vec<String> {
        self.dependents_upgraded()
            .iter()
            .map(|p| p.id().to_string())
            .collect()
    }

    /// Number of direct dependencies.
    pub fn dependency_count(&self) -> usize {
        self.dependencies().len()
    }

    /// Number of direct dependents (the indegree of this service).
    pub fn dependent_count(&self) -> usize {
        self.dependents.get().map(Vec::len).unwrap_or(0)
    }

    /// Sets the bound for the dependent drain wait, in milliseconds.
    ///
    /// Negative values are rejected and leave the service unchanged.
    pub fn set_stop_timeout_ms(&self, ms: i64) -> Result<(), ControlError> {
        if ms < 0 {
            return Err(ControlError::InvalidTimeout { requested_ms: ms });
        }
        self.inner.lock().stop_timeout = Duration::from_millis(ms as u64);
        Ok(())
    }

    /// The current dependent drain bound.
    pub fn stop_timeout(&self) -> Duration {
        self.inner.lock().stop_timeout
    }

    /// Marks the payload as ignoring stop requests (test hook).
    pub fn set_bad(&self, bad: bool) {
        self.bad.store(bad, AtomicOrdering::Relaxed);
    }

    /// True when the payload is marked as ignoring stop requests.
    pub fn is_bad(&self) -> bool {
        self.bad.load(AtomicOrdering::Relaxed)
    }

    // ---------------------------
    // Control protocol
    // ---------------------------

    /// Requests this service to resume doing work.
    ///
    /// Spawns the worker if none exists and wakes it. Idempotent: repeated
    /// calls while a resume is already pending or the service is running
    /// change nothing. On a terminated service this is a no-op.
    pub fn resume(self: &Arc<Self>) {
        self.resume_inner(None);
    }

    /// Used by a dependent to request this dependency to start doing work.
    ///
    /// Registers the dependent in `running_dependents` first, so a later stop
    /// of this service waits for it to detach.
    pub fn resume_for(self: &Arc<Self>, parent: &Service) {
        self.resume_inner(Some(parent.id()));
    }

    /// Requests an orderly stop.
    ///
    /// Cascades the stop to every registered dependent, bounded-waits for
    /// them to detach, then signals the payload. No-op unless the service is
    /// currently running.
    pub async fn stop(self: &Arc<Self>) {
        Arc::clone(self).request_stop(false).await;
    }

    /// Like [`stop`](Service::stop), but the worker goes terminal instead of
    /// parking again. Also terminates parked and never-started services so
    /// [`join`](Service::join) always completes.
    pub async fn terminate(self: &Arc<Self>) {
        Arc::clone(self).request_stop(true).await;
    }

    /// Waits until the service reaches its terminal state, reaping the
    /// worker task along the way.
    pub async fn join(&self) {
        let handle = self.inner.lock().worker.take();
        if let Some(handle) = handle {
            if handle.await.is_err() {
                // The worker died without its terminal transition; drive the
                // state there so this wait cannot block forever.
                self.finish_terminated();
            }
        }
        self.wait_until(|i| i.state == ServiceState::Terminated).await;
    }

    fn resume_inner(self: &Arc<Self>, parent: Option<&str>) {
        let mut requested = false;
        {
            let mut inner = self.inner.lock();
            if inner.state == ServiceState::Terminated {
                return;
            }
            if let Some(parent_id) = parent {
                inner.running_dependents.insert(parent_id.to_string());
            }
            let truly_running = inner.state == ServiceState::Running && !inner.stopping;
            if !truly_running && !inner.resume_requested {
                inner.resume_requested = true;
                requested = true;
            }
            self.spawn_worker_locked(&mut inner);
        }
        self.pulse();
        if requested {
            self.bus
                .publish(Event::now(EventKind::ResumeRequested).with_service(&self.id));
        }
    }

    fn request_stop(self: Arc<Self>, terminate: bool) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let timeout = {
                let mut inner = self.inner.lock();
                if terminate {
                    inner.terminate_requested = true;
                }
                match inner.state {
                    ServiceState::Terminated => return,
                    ServiceState::Created => {
                        if terminate && inner.worker.is_none() {
                            // Never started and never will be; go terminal
                            // directly so join does not hang.
                            inner.state = ServiceState::Terminated;
                            drop(inner);
                            self.pulse();
                            self.bus.publish(
                                Event::now(EventKind::ServiceTerminated).with_service(&self.id),
                            );
                            return;
                        }
                        drop(inner);
                        self.pulse();
                        return;
                    }
                    ServiceState::WaitingRun | ServiceState::WaitingStop => {
                        // Parked, handshaking or already winding down; the
                        // worker observes the terminate flag at its next
                        // decision point. A plain stop is a no-op here.
                        drop(inner);
                        self.pulse();
                        return;
                    }
                    ServiceState::Running => {
                        if inner.stopping || inner.stop_requested {
                            drop(inner);
                            self.pulse();
                            return;
                        }
                        inner.stopping = true;
                        inner.stop_timeout
                    }
                }
            };

            self.bus
                .publish(Event::now(EventKind::StopRequested).with_service(&self.id));

            // Upward cascade first: every registered dependent is asked to
            // stop before this service waits for them to detach.
            for dependent in self.running_dependent_snapshot() {
                dependent.request_stop(terminate).await;
            }

            let deadline = Instant::now() + timeout;
            let drained = self
                .wait_until_deadline(deadline, |i| i.running_dependents.is_empty())
                .await;
            if !drained {
                self.bus.publish(
                    Event::now(EventKind::DrainTimedOut)
                        .with_service(&self.id)
                        .with_timeout(timeout),
                );
            }

            let token = {
                let mut inner = self.inner.lock();
                inner.stopping = false;
                inner.stop_requested = true;
                if inner.state == ServiceState::Running {
                    inner.state = ServiceState::WaitingStop;
                }
                inner.epoch.clone()
            };
            token.cancel();
            self.pulse();
        })
    }

    // ---------------------------
    // Worker-side transitions
    // ---------------------------

    /// Spawns the worker task if none exists yet. Serialized through the
    /// monitor, so concurrent resumes can never spawn two workers.
    pub(crate) fn ensure_worker(self: &Arc<Self>) {
        let mut inner = self.inner.lock();
        self.spawn_worker_locked(&mut inner);
    }

    fn spawn_worker_locked(self: &Arc<Self>, inner: &mut Inner) {
        if inner.worker.is_some() || inner.state == ServiceState::Terminated {
            return;
        }
        let worker = ServiceWorker::new(Arc::clone(self));
        inner.worker = Some(tokio::spawn(worker.run()));
    }

    /// Moves the service into the parked state.
    pub(crate) fn enter_waiting_run(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.state == ServiceState::Terminated {
                return;
            }
            inner.state = ServiceState::WaitingRun;
        }
        self.pulse();
    }

    /// Blocks until a resume or terminate request arrives.
    pub(crate) async fn park(&self) -> Wake {
        self.wait_until(|i| i.resume_requested || i.terminate_requested)
            .await;
        if self.inner.lock().terminate_requested {
            Wake::Terminate
        } else {
            Wake::Resume
        }
    }

    /// Start handshake: registers at every dependency and waits until all of
    /// them are observed running.
    ///
    /// Returns `false` when a terminate request aborted the wait; the caller
    /// must then tear down instead of entering the running state.
    pub(crate) async fn await_dependencies(self: &Arc<Self>) -> bool {
        for dep in self.dependencies() {
            dep.resume_for(self.as_ref());
        }
        let want: Vec<String> = self.dependency_ids();
        self.wait_until(move |i| {
            i.terminate_requested || want.iter().all(|d| i.running_dependencies.contains(d))
        })
        .await;
        !self.inner.lock().terminate_requested
    }

    /// Transition into `Running`: clears the stop flag, mints a fresh epoch
    /// token, and tells every dependent this dependency is up.
    pub(crate) fn enter_running(&self) -> PayloadContext {
        let token = {
            let mut inner = self.inner.lock();
            inner.state = ServiceState::Running;
            inner.stop_requested = false;
            inner.resume_requested = false;
            inner.epoch = CancellationToken::new();
            inner.epoch.clone()
        };
        self.pulse();
        self.bus
            .publish(Event::now(EventKind::ServiceRunning).with_service(&self.id));
        for dependent in self.dependents_upgraded() {
            dependent.mark_dependency_running(&self.id);
        }
        PayloadContext::new(self.id.clone(), token, Arc::clone(&self.bad))
    }

    /// Removes this service from the membership sets of every neighbour.
    ///
    /// Runs on every exit from an epoch, whether the payload ran or the
    /// handshake aborted, so the sets stay accurate on both sides.
    pub(crate) fn detach_from_peers(&self) {
        for dep in self.dependencies() {
            dep.clear_running_dependent(&self.id);
        }
        for dependent in self.dependents_upgraded() {
            dependent.clear_running_dependency(&self.id);
        }
    }

    /// Decides where the worker goes after an epoch ended.
    ///
    /// A `crashed` payload is never restarted automatically; the service
    /// parks until explicitly resumed or stopped.
    pub(crate) fn settle_after_payload(&self, crashed: bool) -> Settled {
        let mut inner = self.inner.lock();
        if !crashed && !inner.stop_requested && !inner.stopping {
            // The payload returned cleanly on its own; run again on the
            // next park.
            inner.resume_requested = true;
        }
        inner.stop_requested = true;
        if inner.terminate_requested {
            Settled::Terminate
        } else {
            Settled::Park
        }
    }

    /// Final transition; absorbing.
    pub(crate) fn finish_terminated(&self) {
        self.inner.lock().state = ServiceState::Terminated;
        self.pulse();
        self.bus
            .publish(Event::now(EventKind::ServiceTerminated).with_service(&self.id));
    }

    pub(crate) fn payload(&self) -> &PayloadRef {
        &self.payload
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    // ---------------------------
    // Cross-service notifications
    // ---------------------------

    /// A dependency entered the running state.
    pub(crate) fn mark_dependency_running(&self, dep_id: &str) {
        self.inner
            .lock()
            .running_dependencies
            .insert(dep_id.to_string());
        self.pulse();
    }

    /// A dependency left the running state.
    pub(crate) fn clear_running_dependency(&self, dep_id: &str) {
        self.inner.lock().running_dependencies.remove(dep_id);
        self.pulse();
    }

    /// A dependent detached; one fewer service to wait for when stopping.
    pub(crate) fn clear_running_dependent(&self, parent_id: &str) {
        self.inner.lock().running_dependents.remove(parent_id);
        self.pulse();
    }

    // ---------------------------
    // Graph wiring (loader only)
    // ---------------------------

    pub(crate) fn link_dependencies(&self, deps: Vec<Arc<Service>>) {
        let _ = self.deps.set(deps);
    }

    pub(crate) fn link_dependents(&self, dependents: Vec<Weak<Service>>) {
        let _ = self.dependents.set(dependents);
    }

    /// Direct dependencies of this service.
    pub(crate) fn dependencies(&self) -> &[Arc<Service>] {
        self.deps.get().map(Vec::as_slice).unwrap_or(&[])
    }

    fn dependents_upgraded(&self) -> Vec<Arc<Service>> {
        self.dependents
            .get()
            .into_iter()
            .flatten()
            .filter_map(Weak::upgrade)
            .collect()
    }

    fn running_dependent_snapshot(&self) -> Vec<Arc<Service>> {
        let ids = self.inner.lock().running_dependents.clone();
        self.dependents_upgraded()
            .into_iter()
            .filter(|p| ids.contains(p.id()))
            .collect()
    }

    // ---------------------------
    // Monitor + pulse plumbing
    // ---------------------------

    fn pulse(&self) {
        self.pulse.send_modify(|n| *n = n.wrapping_add(1));
    }

    /// Waits until the predicate holds under the monitor.
    ///
    /// The pulse is marked seen *before* the predicate runs, so a
    /// notification between check and await is never lost.
    async fn wait_until(&self, pred: impl Fn(&Inner) -> bool) {
        let mut rx = self.pulse.subscribe();
        loop {
            {
                rx.borrow_and_update();
                let inner = self.inner.lock();
                if pred(&inner) {
                    return;
                }
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Bounded variant of [`wait_until`](Service::wait_until). Returns
    /// whether the predicate held before the deadline. The deadline is fixed;
    /// wakeups re-check the predicate without resetting it.
    async fn wait_until_deadline(
        &self,
        deadline: Instant,
        pred: impl Fn(&Inner) -> bool,
    ) -> bool {
        let mut rx = self.pulse.subscribe();
        loop {
            {
                rx.borrow_and_update();
                let inner = self.inner.lock();
                if pred(&inner) {
                    return true;
                }
            }
            match timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => return false,
                Err(_) => return pred(&self.inner.lock()),
            }
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
