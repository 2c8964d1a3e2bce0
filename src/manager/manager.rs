//! # Manager: loads the graph and dispatches commands over it.
//!
//! The [`Manager`] owns the runtime components (registry, event bus,
//! subscriber fan-out) and runs the single-task dispatch loop that serializes
//! external requests against the service graph.
//!
//! ## Architecture
//! ```text
//! dependency file ──► Manager::load()
//!                         ├──► loader: parse, cycle check, wire entities
//!                         └──► Bus + SubscriberSet
//!
//! CommandQueue ──► Manager::run()
//!                     ├──► spawn one worker per service (parked)
//!                     ├──► subscriber listener (Bus → SubscriberSet)
//!                     └──► loop, one command at a time:
//!                           ├─► RESUME-ALL        resume every source
//!                           ├─► STOP-ALL          stop every sink
//!                           ├─► RESUME-SERVICE id resume one service
//!                           ├─► STOP-SERVICE id   stop one service
//!                           ├─► EXIT              terminate + join all, break
//!                           └─► anything else     warn, continue
//! ```
//!
//! ## Rules
//! - The dispatcher is single-task: each command runs to completion before
//!   the next is taken. A stop command blocks through its drain waits.
//! - Resuming every source (or stopping every sink) is sufficient to sweep
//!   the whole graph; the per-service cascades do the rest.
//! - An OS termination signal and a closed queue are both implicit `EXIT`.
//! - Unknown ids and malformed lines are warnings, never failures.
//! - Subscriber queues are drained before [`Manager::run`] returns; the last
//!   event every subscriber observes is `ManagerTerminated`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use servisor::{Config, LogWriter, Manager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = Arc::new(Manager::load(
//!         "services.txt",
//!         Config::default(),
//!         vec![Arc::new(LogWriter) as _],
//!     )?);
//!
//!     let queue = manager.queue();
//!     let run = tokio::spawn({
//!         let m = Arc::clone(&manager);
//!         async move { m.run().await }
//!     });
//!
//!     queue.push("RESUME-ALL").await?;
//!     queue.push("EXIT").await?;
//!     run.await??;
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{ControlError, LoadError};
use crate::events::{Bus, Event, EventKind};
use crate::graph::{self, Registry};
use crate::manager::command::Command;
use crate::manager::queue::CommandQueue;
use crate::manager::signal;
use crate::payload::SleepingPayload;
use crate::service::Service;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Loads a validated service graph and serializes commands against it.
pub struct Manager {
    cfg: Config,
    registry: Registry,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    tx: mpsc::Sender<String>,
    rx: Mutex<Option<mpsc::Receiver<String>>>,
}

impl Manager {
    /// Reads the dependency file, validates it, and builds the runtime.
    ///
    /// Every service gets the default sleeping payload. Must be called from
    /// within a tokio runtime (subscriber workers are spawned here).
    ///
    /// Fails with [`LoadError`] when the file is unreadable or the declared
    /// dependencies form a cycle; no partial registry is exposed.
    pub fn load(
        path: impl AsRef<Path>,
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, LoadError> {
        let bus = Bus::new(cfg.bus_capacity);
        let registry = graph::load(path.as_ref(), &cfg, &bus, &|_| SleepingPayload::arc())?;
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        let (tx, rx) = mpsc::channel(cfg.queue_capacity);

        Ok(Self {
            cfg,
            registry,
            bus,
            subs,
            tx,
            rx: Mutex::new(Some(rx)),
        })
    }

    /// Returns a handle for pushing command lines.
    pub fn queue(&self) -> CommandQueue {
        CommandQueue::new(self.tx.clone())
    }

    /// Fetches a service handle by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Service>> {
        self.registry.get(id)
    }

    /// The validated service registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs the dispatch loop until `EXIT` (explicit, via signal, or via a
    /// closed queue).
    ///
    /// Spawns one parked worker per service up front, so every loaded
    /// service is observable in its waiting state before any command runs.
    /// On return, every subscriber has seen every event up to and including
    /// `ManagerTerminated`.
    pub async fn run(&self) -> Result<(), ControlError> {
        let mut rx = self
            .rx
            .lock()
            .take()
            .ok_or(ControlError::AlreadyRunning)?;

        let listener = self.subscriber_listener();
        for service in self.registry.services() {
            service.ensure_worker();
        }
        self.bus.publish(Event::now(EventKind::ManagerStarted));

        let shutdown = signal::wait_for_shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    self.bus.publish(Event::now(EventKind::ShutdownRequested));
                    self.exit().await;
                    break;
                }
                msg = rx.recv() => match msg {
                    Some(line) => {
                        if self.dispatch(line.trim()).await {
                            break;
                        }
                    }
                    None => {
                        self.exit().await;
                        break;
                    }
                }
            }
        }

        self.bus.publish(Event::now(EventKind::ManagerTerminated));
        let _ = listener.await;
        self.subs.shutdown().await;
        Ok(())
    }

    /// Handles one command line. Returns `true` when the loop should end.
    async fn dispatch(&self, line: &str) -> bool {
        self.bus
            .publish(Event::now(EventKind::CommandReceived).with_command(line));

        match Command::parse(line) {
            Err(err) => {
                log::warn!("{err}");
                self.bus.publish(
                    Event::now(EventKind::UnknownCommand)
                        .with_command(line)
                        .with_error(err.as_label()),
                );
                false
            }
            Ok(Command::ResumeAll) => {
                for source in self.registry.sources() {
                    source.resume();
                }
                false
            }
            Ok(Command::StopAll) => {
                for sink in self.registry.sinks() {
                    sink.stop().await;
                }
                false
            }
            Ok(Command::ResumeService(id)) => {
                match self.registry.get(&id) {
                    Some(service) => service.resume(),
                    None => self.unknown_service(&id),
                }
                false
            }
            Ok(Command::StopService(id)) => {
                match self.registry.get(&id) {
                    Some(service) => service.stop().await,
                    None => self.unknown_service(&id),
                }
                false
            }
            Ok(Command::Exit) => {
                self.exit().await;
                true
            }
        }
    }

    /// `EXIT`: terminate every sink (ordered upward drain for the running
    /// part of the graph), then terminate and join every service so parked
    /// and never-started workers go terminal too.
    async fn exit(&self) {
        for sink in self.registry.sinks() {
            sink.terminate().await;
        }
        for service in self.registry.services() {
            service.terminate().await;
            service.join().await;
        }
    }

    fn unknown_service(&self, id: &str) {
        let err = ControlError::UnknownService { id: id.to_string() };
        log::warn!("{err}");
        self.bus.publish(
            Event::now(EventKind::UnknownService)
                .with_service(id)
                .with_error(err.as_label()),
        );
    }

    /// Spawns the background task that fans bus events out to subscribers.
    ///
    /// The listener ends after relaying `ManagerTerminated`, so `run` can
    /// await it and then drain the subscriber queues deterministically.
    fn subscriber_listener(&self) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = ev.kind == EventKind::ManagerTerminated;
                        subs.emit_arc(Arc::new(ev));
                        if last {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        })
    }
}
