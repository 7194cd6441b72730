//! Concurrent workload harness.
//!
//! Spawns independent workers that issue randomized calls against a small
//! set of shared list ids, waits for them (or for a deadline, after which the
//! rest are cancelled and abandoned), then runs an integrity pass over every
//! list.
//!
//! # Example
//! ```
//! use listd::{harness::{Harness, HarnessConfig}, Store};
//! use std::{sync::Arc, time::Duration};
//!
//! let config = HarnessConfig::default()
//!     .with_workers(4)
//!     .with_ops_per_worker(25)
//!     .with_pause(Duration::from_millis(0), Duration::from_millis(1));
//!
//! let report = Harness::new(config, Arc::new(Store::new())).run().unwrap();
//! assert_eq!(report.load.operations, 100);
//! assert_eq!(report.load.errors, 0);
//! assert!(report.integrity.suspicious.is_empty());
//! ```

use crate::{Client, ClientConfig, ListService, Registry, Result, Store};

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

mod cancel;
pub use cancel::Cancel;

mod config;
pub use config::{HarnessConfig, VALUE_STRIDE};

mod integrity;
pub use integrity::{check_integrity, IntegrityReport, Suspicious};

mod report;
pub use report::{LoadReport, Report};

mod worker;
pub use worker::WorkerExit;

/// How long cancelled workers get to report in before they are abandoned.
const CANCEL_GRACE: Duration = Duration::from_millis(100);

/// Hands each worker its own connection to the store.
pub trait Connect: Send + Sync + 'static {
    type Conn: ListService;

    fn connect(&self) -> Result<Self::Conn>;
}

impl Connect for Arc<Store> {
    type Conn = Arc<Store>;

    fn connect(&self) -> Result<Arc<Store>> {
        Ok(self.clone())
    }
}

/// Connects through a [`Registry`] lookup, one TCP connection per worker.
pub struct RemoteConnector {
    registry: Registry,
    name: String,
    config: ClientConfig,
}

impl RemoteConnector {
    pub fn new(registry: Registry, name: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            registry,
            name: name.into(),
            config,
        }
    }
}

impl Connect for RemoteConnector {
    type Conn = Client;

    fn connect(&self) -> Result<Client> {
        Client::lookup(&self.registry, &self.name, &self.config)
    }
}

/// Run-wide counters shared by all workers.
#[derive(Default, Debug)]
pub struct Counters {
    operations: AtomicU64,
    errors: AtomicU64,
    skipped: AtomicU64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct CounterSnapshot {
    pub operations: u64,
    pub errors: u64,
    pub skipped: u64,
}

impl Counters {
    pub fn operation(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            operations: self.operations.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

pub struct Harness<C> {
    config: HarnessConfig,
    connector: Arc<C>,
}

impl<C: Connect> Harness<C> {
    pub fn new(config: HarnessConfig, connector: C) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Load phase followed by the integrity pass.
    pub fn run(&self) -> Result<Report> {
        let load = self.run_load();
        let integrity = self.verify()?;
        let report = Report { load, integrity };
        info!(
            elapsed_ms = report.load.elapsed.as_millis() as u64,
            operations = report.load.operations,
            errors = report.load.errors,
            throughput = report.load.throughput(),
            elements = report.integrity.total_elements,
            suspicious = report.integrity.suspicious.len(),
            "run complete"
        );
        Ok(report)
    }

    /// Runs the workers until they finish or the deadline passes.
    ///
    /// Past the deadline, workers that do not report in within a short grace
    /// period are detached rather than joined and counted as cancelled. Their
    /// late operations may still land in the store.
    pub fn run_load(&self) -> LoadReport {
        let counters = Arc::new(Counters::default());
        let cancel = Arc::new(Cancel::new());
        let (done_tx, done_rx) = mpsc::channel();

        info!(
            workers = self.config.workers,
            ops_per_worker = self.config.ops_per_worker,
            deadline_ms = self.config.deadline.as_millis() as u64,
            "load phase starting"
        );
        let start = Instant::now();

        let mut handles = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let spawned = {
                let connector = self.connector.clone();
                let config = self.config.clone();
                let counters = counters.clone();
                let cancel = cancel.clone();
                let done_tx = done_tx.clone();

                thread::Builder::new()
                    .name(format!("worker-{}", id))
                    .spawn(move || {
                        let exit = worker::run(id, &*connector, &config, &counters, &cancel);
                        let _ = done_tx.send(id);
                        exit
                    })
            };

            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(e) => {
                    counters.error();
                    warn!(worker = id, %e, "could not spawn worker");
                }
            }
        }
        drop(done_tx);

        let deadline = start + self.config.deadline;
        let mut done = HashSet::with_capacity(handles.len());
        let mut timed_out = false;
        while done.len() < handles.len() {
            let now = Instant::now();
            if now >= deadline {
                timed_out = true;
                break;
            }
            match done_rx.recv_timeout(deadline - now) {
                Ok(id) => {
                    done.insert(id);
                }
                Err(RecvTimeoutError::Timeout) => {
                    timed_out = true;
                    break;
                }
                // every sender is gone; the rest panicked
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if timed_out {
            warn!(
                pending = handles.len() - done.len(),
                "deadline reached, cancelling remaining workers"
            );
            cancel.cancel();
            // workers between calls notice the cancel at once
            let grace = Instant::now() + CANCEL_GRACE;
            while done.len() < handles.len() {
                let now = Instant::now();
                if now >= grace {
                    break;
                }
                match done_rx.recv_timeout(grace - now) {
                    Ok(id) => {
                        done.insert(id);
                    }
                    Err(_) => break,
                }
            }
        }
        let elapsed = start.elapsed();

        let mut report = LoadReport {
            elapsed,
            timed_out,
            ..LoadReport::default()
        };
        for (id, handle) in handles {
            // a worker stuck in a call is left to finish on its own
            if timed_out && !done.contains(&id) {
                debug!(worker = id, "abandoning worker blocked in a call");
                report.workers_cancelled += 1;
                continue;
            }
            match handle.join() {
                Ok(WorkerExit::Finished) => report.workers_finished += 1,
                Ok(WorkerExit::Cancelled) => report.workers_cancelled += 1,
                Ok(WorkerExit::Aborted) => report.workers_aborted += 1,
                Err(_) => {
                    counters.error();
                    report.workers_aborted += 1;
                    warn!(worker = id, "worker panicked");
                }
            }
        }

        let counts = counters.snapshot();
        report.operations = counts.operations;
        report.errors = counts.errors;
        report.skipped = counts.skipped;
        report
    }

    /// Connects once more and checks every list.
    pub fn verify(&self) -> Result<IntegrityReport> {
        let conn = self.connector.connect()?;
        check_integrity(&conn, &self.config)
    }
}
