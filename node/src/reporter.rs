// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Reporter Facade
//!
//! The one object engine code talks to. Construction decides, from the role,
//! where events go:
//!
//! - **Master**: owns the writer through a local [`ReporterActor`] and exposes
//!   the actor to workers over a [`ReporterEndpoint`].
//! - **Worker**: forwards everything to the master via a [`RemoteReporter`].
//! - **Disabled**: every call returns `Ok(())` and does nothing.
//!
//! Reporting never fails the caller's job. Methods return `Result` so callers
//! can log problems, but none of them panic.

use crate::actor::{self, ActorHandle, Enqueued, ReporterActor};
use crate::config::{ReporterConfig, Role};
use crate::errors::{ReporterError, ReporterResult};
use crate::events::{EventLogError, EventLogWriter, EventWriter};
use crate::network::{RemoteReporter, ReporterEndpoint};
use crate::telemetry;
use replay_kernel::error::ChecksumError;
use replay_kernel::event::EventLogEntry;
use replay_kernel::types::{
    AssertionFailure, DatasetId, DatasetRef, ExceptionInfo, OutputSplit, Partition, Task, TaskRef, TaskResult,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

enum ActorLink {
    Local {
        handle: ActorHandle,
        actor: JoinHandle<ReporterResult<()>>,
        endpoint: ReporterEndpoint,
    },
    Remote {
        client: RemoteReporter,
        connection: JoinHandle<()>,
    },
}

/// A cloned send path, so no lock is held while a send waits for capacity.
enum Route {
    Local(ActorHandle),
    Remote(RemoteReporter),
}

impl Route {
    async fn send(self, entry: EventLogEntry) -> ReporterResult<Enqueued> {
        match self {
            Route::Local(handle) => handle.log_event(entry).await,
            Route::Remote(client) => client.log_event(entry).await,
        }
    }
}

pub struct EventReporter {
    role: Role,
    enabled: bool,
    checksumming_enabled: bool,
    stop_timeout: Duration,
    endpoint_addr: Option<SocketAddr>,
    link: RwLock<Option<ActorLink>>,
    stopped: AtomicBool,
}

impl EventReporter {
    /// Start a reporter that logs to `config.event_log_path` when it is the master.
    pub async fn start(config: ReporterConfig) -> ReporterResult<Self> {
        Self::start_with_writer(config, |cfg| EventLogWriter::open(&cfg.event_log_path)).await
    }

    /// Start a reporter with a caller-supplied writer.
    ///
    /// `make_writer` is only invoked for an enabled master.
    pub async fn start_with_writer<W, F>(config: ReporterConfig, make_writer: F) -> ReporterResult<Self>
    where
        W: EventWriter,
        F: FnOnce(&ReporterConfig) -> Result<W, EventLogError>,
    {
        if !config.enabled {
            info!("Event reporter disabled");
            return Ok(Self::new(&config, None, None));
        }
        config.validate()?;

        match config.role {
            Role::Master => {
                let writer = make_writer(&config)?;
                let (handle, mailbox) = actor::mailbox(config.mailbox_capacity, config.backpressure);
                let endpoint = ReporterEndpoint::bind(&config.endpoint()?, handle.clone()).await?;
                let addr = endpoint.local_addr();
                let actor = ReporterActor::new(writer, mailbox).spawn();

                metrics::gauge!(telemetry::REPORTER_UP, 1.0);
                info!("Event reporter started as master on {}", addr);
                Ok(Self::new(
                    &config,
                    Some(addr),
                    Some(ActorLink::Local {
                        handle,
                        actor,
                        endpoint,
                    }),
                ))
            }
            Role::Worker => {
                let (client, connection) = RemoteReporter::connect(&config).await?;
                metrics::gauge!(telemetry::REPORTER_UP, 1.0);
                info!("Event reporter started as worker of {}", client.endpoint());
                Ok(Self::new(&config, None, Some(ActorLink::Remote { client, connection })))
            }
        }
    }

    /// A reporter that ignores everything. Also the fallback when a worker
    /// cannot reach its master.
    pub fn disabled() -> Self {
        Self::new(&ReporterConfig::disabled(), None, None)
    }

    fn new(config: &ReporterConfig, endpoint_addr: Option<SocketAddr>, link: Option<ActorLink>) -> Self {
        Self {
            role: config.role,
            enabled: config.enabled,
            checksumming_enabled: config.checksumming_enabled,
            stop_timeout: config.stop_timeout,
            endpoint_addr,
            link: RwLock::new(link),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_checksumming_enabled(&self) -> bool {
        self.checksumming_enabled
    }

    /// Address the master endpoint is bound to. `None` for workers and
    /// disabled reporters.
    pub fn endpoint_addr(&self) -> Option<SocketAddr> {
        self.endpoint_addr
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    // --- Reporting ---------------------------------------------------------

    pub async fn report_assertion_failure(&self, failure: AssertionFailure) -> ReporterResult<()> {
        self.send(EventLogEntry::AssertionFailure(failure)).await
    }

    pub async fn report_exception(&self, exception: ExceptionInfo, task: TaskRef) -> ReporterResult<()> {
        self.send(EventLogEntry::ExceptionEvent { exception, task }).await
    }

    /// Checksum a finished task and report it.
    ///
    /// Tasks without a checksum policy are skipped with a warning.
    pub async fn report_task_checksum(
        &self,
        task: &Task,
        result: &TaskResult,
        serialized_result: &[u8],
    ) -> ReporterResult<()> {
        self.ensure_running()?;
        if !self.enabled || !self.checksumming_enabled {
            return Ok(());
        }

        match replay_kernel::task_checksum(task, result, serialized_result) {
            Ok(entry) => self.send_checksum(entry).await,
            Err(ChecksumError::Unsupported { kind }) => {
                warn!(
                    "Skipping checksum for unknown task kind {} ({}:{})",
                    kind,
                    task.dataset_id(),
                    task.partition()
                );
                metrics::increment_counter!(telemetry::CHECKSUMS_SKIPPED);
                Ok(())
            }
            Err(e) => {
                warn!("Skipping checksum for {}: {}", task.kind_name(), e);
                metrics::increment_counter!(telemetry::CHECKSUMS_SKIPPED);
                Ok(())
            }
        }
    }

    pub async fn report_shuffle_checksum(
        &self,
        dataset_id: DatasetId,
        partition: Partition,
        output_split: OutputSplit,
        checksum: u64,
    ) -> ReporterResult<()> {
        self.ensure_running()?;
        if !self.enabled || !self.checksumming_enabled {
            return Ok(());
        }
        self.send_checksum(EventLogEntry::ShuffleOutputChecksum {
            dataset_id,
            partition,
            output_split,
            checksum,
        })
        .await
    }

    // Master-only. Workers have no writer, so these are no-ops there.

    pub async fn report_local_exception(&self, exception: ExceptionInfo, task: TaskRef) -> ReporterResult<()> {
        self.send_local(EventLogEntry::ExceptionEvent { exception, task }).await
    }

    pub async fn report_rdd_creation(&self, dataset: Arc<DatasetRef>, stack_trace: Vec<String>) -> ReporterResult<()> {
        self.send_local(EventLogEntry::RddCreation { dataset, stack_trace }).await
    }

    pub async fn report_task_submission(&self, tasks: Vec<TaskRef>) -> ReporterResult<()> {
        self.send_local(EventLogEntry::TaskSubmission { tasks }).await
    }

    fn ensure_running(&self) -> ReporterResult<()> {
        if self.is_stopped() {
            return Err(ReporterError::AlreadyStopped);
        }
        Ok(())
    }

    async fn route(&self) -> Option<Route> {
        let link = self.link.read().await;
        match link.as_ref()? {
            ActorLink::Local { handle, .. } => Some(Route::Local(handle.clone())),
            ActorLink::Remote { client, .. } => Some(Route::Remote(client.clone())),
        }
    }

    async fn send(&self, entry: EventLogEntry) -> ReporterResult<()> {
        self.deliver(entry).await.map(|_| ())
    }

    /// Counted as emitted only once it is actually queued.
    async fn send_checksum(&self, entry: EventLogEntry) -> ReporterResult<()> {
        if self.deliver(entry).await? == Enqueued::Queued {
            metrics::increment_counter!(telemetry::CHECKSUMS_EMITTED);
        }
        Ok(())
    }

    async fn deliver(&self, entry: EventLogEntry) -> ReporterResult<Enqueued> {
        self.ensure_running()?;
        if !self.enabled {
            return Ok(Enqueued::Dropped);
        }
        match self.route().await {
            Some(route) => route.send(entry).await,
            // Link already taken by a concurrent stop()
            None => Err(ReporterError::AlreadyStopped),
        }
    }

    /// Master-side events still go through the actor so the writer keeps a
    /// single owner.
    async fn send_local(&self, entry: EventLogEntry) -> ReporterResult<()> {
        self.ensure_running()?;
        if !self.enabled {
            return Ok(());
        }
        if self.role == Role::Worker {
            trace!("Ignoring {} on worker", entry.event_type());
            return Ok(());
        }
        self.send(entry).await
    }

    // --- Shutdown ----------------------------------------------------------

    /// Flush and close the reporter. Only the first call does anything; later
    /// calls return [`ReporterError::AlreadyStopped`].
    ///
    /// On the master this closes the endpoint, then waits for the actor to
    /// drain its mailbox and flush the writer. On a worker it flushes the
    /// connection to the master; the master keeps running.
    pub async fn stop(&self) -> ReporterResult<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Err(ReporterError::AlreadyStopped);
        }
        let link = self.link.write().await.take();

        let outcome = match link {
            None => Ok(()),
            Some(ActorLink::Local {
                handle,
                actor,
                endpoint,
            }) => {
                endpoint.shutdown(self.stop_timeout).await;
                match handle.stop(self.stop_timeout).await {
                    Ok(ack) => {
                        info!("Event reporter stopped, {} entries logged", ack.entries_logged);
                        if let Err(e) = actor.await {
                            error!("Reporter actor task failed: {}", e);
                        }
                        Ok(())
                    }
                    // The actor is gone; its join handle says why.
                    Err(ReporterError::Transport(reason)) => match actor.await {
                        Ok(Err(failure)) => Err(failure),
                        _ => Err(ReporterError::Transport(reason)),
                    },
                    Err(e) => Err(e),
                }
            }
            Some(ActorLink::Remote { client, connection }) => {
                let outcome = client.stop(self.stop_timeout).await;
                drop(client);
                if outcome.is_err() {
                    connection.abort();
                }
                if let Err(e) = connection.await {
                    if !e.is_cancelled() {
                        error!("Reporter connection task failed: {}", e);
                    }
                }
                debug!("Worker reporter stopped");
                outcome
            }
        };

        if self.enabled {
            metrics::gauge!(telemetry::REPORTER_UP, 0.0);
        }
        if let Err(e) = &outcome {
            warn!("Event reporter stop finished with error: {}", e);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_log::Result as LogResult;
    use replay_kernel::types::{OtherTask, ResultTask, StageId};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recording {
        entries: Arc<Mutex<Vec<EventLogEntry>>>,
    }

    impl EventWriter for Recording {
        fn log(&mut self, entry: &EventLogEntry) -> LogResult<()> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        fn stop(&mut self) -> LogResult<()> {
            Ok(())
        }
    }

    fn result_task() -> Task {
        Task::Result(ResultTask {
            stage: StageId(0),
            dataset_id: DatasetId(1),
            partition: Partition(0),
            func: Arc::from(vec![9u8]),
        })
    }

    #[tokio::test]
    async fn test_disabled_reporter_is_inert() {
        let reporter = EventReporter::disabled();
        let task = Arc::new(result_task());
        let result = TaskResult::new(vec![1u8], BTreeMap::new());

        assert!(!reporter.is_enabled());
        reporter.report_task_checksum(&task, &result, &[1]).await.unwrap();
        reporter.report_task_submission(vec![task]).await.unwrap();
        reporter.stop().await.unwrap();
        assert!(matches!(reporter.stop().await, Err(ReporterError::AlreadyStopped)));
    }

    #[tokio::test]
    async fn test_master_without_port_is_rejected() {
        let config = ReporterConfig::default();
        let outcome = EventReporter::start_with_writer(config, |_| Ok(Recording::default())).await;
        assert!(matches!(outcome, Err(ReporterError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_unsupported_task_is_skipped() {
        let log = Recording::default();
        let writer = log.clone();
        let reporter = EventReporter::start_with_writer(ReporterConfig::master(0), move |_| Ok(writer))
            .await
            .unwrap();

        let task = Task::Other(OtherTask {
            kind: "BarrierTask".into(),
            dataset_id: DatasetId(4),
            partition: Partition(2),
        });
        let result = TaskResult::new(vec![0u8], BTreeMap::new());
        reporter.report_task_checksum(&task, &result, &[0]).await.unwrap();
        reporter.stop().await.unwrap();

        assert!(log.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_master_binds_ephemeral_port() {
        let reporter = EventReporter::start_with_writer(ReporterConfig::master(0), |_| Ok(Recording::default()))
            .await
            .unwrap();

        let addr = reporter.endpoint_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(reporter.role(), Role::Master);
        reporter.stop().await.unwrap();
        assert!(reporter.is_stopped());
    }
}
