// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Reporter Actor - The Single Writer
//!
//! Every event that reaches the log passes through this actor's mailbox.
//! One consumer thread drains the mailbox in arrival order and is the only
//! code that ever touches the writer, so appends never interleave.
//!
//! # States
//! ```text
//! Active --LogEvent--> Active
//! Active --Stop------> Stopped (writer flushed, ack sent, loop exits)
//! ```
//!
//! # Invariants
//! - Per-sender FIFO: a sender's events are appended in send order
//! - Nothing queued behind `Stop` is ever appended
//! - A writer failure ends the loop; the error surfaces from the join handle

use crate::config::Backpressure;
use crate::errors::ReporterError;
use crate::events::EventWriter;
use crate::telemetry;
use replay_kernel::event::EventLogEntry;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// What the actor accepts.
#[derive(Debug)]
pub enum ReporterMessage {
    LogEvent(EventLogEntry),
    Stop(oneshot::Sender<Result<StopAck, ReporterError>>),
}

/// Acknowledgement of a completed stop barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopAck {
    /// Entries this actor appended over its lifetime
    pub entries_logged: u64,
}

/// Sending side of the mailbox. Cheap to clone; one clone per sender.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    tx: mpsc::Sender<ReporterMessage>,
    backpressure: Backpressure,
}

/// Outcome of a successful enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    /// Queue was full under `DropWithWarning`
    Dropped,
}

/// Enqueue under the configured backpressure policy.
///
/// `DropWithWarning` never waits: a full queue drops the message. A closed
/// queue is always an error.
pub(crate) async fn enqueue<T>(
    tx: &mpsc::Sender<T>,
    msg: T,
    backpressure: Backpressure,
    queue: &'static str,
) -> Result<Enqueued, ReporterError> {
    match backpressure {
        Backpressure::Block => tx
            .send(msg)
            .await
            .map(|_| Enqueued::Queued)
            .map_err(|_| ReporterError::Transport(format!("{queue} is closed"))),
        Backpressure::DropWithWarning => match tx.try_send(msg) {
            Ok(()) => Ok(Enqueued::Queued),
            Err(TrySendError::Full(_)) => {
                tracing::warn!("{} is full, dropping event", queue);
                metrics::increment_counter!(telemetry::EVENTS_DROPPED);
                Ok(Enqueued::Dropped)
            }
            Err(TrySendError::Closed(_)) => {
                Err(ReporterError::Transport(format!("{queue} is closed")))
            }
        },
    }
}

impl ActorHandle {
    /// Fire-and-forget: returns once the event is in the mailbox, not once it is logged.
    pub async fn log_event(&self, entry: EventLogEntry) -> Result<Enqueued, ReporterError> {
        enqueue(&self.tx, ReporterMessage::LogEvent(entry), self.backpressure, "reporter mailbox").await
    }

    /// Blocking barrier: resolves after every earlier message was appended and
    /// the writer was flushed.
    ///
    /// The stop request itself always waits for mailbox capacity, whatever the
    /// backpressure policy.
    pub async fn stop(&self, timeout: Duration) -> Result<StopAck, ReporterError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        let barrier = async {
            self.tx
                .send(ReporterMessage::Stop(reply_tx))
                .await
                .map_err(|_| ReporterError::Transport("reporter mailbox is closed".into()))?;
            reply_rx
                .await
                .map_err(|_| ReporterError::Transport("reporter exited before acknowledging stop".into()))?
        };

        tokio::time::timeout(timeout, barrier)
            .await
            .map_err(|_| ReporterError::StopTimeout(timeout))?
    }
}

pub struct ReporterActor<W: EventWriter> {
    writer: W,
    mailbox: mpsc::Receiver<ReporterMessage>,
    entries_logged: u64,
}

/// Create the mailbox. The receiver goes to [`ReporterActor::spawn`].
pub fn mailbox(capacity: usize, backpressure: Backpressure) -> (ActorHandle, mpsc::Receiver<ReporterMessage>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ActorHandle { tx, backpressure }, rx)
}

impl<W: EventWriter> ReporterActor<W> {
    pub fn new(writer: W, mailbox: mpsc::Receiver<ReporterMessage>) -> Self {
        Self {
            writer,
            mailbox,
            entries_logged: 0,
        }
    }

    /// Run the actor on a dedicated blocking thread.
    ///
    /// The writer does synchronous file IO, so it stays off the async workers.
    pub fn spawn(self) -> JoinHandle<Result<(), ReporterError>> {
        tokio::task::spawn_blocking(move || self.run())
    }

    fn run(mut self) -> Result<(), ReporterError> {
        tracing::info!("Event reporter actor started");

        while let Some(msg) = self.mailbox.blocking_recv() {
            match msg {
                ReporterMessage::LogEvent(entry) => {
                    if let Err(e) = self.writer.log(&entry) {
                        tracing::error!(
                            "Event log write failed after {} entries: {}. Reporter actor exiting.",
                            self.entries_logged,
                            e
                        );
                        self.mailbox.close();
                        return Err(ReporterError::Writer(e));
                    }
                    self.entries_logged += 1;
                    metrics::increment_counter!(telemetry::EVENTS_LOGGED);
                    tracing::debug!("Logged {}", entry.event_type());
                }
                ReporterMessage::Stop(reply) => {
                    // Mailbox is closed from here on; anything queued behind Stop is dropped.
                    self.mailbox.close();
                    let result = self
                        .writer
                        .stop()
                        .map(|_| StopAck {
                            entries_logged: self.entries_logged,
                        })
                        .map_err(ReporterError::Writer);
                    tracing::info!(
                        "Event reporter actor stopped after {} entries",
                        self.entries_logged
                    );
                    if reply.send(result).is_err() {
                        tracing::warn!("Stop requester went away before the acknowledgement");
                    }
                    return Ok(());
                }
            }
        }

        // Every sender dropped without a Stop: still leave the log flushed.
        tracing::warn!("Reporter mailbox closed without a stop request, flushing writer");
        self.writer.stop()?;
        Ok(())
    }
}
