// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Worker-side handle to the master's reporter endpoint.

use super::protocol::{self, Frame, FramedStream, WireError, PROTOCOL_VERSION, REPORTER_ENDPOINT_NAME};
use crate::actor::{enqueue, Enqueued};
use crate::config::{Backpressure, ReporterConfig};
use crate::errors::ReporterError;
use replay_kernel::event::EventLogEntry;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

enum Outbound {
    Event(EventLogEntry),
    Close(oneshot::Sender<Result<(), ReporterError>>),
}

/// Forwards events to the master over one TCP connection.
///
/// Sends are queued locally and written by a single connection task, so the
/// master sees them in the order this worker reported them.
#[derive(Clone)]
pub struct RemoteReporter {
    endpoint: String,
    tx: mpsc::Sender<Outbound>,
    backpressure: Backpressure,
}

impl RemoteReporter {
    /// Resolve the master's endpoint and complete the handshake.
    ///
    /// Tries `connect_attempts` times, each bounded by `connect_timeout`,
    /// sleeping `retry_backoff * attempt` in between. Returns the client and
    /// the connection task that owns the socket.
    pub async fn connect(config: &ReporterConfig) -> Result<(Self, JoinHandle<()>), ReporterError> {
        let endpoint = config.endpoint()?;
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=config.connect_attempts {
            match tokio::time::timeout(config.connect_timeout, handshake(&endpoint)).await {
                Ok(Ok(stream)) => {
                    info!("Connected to {} at {} (attempt {})", REPORTER_ENDPOINT_NAME, endpoint, attempt);
                    let (tx, rx) = mpsc::channel(config.mailbox_capacity);
                    let connection = tokio::spawn(run_connection(stream, rx, endpoint.clone()));
                    let client = Self {
                        endpoint,
                        tx,
                        backpressure: config.backpressure,
                    };
                    return Ok((client, connection));
                }
                Ok(Err(WireError::Rejected(reason))) => {
                    // The peer answered; retrying will not change its mind.
                    return Err(ReporterError::Resolution { endpoint, reason });
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = format!("timed out after {:?}", config.connect_timeout),
            }

            warn!(
                "Attempt {}/{} to reach {} failed: {}",
                attempt, config.connect_attempts, endpoint, last_error
            );
            if attempt < config.connect_attempts {
                tokio::time::sleep(config.retry_backoff * attempt).await;
            }
        }

        Err(ReporterError::Resolution {
            endpoint,
            reason: last_error,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Queue an event for the master. Fire-and-forget.
    pub async fn log_event(&self, entry: EventLogEntry) -> Result<Enqueued, ReporterError> {
        enqueue(&self.tx, Outbound::Event(entry), self.backpressure, "remote reporter queue").await
    }

    /// Flush everything queued so far, say goodbye and wait for the master to
    /// confirm it has received it all.
    pub async fn stop(&self, timeout: Duration) -> Result<(), ReporterError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        let close = async {
            self.tx
                .send(Outbound::Close(reply_tx))
                .await
                .map_err(|_| ReporterError::Transport("remote reporter connection is closed".into()))?;
            reply_rx
                .await
                .map_err(|_| ReporterError::Transport("connection task exited before closing".into()))?
        };

        tokio::time::timeout(timeout, close)
            .await
            .map_err(|_| ReporterError::StopTimeout(timeout))?
    }
}

async fn handshake(endpoint: &str) -> Result<FramedStream, WireError> {
    let stream = TcpStream::connect(endpoint).await?;
    stream.set_nodelay(true)?;
    let mut stream = protocol::framed(stream);

    let hello = Frame::Hello {
        endpoint: REPORTER_ENDPOINT_NAME.to_string(),
        protocol_version: PROTOCOL_VERSION,
    };
    protocol::send_frame(&mut stream, &hello).await?;

    match protocol::recv_frame(&mut stream).await? {
        Some(Frame::Welcome) => Ok(stream),
        Some(Frame::Rejected { reason }) => Err(WireError::Rejected(reason)),
        Some(other) => Err(WireError::UnexpectedFrame(other.name())),
        None => Err(WireError::Closed),
    }
}

async fn run_connection(mut stream: FramedStream, mut rx: mpsc::Receiver<Outbound>, endpoint: String) {
    while let Some(msg) = rx.recv().await {
        match msg {
            Outbound::Event(entry) => {
                if let Err(e) = protocol::send_frame(&mut stream, &Frame::LogEvent(entry)).await {
                    error!("Lost connection to {}: {}", endpoint, e);
                    fail_pending(&mut rx, &e);
                    return;
                }
            }
            Outbound::Close(reply) => {
                let result = goodbye(&mut stream).await.map_err(ReporterError::from);
                match &result {
                    Ok(()) => debug!("Closed connection to {}", endpoint),
                    Err(e) => warn!("Unclean close of connection to {}: {}", endpoint, e),
                }
                rx.close();
                let _ = reply.send(result);
                return;
            }
        }
    }
    // All clients dropped without closing; the master sees EOF.
    debug!("Remote reporter for {} dropped", endpoint);
}

async fn goodbye(stream: &mut FramedStream) -> Result<(), WireError> {
    protocol::send_frame(stream, &Frame::Goodbye).await?;
    match protocol::recv_frame(stream).await? {
        Some(Frame::GoodbyeAck) => Ok(()),
        Some(other) => Err(WireError::UnexpectedFrame(other.name())),
        None => Err(WireError::Closed),
    }
}

/// Refuse everything still queued after the connection broke.
fn fail_pending(rx: &mut mpsc::Receiver<Outbound>, cause: &WireError) {
    rx.close();
    let mut dropped = 0usize;
    while let Ok(msg) = rx.try_recv() {
        match msg {
            Outbound::Event(_) => dropped += 1,
            Outbound::Close(reply) => {
                let _ = reply.send(Err(ReporterError::Transport(cause.to_string())));
            }
        }
    }
    if dropped > 0 {
        warn!("Discarded {} queued events after connection loss", dropped);
    }
}
