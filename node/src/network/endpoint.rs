// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Master-side listener for remote reporters.
//!
//! Each accepted connection gets its own task. A connection forwards its
//! frames to the actor one at a time, so events from one worker keep their
//! send order. Different workers interleave freely.

use super::protocol::{self, Frame, FramedStream, WireError, PROTOCOL_VERSION, REPORTER_ENDPOINT_NAME};
use crate::actor::ActorHandle;
use crate::errors::ReporterError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct ReporterEndpoint {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    accept_task: JoinHandle<()>,
}

impl ReporterEndpoint {
    /// Bind `endpoint` and start accepting workers.
    ///
    /// Binding failures are configuration errors: nothing is spawned.
    pub async fn bind(endpoint: &str, actor: ActorHandle) -> Result<Self, ReporterError> {
        let listener = TcpListener::bind(endpoint)
            .await
            .map_err(|e| ReporterError::Configuration(format!("cannot bind {endpoint}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ReporterError::Configuration(format!("cannot read bound address: {e}")))?;

        info!("{} endpoint listening on {}", REPORTER_ENDPOINT_NAME, local_addr);

        let shutdown = CancellationToken::new();
        let accept_task = tokio::spawn(accept_loop(listener, actor, shutdown.clone()));

        Ok(Self {
            local_addr,
            shutdown,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and wait up to `grace` for open connections to finish.
    ///
    /// Frames a connection has already received are forwarded first. Anything
    /// still open after `grace` is aborted.
    pub async fn shutdown(self, grace: Duration) {
        self.shutdown.cancel();
        let mut accept_task = self.accept_task;
        match tokio::time::timeout(grace, &mut accept_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Endpoint accept task failed: {}", e),
            Err(_) => {
                warn!("Connections still open after {:?}, aborting them", grace);
                // Dropping the accept task's JoinSet aborts every connection task.
                accept_task.abort();
                let _ = accept_task.await;
            }
        }
        debug!("{} endpoint on {} closed", REPORTER_ENDPOINT_NAME, self.local_addr);
    }
}

async fn accept_loop(listener: TcpListener, actor: ActorHandle, shutdown: CancellationToken) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Reporter connection from {}", peer);
                    let actor = actor.clone();
                    let shutdown = shutdown.clone();
                    connections.spawn(async move {
                        if let Err(e) = serve_connection(protocol::framed(stream), actor, shutdown).await {
                            warn!("Reporter connection from {} ended: {}", peer, e);
                        }
                    });
                }
                Err(e) => warn!("Accept failed: {}", e),
            },
            // Reap finished connections as we go
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    while connections.join_next().await.is_some() {}
}

async fn serve_connection(
    mut stream: FramedStream,
    actor: ActorHandle,
    shutdown: CancellationToken,
) -> Result<(), WireError> {
    let hello = tokio::select! {
        biased;
        frame = protocol::recv_frame(&mut stream) => frame?,
        _ = shutdown.cancelled() => {
            debug!("Endpoint shutting down before handshake");
            return Ok(());
        }
    };

    match hello {
        Some(Frame::Hello {
            endpoint,
            protocol_version,
        }) => {
            if endpoint != REPORTER_ENDPOINT_NAME || protocol_version != PROTOCOL_VERSION {
                let reason = format!("unknown endpoint {endpoint} (protocol v{protocol_version})");
                protocol::send_frame(&mut stream, &Frame::Rejected { reason: reason.clone() }).await?;
                return Err(WireError::Rejected(reason));
            }
            protocol::send_frame(&mut stream, &Frame::Welcome).await?;
        }
        Some(other) => return Err(WireError::UnexpectedFrame(other.name())),
        None => return Err(WireError::Closed),
    }

    loop {
        let frame = tokio::select! {
            biased;
            frame = protocol::recv_frame(&mut stream) => frame?,
            // A worker that never says goodbye must not hold shutdown hostage.
            _ = shutdown.cancelled() => {
                debug!("Endpoint shutting down, dropping idle connection");
                return Ok(());
            }
        };

        match frame {
            Some(Frame::LogEvent(entry)) => {
                if let Err(e) = actor.log_event(entry).await {
                    // Actor gone: nothing more this connection can deliver.
                    return Err(WireError::Rejected(e.to_string()));
                }
            }
            Some(Frame::Goodbye) => {
                protocol::send_frame(&mut stream, &Frame::GoodbyeAck).await?;
                return Ok(());
            }
            Some(other) => return Err(WireError::UnexpectedFrame(other.name())),
            None => return Ok(()),
        }
    }
}
