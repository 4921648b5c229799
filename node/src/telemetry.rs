// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const EVENTS_LOGGED: &str = "replay_events_logged_total";
pub const EVENTS_DROPPED: &str = "replay_events_dropped_total";
pub const CHECKSUMS_EMITTED: &str = "replay_checksums_emitted_total";
pub const CHECKSUMS_SKIPPED: &str = "replay_checksums_skipped_total";
pub const REPORTER_UP: &str = "replay_reporter_up";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize telemetry (logs + metrics). Safe to call more than once.
pub fn init_telemetry() {
    // 1. Tracing
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "replay_node=debug".into()),
    );
    if tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }

    // 2. Prometheus recorder
    if PROM_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROM_HANDLE.set(handle).is_err() {
                tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
            }
        }
        Err(e) => {
            tracing::warn!("Metrics recorder not installed: {}", e);
            return;
        }
    }

    metrics::describe_counter!(EVENTS_LOGGED, "Events appended to the event log");
    metrics::describe_counter!(EVENTS_DROPPED, "Events discarded because a reporter queue was full");
    metrics::describe_counter!(CHECKSUMS_EMITTED, "Task and shuffle checksums reported");
    metrics::describe_counter!(CHECKSUMS_SKIPPED, "Tasks whose kind has no checksum policy");
    metrics::describe_gauge!(REPORTER_UP, "1 while an event reporter is running");

    metrics::gauge!(REPORTER_UP, 0.0);
}

/// Render the Prometheus exposition text.
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
