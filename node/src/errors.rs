// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::events::event_log::EventLogError;
use crate::network::protocol::WireError;
use std::time::Duration;
use thiserror::Error;

/// Everything the reporting subsystem can fail with.
///
/// None of these are meant to take the surrounding job down: callers log
/// them or ignore them, the reporter itself never panics.
#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Could not resolve event reporter at {endpoint}: {reason}")]
    Resolution { endpoint: String, reason: String },

    #[error("Event log writer failed: {0}")]
    Writer(#[from] EventLogError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Event reporter already stopped")]
    AlreadyStopped,

    #[error("Event reporter did not acknowledge stop within {0:?}")]
    StopTimeout(Duration),
}

impl From<WireError> for ReporterError {
    fn from(e: WireError) -> Self {
        ReporterError::Transport(e.to_string())
    }
}

pub type ReporterResult<T> = Result<T, ReporterError>;
