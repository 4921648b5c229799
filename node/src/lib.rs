// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod errors;
pub mod telemetry;
pub mod events;
pub mod network;
pub mod actor;
pub mod reporter;

pub use config::{Backpressure, ReporterConfig, Role};
pub use errors::{ReporterError, ReporterResult};
pub use reporter::EventReporter;
