// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Master/worker transport.
//!
//! The master registers its reporter under [`REPORTER_ENDPOINT_NAME`] on a TCP
//! listener; workers connect, name that endpoint in a handshake and then
//! stream events over the same connection.

pub mod protocol;
pub mod endpoint;
pub mod client;

pub use client::RemoteReporter;
pub use endpoint::ReporterEndpoint;
pub use protocol::{Frame, WireError, PROTOCOL_VERSION, REPORTER_ENDPOINT_NAME};
