// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Durable Event Log
//!
//! The master's event log is the only persisted artifact of the reporter.
//!
//! # Architecture
//! - `EventWriter` = the sink the reporter actor owns (one per master)
//! - `EventLogWriter` = append-only file implementation of that sink
//! - Reader + digest = offline side, used by tests and the verifier
//!
//! # Guarantees
//! - Records are appended in the order the actor dequeues them
//! - `stop()` flushes and fsyncs before the actor acknowledges
//! - A torn tail record is ignored on read, mid-file damage is an error

pub mod event_log;
pub mod event_reader;
pub mod event_digest;

pub use event_log::{EventLogError, EventLogWriter, EventWriter};
pub use event_reader::{decode_event_log, read_event_log};
pub use event_digest::{digest_event_log, LogDigest};
