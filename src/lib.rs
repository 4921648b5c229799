// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![no_std]

//! replay-kernel: event model and deterministic task checksums for replay debugging.

extern crate alloc;

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod error;
pub mod types;
pub mod event;
pub mod checksum;
pub mod divergence;

pub use checksum::{checksum_bytes, task_checksum, ChecksumHasher, CHECKSUM_SEED};
pub use event::{ChecksumKey, EventLogEntry};

#[cfg(test)]
pub mod tests;
