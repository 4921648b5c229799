// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Task Checksums
//!
//! Seeded XXH64 digests over task results. Two runs of the same task are
//! compared by these digests, so the seed is a protocol constant: changing it
//! makes every previously recorded log incomparable.
//!
//! # Policy
//! - Result tasks: digest of the serialized result and, separately, of the
//!   serialized user function
//! - Shuffle map tasks: digest of the encoded accumulator updates only. The
//!   map output location is not part of the digest.
//! - Anything else: `ChecksumError::Unsupported`
//!
//! # Guarantee
//! Same bytes → same digest (any process, any run, any architecture)

use crate::error::{ChecksumError, ChecksumResult};
use crate::event::EventLogEntry;
use crate::types::{AccumUpdates, Task, TaskResult};
use alloc::string::ToString;
use alloc::vec::Vec;
use xxhash_rust::xxh64::{xxh64, Xxh64};

/// Seed shared by every checksum the reporter emits.
pub const CHECKSUM_SEED: u64 = 42;

/// Compute the fixed-seed digest of a byte slice
pub fn checksum_bytes(data: &[u8]) -> u64 {
    xxh64(data, CHECKSUM_SEED)
}

/// Incremental form of [`checksum_bytes`].
///
/// Feeding the same bytes in any chunking yields the one-shot digest.
#[derive(Clone)]
pub struct ChecksumHasher {
    state: Xxh64,
}

impl ChecksumHasher {
    pub fn new() -> Self {
        Self {
            state: Xxh64::new(CHECKSUM_SEED),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.state.update(bytes);
    }

    pub fn finish(&self) -> u64 {
        self.state.digest()
    }
}

impl Default for ChecksumHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical byte encoding of accumulator updates.
pub fn encode_accum_updates(updates: &AccumUpdates) -> ChecksumResult<Vec<u8>> {
    bincode::serde::encode_to_vec(updates, bincode::config::standard())
        .map_err(|e| ChecksumError::Encoding(e.to_string()))
}

/// Build the checksum entry for a finished task.
///
/// `serialized_result` is the result exactly as it is shipped back to the
/// driver; it is only consulted for result tasks.
pub fn task_checksum(
    task: &Task,
    result: &TaskResult,
    serialized_result: &[u8],
) -> ChecksumResult<EventLogEntry> {
    match task {
        Task::Result(t) => Ok(EventLogEntry::ResultTaskChecksum {
            dataset_id: t.dataset_id,
            partition: t.partition,
            func_hash: checksum_bytes(&t.func),
            result_hash: checksum_bytes(serialized_result),
        }),
        Task::ShuffleMap(t) => {
            let encoded = encode_accum_updates(&result.accum_updates)?;
            Ok(EventLogEntry::ShuffleMapTaskChecksum {
                dataset_id: t.dataset_id,
                partition: t.partition,
                hash: checksum_bytes(&encoded),
            })
        }
        Task::Other(t) => Err(ChecksumError::Unsupported {
            kind: t.kind.clone(),
        }),
    }
}
