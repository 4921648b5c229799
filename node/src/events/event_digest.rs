// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Log Digest
//!
//! A compact fingerprint of a whole log: two runs whose logs have the same
//! digest recorded byte-identical event streams and need no further diffing.

use crate::events::event_log::Result;
use crate::events::event_reader::decode_records;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogDigest {
    /// Complete entries in the log
    pub entry_count: u64,

    /// How many of them are checksum entries
    pub checksum_count: u64,

    /// BLAKE3 hash of the well-formed prefix (header + complete records)
    pub log_hash: [u8; 32],
}

impl LogDigest {
    pub fn log_hash_hex(&self) -> String {
        self.log_hash.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Compute the digest of an event log file
pub fn digest_event_log(path: impl AsRef<Path>) -> Result<LogDigest> {
    let bytes = std::fs::read(path.as_ref())?;
    let decoded = decode_records(&bytes)?;

    Ok(LogDigest {
        entry_count: decoded.entries.len() as u64,
        checksum_count: decoded.entries.iter().filter(|e| e.is_checksum()).count() as u64,
        log_hash: *blake3::hash(&bytes[..decoded.valid_len]).as_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_log::{EventLogWriter, EventWriter};
    use replay_kernel::event::EventLogEntry;
    use replay_kernel::types::{DatasetId, Partition};
    use tempfile::tempdir;

    fn write_log(path: &Path, hashes: &[u64]) {
        let mut writer = EventLogWriter::open(path).unwrap();
        writer.log(&EventLogEntry::TaskSubmission { tasks: Vec::new() }).unwrap();
        for (i, hash) in hashes.iter().enumerate() {
            writer
                .log(&EventLogEntry::ShuffleMapTaskChecksum {
                    dataset_id: DatasetId(2),
                    partition: Partition(i as u32),
                    hash: *hash,
                })
                .unwrap();
        }
        writer.stop().unwrap();
    }

    #[test]
    fn test_same_events_same_digest() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        write_log(&a, &[1, 2, 3]);
        write_log(&b, &[1, 2, 3]);

        let da = digest_event_log(&a).unwrap();
        assert_eq!(da, digest_event_log(&b).unwrap());
        assert_eq!(da.entry_count, 4);
        assert_eq!(da.checksum_count, 3);
        assert_eq!(da.log_hash_hex().len(), 64);
    }

    #[test]
    fn test_different_checksum_different_digest() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        write_log(&a, &[1, 2, 3]);
        write_log(&b, &[1, 2, 4]);

        assert_ne!(
            digest_event_log(&a).unwrap().log_hash,
            digest_event_log(&b).unwrap().log_hash
        );
    }
}
