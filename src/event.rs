// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Log Entries
//!
//! This module defines the closed set of events the reporter records.
//! Every entry is immutable once constructed and is appended to the
//! master's event log by exactly one writer.
//!
//! # Invariants
//! - Checksum entries carry digests only, never raw task output
//! - Task and dataset payloads are shared through `Arc`, never deep-copied
//! - Same task execution => same checksum entry (on any process, any run)

use crate::types::{AssertionFailure, DatasetId, DatasetRef, ExceptionInfo, OutputSplit, Partition, TaskRef};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// EventLogEntry is the unit appended to the event log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventLogEntry {
    /// A user assertion failed inside a task
    AssertionFailure(AssertionFailure),

    /// A task raised an exception
    ExceptionEvent {
        exception: ExceptionInfo,
        task: TaskRef,
    },

    /// A dataset was defined; `stack_trace` records where in user code
    RddCreation {
        dataset: Arc<DatasetRef>,
        stack_trace: Vec<String>,
    },

    /// A batch of tasks was handed to the scheduler
    TaskSubmission {
        tasks: Vec<TaskRef>,
    },

    ResultTaskChecksum {
        dataset_id: DatasetId,
        partition: Partition,
        func_hash: u64,
        result_hash: u64,
    },

    ShuffleMapTaskChecksum {
        dataset_id: DatasetId,
        partition: Partition,
        hash: u64,
    },

    ShuffleOutputChecksum {
        dataset_id: DatasetId,
        partition: Partition,
        output_split: OutputSplit,
        checksum: u64,
    },
}

/// Identifies "the same checksum" across two independent runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChecksumKey {
    ResultTask {
        dataset_id: DatasetId,
        partition: Partition,
    },
    ShuffleMapTask {
        dataset_id: DatasetId,
        partition: Partition,
    },
    ShuffleOutput {
        dataset_id: DatasetId,
        partition: Partition,
        output_split: OutputSplit,
    },
}

impl EventLogEntry {
    /// Returns a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            EventLogEntry::AssertionFailure(_) => "AssertionFailure",
            EventLogEntry::ExceptionEvent { .. } => "ExceptionEvent",
            EventLogEntry::RddCreation { .. } => "RDDCreation",
            EventLogEntry::TaskSubmission { .. } => "TaskSubmission",
            EventLogEntry::ResultTaskChecksum { .. } => "ResultTaskChecksum",
            EventLogEntry::ShuffleMapTaskChecksum { .. } => "ShuffleMapTaskChecksum",
            EventLogEntry::ShuffleOutputChecksum { .. } => "ShuffleOutputChecksum",
        }
    }

    pub fn is_checksum(&self) -> bool {
        self.checksum_key().is_some()
    }

    pub fn checksum_key(&self) -> Option<ChecksumKey> {
        match *self {
            EventLogEntry::ResultTaskChecksum { dataset_id, partition, .. } => {
                Some(ChecksumKey::ResultTask { dataset_id, partition })
            }
            EventLogEntry::ShuffleMapTaskChecksum { dataset_id, partition, .. } => {
                Some(ChecksumKey::ShuffleMapTask { dataset_id, partition })
            }
            EventLogEntry::ShuffleOutputChecksum { dataset_id, partition, output_split, .. } => {
                Some(ChecksumKey::ShuffleOutput { dataset_id, partition, output_split })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResultTask, StageId, Task};

    fn sample_task() -> TaskRef {
        Arc::new(Task::Result(ResultTask {
            stage: StageId(1),
            dataset_id: DatasetId(7),
            partition: Partition(3),
            func: Arc::from(&[9u8][..]),
        }))
    }

    #[test]
    fn test_entry_serialization_determinism() {
        let entry = EventLogEntry::TaskSubmission {
            tasks: vec![sample_task(), sample_task()],
        };

        let bytes1 = bincode::serde::encode_to_vec(&entry, bincode::config::standard()).unwrap();
        let bytes2 = bincode::serde::encode_to_vec(&entry, bincode::config::standard()).unwrap();

        assert_eq!(bytes1, bytes2, "Entry serialization must be deterministic");
    }

    #[test]
    fn test_entry_roundtrip_preserves_shared_payload() {
        let original = EventLogEntry::ExceptionEvent {
            exception: ExceptionInfo {
                class_name: "java.lang.ArithmeticException".into(),
                message: "/ by zero".into(),
                stack_trace: vec!["Job.scala:12".into()],
            },
            task: sample_task(),
        };

        let bytes = bincode::serde::encode_to_vec(&original, bincode::config::standard()).unwrap();
        let (decoded, _): (EventLogEntry, _) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn test_building_event_shares_task() {
        let task = sample_task();
        let entry = EventLogEntry::TaskSubmission { tasks: vec![task.clone()] };

        assert_eq!(Arc::strong_count(&task), 2);
        drop(entry);
        assert_eq!(Arc::strong_count(&task), 1);
    }

    #[test]
    fn test_checksum_keys() {
        let entry = EventLogEntry::ShuffleOutputChecksum {
            dataset_id: DatasetId(1),
            partition: Partition(2),
            output_split: OutputSplit(3),
            checksum: 99,
        };
        assert!(entry.is_checksum());
        assert_eq!(
            entry.checksum_key(),
            Some(ChecksumKey::ShuffleOutput {
                dataset_id: DatasetId(1),
                partition: Partition(2),
                output_split: OutputSplit(3),
            })
        );

        let entry = EventLogEntry::TaskSubmission { tasks: Vec::new() };
        assert!(!entry.is_checksum());
        assert_eq!(entry.event_type(), "TaskSubmission");
    }
}
