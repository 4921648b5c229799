// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Task and dataset references.
//!
//! Events hold these behind `Arc` so building an event never deep-copies a
//! task or a dataset description that the scheduler already owns.

use super::id::{DatasetId, Partition, StageId};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// Serialized accumulator updates produced by a task, keyed by accumulator id.
///
/// Ordered map so the encoded form does not depend on insertion order.
pub type AccumUpdates = BTreeMap<u64, Vec<u8>>;

/// Shared reference to a task, as carried by events.
pub type TaskRef = Arc<Task>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetRef {
    pub id: DatasetId,
    pub name: String,
    pub num_partitions: u32,
}

/// A task that computes a final result for one partition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultTask {
    pub stage: StageId,
    pub dataset_id: DatasetId,
    pub partition: Partition,
    /// User function, already serialized by the engine's closure serializer.
    pub func: Arc<[u8]>,
}

/// A task that writes map output for a shuffle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShuffleMapTask {
    pub stage: StageId,
    pub dataset_id: DatasetId,
    pub partition: Partition,
    pub shuffle_id: u32,
}

/// Any task kind the checksum policy does not know about.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtherTask {
    pub kind: String,
    pub dataset_id: DatasetId,
    pub partition: Partition,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Task {
    Result(ResultTask),
    ShuffleMap(ShuffleMapTask),
    Other(OtherTask),
}

impl Task {
    pub fn dataset_id(&self) -> DatasetId {
        match self {
            Task::Result(t) => t.dataset_id,
            Task::ShuffleMap(t) => t.dataset_id,
            Task::Other(t) => t.dataset_id,
        }
    }

    pub fn partition(&self) -> Partition {
        match self {
            Task::Result(t) => t.partition,
            Task::ShuffleMap(t) => t.partition,
            Task::Other(t) => t.partition,
        }
    }

    /// Returns a human-readable name of the task variant
    pub fn kind_name(&self) -> &str {
        match self {
            Task::Result(_) => "ResultTask",
            Task::ShuffleMap(_) => "ShuffleMapTask",
            Task::Other(t) => &t.kind,
        }
    }
}

/// What a task handed back to the scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskResult {
    /// Raw output reference. For shuffle tasks this is the map-output
    /// location, which legitimately differs between runs.
    pub output: Arc<[u8]>,
    pub accum_updates: AccumUpdates,
}

impl TaskResult {
    pub fn new(output: impl Into<Arc<[u8]>>, accum_updates: AccumUpdates) -> Self {
        Self {
            output: output.into(),
            accum_updates,
        }
    }
}
