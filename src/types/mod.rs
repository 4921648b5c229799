// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Engine-facing types referenced by reported events.
//!
//! These are opaque to the reporter: it never schedules or executes anything,
//! it only annotates datasets and tasks with lifecycle and checksum events.

pub mod id;
pub mod task;
pub mod failure;

pub use id::{DatasetId, OutputSplit, Partition, StageId};
pub use task::{AccumUpdates, DatasetRef, OtherTask, ResultTask, ShuffleMapTask, Task, TaskRef, TaskResult};
pub use failure::{AssertionFailure, ExceptionInfo};
