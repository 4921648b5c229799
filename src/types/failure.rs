// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Failure payloads.

use super::id::{DatasetId, Partition};
use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// An exception raised while running a task, captured as plain data.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub class_name: String,
    pub message: String,
    pub stack_trace: Vec<String>,
}

/// A user assertion that did not hold for some element of a partition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionFailure {
    pub dataset_id: DatasetId,
    pub partition: Partition,
    pub description: String,
}
