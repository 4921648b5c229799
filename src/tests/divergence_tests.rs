use crate::divergence::{compare_checksums, Divergence, Side};
use crate::event::{ChecksumKey, EventLogEntry};
use crate::types::{DatasetId, OutputSplit, Partition};
use std::vec::Vec;

fn result_entry(dataset: u64, partition: u32, func: u64, result: u64) -> EventLogEntry {
    EventLogEntry::ResultTaskChecksum {
        dataset_id: DatasetId(dataset),
        partition: Partition(partition),
        func_hash: func,
        result_hash: result,
    }
}

fn shuffle_entry(dataset: u64, partition: u32, hash: u64) -> EventLogEntry {
    EventLogEntry::ShuffleMapTaskChecksum {
        dataset_id: DatasetId(dataset),
        partition: Partition(partition),
        hash,
    }
}

fn result_key(dataset: u64, partition: u32) -> ChecksumKey {
    ChecksumKey::ResultTask {
        dataset_id: DatasetId(dataset),
        partition: Partition(partition),
    }
}

#[test]
fn test_identical_runs_do_not_diverge() {
    let run = vec![
        result_entry(1, 0, 10, 20),
        shuffle_entry(2, 0, 30),
        EventLogEntry::TaskSubmission { tasks: Vec::new() },
    ];
    assert!(compare_checksums(&run, &run).is_empty());
}

#[test]
fn test_arrival_order_does_not_matter() {
    let left = vec![result_entry(1, 0, 10, 20), result_entry(1, 1, 10, 21)];
    let right = vec![result_entry(1, 1, 10, 21), result_entry(1, 0, 10, 20)];
    assert!(compare_checksums(&left, &right).is_empty());
}

#[test]
fn test_function_mismatch_takes_precedence() {
    let left = vec![result_entry(1, 0, 10, 20)];
    let right = vec![result_entry(1, 0, 11, 21)];

    assert_eq!(
        compare_checksums(&left, &right),
        vec![Divergence::FunctionMismatch { key: result_key(1, 0), left: 10, right: 11 }]
    );
}

#[test]
fn test_result_mismatch() {
    let left = vec![result_entry(1, 0, 10, 20)];
    let right = vec![result_entry(1, 0, 10, 21)];

    assert_eq!(
        compare_checksums(&left, &right),
        vec![Divergence::ResultMismatch { key: result_key(1, 0), left: 20, right: 21 }]
    );
}

#[test]
fn test_missing_entries_on_both_sides() {
    let left = vec![result_entry(1, 0, 10, 20)];
    let right = vec![EventLogEntry::ShuffleOutputChecksum {
        dataset_id: DatasetId(3),
        partition: Partition(0),
        output_split: OutputSplit(1),
        checksum: 5,
    }];

    let divergences = compare_checksums(&left, &right);
    assert_eq!(divergences.len(), 2);
    assert_eq!(divergences[0], Divergence::MissingInRight { key: result_key(1, 0) });
    assert!(matches!(divergences[1], Divergence::MissingInLeft { .. }));
}

#[test]
fn test_rerun_inside_one_log_is_checked() {
    let left = vec![shuffle_entry(2, 0, 30), shuffle_entry(2, 0, 31)];
    let right = vec![shuffle_entry(2, 0, 30)];

    let divergences = compare_checksums(&left, &right);
    assert_eq!(divergences.len(), 1);
    assert!(matches!(divergences[0], Divergence::RerunMismatch { side: Side::Left, .. }));
}
