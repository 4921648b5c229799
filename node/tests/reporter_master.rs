mod common;

use common::{sequence_of, tagged, RecordingWriter};
use replay_kernel::checksum_bytes;
use replay_kernel::event::EventLogEntry;
use replay_kernel::types::{
    DatasetId, DatasetRef, ExceptionInfo, OutputSplit, Partition, ResultTask, ShuffleMapTask, StageId, Task,
    TaskResult,
};
use replay_node::{EventReporter, ReporterConfig, ReporterError};
use std::collections::BTreeMap;
use std::sync::Arc;

async fn start_master(config: ReporterConfig) -> (EventReporter, RecordingWriter) {
    let log = RecordingWriter::default();
    let writer = log.clone();
    let reporter = EventReporter::start_with_writer(config, move |_| Ok(writer))
        .await
        .unwrap();
    (reporter, log)
}

fn result_task(func: &[u8]) -> Task {
    Task::Result(ResultTask {
        stage: StageId(1),
        dataset_id: DatasetId(7),
        partition: Partition(3),
        func: Arc::from(func.to_vec()),
    })
}

#[tokio::test]
async fn test_result_checksum_end_to_end() {
    let (reporter, log) = start_master(ReporterConfig::master(0)).await;

    let task = result_task(&[9]);
    let result = TaskResult::new(vec![1u8, 2, 3], BTreeMap::new());
    reporter.report_task_checksum(&task, &result, &[1, 2, 3]).await.unwrap();
    reporter.stop().await.unwrap();

    assert_eq!(
        log.entries(),
        vec![EventLogEntry::ResultTaskChecksum {
            dataset_id: DatasetId(7),
            partition: Partition(3),
            func_hash: checksum_bytes(&[9]),
            result_hash: checksum_bytes(&[1, 2, 3]),
        }]
    );
    assert_eq!(log.stop_count(), 1);

    // Everything after stop is refused
    assert!(matches!(
        reporter.report_task_checksum(&task, &result, &[1, 2, 3]).await,
        Err(ReporterError::AlreadyStopped)
    ));
    assert!(matches!(reporter.stop().await, Err(ReporterError::AlreadyStopped)));
    assert_eq!(log.stop_count(), 1);
    assert_eq!(log.entries().len(), 1);
}

#[tokio::test]
async fn test_checksumming_disabled_emits_no_checksums() {
    let mut config = ReporterConfig::master(0);
    config.checksumming_enabled = false;
    let (reporter, log) = start_master(config).await;

    let shuffle = Task::ShuffleMap(ShuffleMapTask {
        stage: StageId(0),
        dataset_id: DatasetId(2),
        partition: Partition(0),
        shuffle_id: 0,
    });
    let mut updates = BTreeMap::new();
    updates.insert(1u64, b"5".to_vec());
    let result = TaskResult::new(vec![0u8], updates);

    reporter.report_task_checksum(&shuffle, &result, &[0]).await.unwrap();
    reporter.report_task_checksum(&result_task(&[9]), &result, &[1]).await.unwrap();
    reporter
        .report_shuffle_checksum(DatasetId(2), Partition(0), OutputSplit(1), 99)
        .await
        .unwrap();
    reporter.report_assertion_failure(tagged(2, 0)).await.unwrap();
    reporter.stop().await.unwrap();

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries.iter().all(|e| !e.is_checksum()));
}

#[tokio::test]
async fn test_master_only_events_are_logged_on_master() {
    let (reporter, log) = start_master(ReporterConfig::master(0)).await;

    let task = Arc::new(result_task(&[1]));
    let dataset = Arc::new(DatasetRef {
        id: DatasetId(7),
        name: "words".into(),
        num_partitions: 4,
    });
    let exception = ExceptionInfo {
        class_name: "ArithmeticError".into(),
        message: "divide by zero".into(),
        stack_trace: vec!["map at job.rs:12".into()],
    };

    reporter
        .report_rdd_creation(dataset.clone(), vec!["textFile at job.rs:3".into()])
        .await
        .unwrap();
    reporter.report_task_submission(vec![task.clone()]).await.unwrap();
    reporter.report_local_exception(exception, task.clone()).await.unwrap();
    reporter.stop().await.unwrap();

    let kinds: Vec<_> = log.entries().iter().map(|e| e.event_type()).collect();
    assert_eq!(kinds, vec!["RDDCreation", "TaskSubmission", "ExceptionEvent"]);

    // Events share the caller's task, they do not copy it
    match &log.entries()[1] {
        EventLogEntry::TaskSubmission { tasks } => assert!(Arc::ptr_eq(&tasks[0], &task)),
        other => panic!("unexpected entry {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_senders_keep_their_own_order() {
    const SENDERS: u64 = 8;
    const PER_SENDER: u32 = 200;

    let mut config = ReporterConfig::master(0);
    config.mailbox_capacity = 16;
    let (reporter, log) = start_master(config).await;
    let reporter = Arc::new(reporter);

    let mut senders = Vec::new();
    for sender in 0..SENDERS {
        let reporter = reporter.clone();
        senders.push(tokio::spawn(async move {
            for seq in 0..PER_SENDER {
                reporter.report_assertion_failure(tagged(sender, seq)).await.unwrap();
            }
        }));
    }
    for s in senders {
        s.await.unwrap();
    }
    reporter.stop().await.unwrap();

    let entries = log.entries();
    assert_eq!(entries.len(), (SENDERS as usize) * (PER_SENDER as usize));
    for sender in 0..SENDERS {
        assert_eq!(sequence_of(&entries, sender), (0..PER_SENDER).collect::<Vec<_>>());
    }
}
