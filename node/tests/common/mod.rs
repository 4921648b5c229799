#![allow(dead_code)]

use replay_kernel::event::EventLogEntry;
use replay_kernel::types::{AssertionFailure, DatasetId, Partition};
use replay_node::events::event_log::{EventLogError, Result as LogResult};
use replay_node::events::EventWriter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory writer; clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingWriter {
    entries: Arc<Mutex<Vec<EventLogEntry>>>,
    stops: Arc<AtomicUsize>,
}

impl RecordingWriter {
    pub fn entries(&self) -> Vec<EventLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl EventWriter for RecordingWriter {
    fn log(&mut self, entry: &EventLogEntry) -> LogResult<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    fn stop(&mut self) -> LogResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails every append.
pub struct BrokenWriter;

impl EventWriter for BrokenWriter {
    fn log(&mut self, _entry: &EventLogEntry) -> LogResult<()> {
        Err(EventLogError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
    }

    fn stop(&mut self) -> LogResult<()> {
        Ok(())
    }
}

/// Assertion event tagged with its sender and sequence number.
pub fn tagged(sender: u64, seq: u32) -> AssertionFailure {
    AssertionFailure {
        dataset_id: DatasetId(sender),
        partition: Partition(seq),
        description: format!("sender {sender} event {seq}"),
    }
}

/// Sequence numbers logged for `sender`, in log order.
pub fn sequence_of(entries: &[EventLogEntry], sender: u64) -> Vec<u32> {
    entries
        .iter()
        .filter_map(|e| match e {
            EventLogEntry::AssertionFailure(f) if f.dataset_id == DatasetId(sender) => Some(f.partition.0),
            _ => None,
        })
        .collect()
}
