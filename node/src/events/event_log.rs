// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Event Log Writer
//!
//! - Records are appended, never rewritten
//! - Each record is flushed to the OS as it is logged
//! - `stop()` fsyncs; nothing may be logged afterwards
//! - Bincode serialization for determinism
//!
//! # File Format
//! ```text
//! [Header: 16 bytes][Record][Record][Record]...
//! ```
//!
//! Header:
//! - magic: u32 ("RPLG")
//! - version: u32 (1)
//! - reserved: u64 (0)
//!
//! Record:
//! - len: u32 LE (payload length)
//! - crc32: u32 LE (of payload)
//! - payload: bincode `EventLogEntry`

use crate::events::event_reader::decode_records;
use replay_kernel::event::EventLogEntry;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub(crate) const LOG_MAGIC: u32 = 0x5250_4C47;
pub(crate) const LOG_VERSION: u32 = 1;
pub(crate) const HEADER_LEN: usize = 16;
pub(crate) const RECORD_PREFIX_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid header")]
    InvalidHeader,

    #[error("Event log corrupted at offset {offset}")]
    Corrupted { offset: usize },

    #[error("Event log already stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, EventLogError>;

/// The durable sink behind the reporter actor.
///
/// Only the actor calls these methods, from its single consumer thread.
pub trait EventWriter: Send + 'static {
    fn log(&mut self, entry: &EventLogEntry) -> Result<()>;

    /// Flush and close. Called exactly once, when the actor stops.
    fn stop(&mut self) -> Result<()>;
}

/// Event Log File Header (16 bytes)
pub(crate) struct EventLogHeader {
    pub(crate) magic: u32,
    pub(crate) version: u32,
    pub(crate) reserved: u64,
}

impl EventLogHeader {
    pub(crate) fn new() -> Self {
        Self {
            magic: LOG_MAGIC,
            version: LOG_VERSION,
            reserved: 0,
        }
    }

    pub(crate) fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.reserved.to_le_bytes());
        bytes
    }

    pub(crate) fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        let mut word = [0u8; 4];
        let mut long = [0u8; 8];
        word.copy_from_slice(&bytes[0..4]);
        let magic = u32::from_le_bytes(word);
        word.copy_from_slice(&bytes[4..8]);
        let version = u32::from_le_bytes(word);
        long.copy_from_slice(&bytes[8..16]);
        Self {
            magic,
            version,
            reserved: u64::from_le_bytes(long),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.magic != LOG_MAGIC || self.version != LOG_VERSION {
            return Err(EventLogError::InvalidHeader);
        }
        Ok(())
    }
}

/// Frame one entry as `len | crc32 | payload`.
pub(crate) fn encode_record(entry: &EventLogEntry) -> Result<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(entry, bincode::config::standard())
        .map_err(|e| EventLogError::Serialization(e.to_string()))?;
    let len = u32::try_from(payload.len())
        .map_err(|_| EventLogError::Serialization(format!("entry too large: {} bytes", payload.len())))?;

    let mut record = Vec::with_capacity(RECORD_PREFIX_LEN + payload.len());
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    record.extend_from_slice(&payload);
    Ok(record)
}

/// Append-Only Event Log Writer
pub struct EventLogWriter {
    path: PathBuf,
    file: BufWriter<File>,
    entry_count: u64,
    stopped: bool,
}

impl EventLogWriter {
    /// Open or create an event log file
    ///
    /// If the file exists, validates it and appends after the last complete record
    /// If it doesn't, creates it with a header
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let existing = match std::fs::metadata(&path) {
            Ok(meta) => meta.len() > 0,
            Err(_) => false,
        };

        let mut entry_count = 0;
        if existing {
            let bytes = std::fs::read(&path)?;
            let decoded = decode_records(&bytes)?;
            entry_count = decoded.entries.len() as u64;
            if decoded.valid_len < bytes.len() {
                // Drop a torn tail so new records follow the last complete one
                tracing::warn!(
                    "Truncating {} trailing bytes of {:?}",
                    bytes.len() - decoded.valid_len,
                    path
                );
                OpenOptions::new()
                    .write(true)
                    .open(&path)?
                    .set_len(decoded.valid_len as u64)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        if !existing {
            file.write_all(&EventLogHeader::new().to_bytes())?;
            file.sync_all()?; // fsync header
        }

        tracing::debug!("Opened event log {:?} ({} existing entries)", path, entry_count);

        Ok(Self {
            path,
            file: BufWriter::new(file),
            entry_count,
            stopped: false,
        })
    }

    /// Get the number of entries in the log
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventWriter for EventLogWriter {
    fn log(&mut self, entry: &EventLogEntry) -> Result<()> {
        if self.stopped {
            return Err(EventLogError::Stopped);
        }
        let record = encode_record(entry)?;
        self.file.write_all(&record)?;
        self.file.flush()?;
        self.entry_count += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.file.flush()?;
        // Force fsync (durability barrier for the reporter's stop)
        self.file.get_ref().sync_all()?;
        self.stopped = true;
        Ok(())
    }
}
