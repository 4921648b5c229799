// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Log Reader
//!
//! Reads back what `EventLogWriter` produced.
//!
//! # Invariants
//! - Bad header → fail closed
//! - Incomplete final record (crash mid-append) → ignored with a warning
//! - CRC mismatch on a complete record → fail closed

use crate::events::event_log::{
    EventLogError, EventLogHeader, Result, HEADER_LEN, RECORD_PREFIX_LEN,
};
use replay_kernel::event::EventLogEntry;
use std::path::Path;

/// Decoded entries plus the length of the well-formed prefix of the input.
pub(crate) struct DecodedLog {
    pub(crate) entries: Vec<EventLogEntry>,
    pub(crate) valid_len: usize,
}

pub(crate) fn decode_records(bytes: &[u8]) -> Result<DecodedLog> {
    let header: &[u8; HEADER_LEN] = bytes
        .get(..HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or(EventLogError::InvalidHeader)?;
    EventLogHeader::from_bytes(header).validate()?;

    let mut entries = Vec::new();
    let mut offset = HEADER_LEN;

    while offset < bytes.len() {
        let rest = &bytes[offset..];
        if rest.len() < RECORD_PREFIX_LEN {
            tracing::warn!("Ignoring incomplete record prefix at end of log (offset {})", offset);
            break;
        }

        let mut word = [0u8; 4];
        word.copy_from_slice(&rest[0..4]);
        let len = u32::from_le_bytes(word) as usize;
        word.copy_from_slice(&rest[4..8]);
        let crc = u32::from_le_bytes(word);

        let Some(payload) = rest.get(RECORD_PREFIX_LEN..RECORD_PREFIX_LEN + len) else {
            tracing::warn!("Ignoring incomplete record at end of log (offset {})", offset);
            break;
        };

        if crc32fast::hash(payload) != crc {
            return Err(EventLogError::Corrupted { offset });
        }

        let (entry, _) = bincode::serde::decode_from_slice::<EventLogEntry, _>(
            payload,
            bincode::config::standard(),
        )
        .map_err(|e| EventLogError::Serialization(e.to_string()))?;

        entries.push(entry);
        offset += RECORD_PREFIX_LEN + len;
    }

    Ok(DecodedLog {
        entries,
        valid_len: offset.min(bytes.len()),
    })
}

/// Decode an in-memory copy of an event log
pub fn decode_event_log(bytes: &[u8]) -> Result<Vec<EventLogEntry>> {
    Ok(decode_records(bytes)?.entries)
}

/// Read every complete entry of an event log file, in append order
pub fn read_event_log(path: impl AsRef<Path>) -> Result<Vec<EventLogEntry>> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_event_log(&bytes)
}
