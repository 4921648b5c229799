// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Cross-run checksum comparison.
//!
//! Given the entries of two logs recorded for the same computation, report
//! every checksum that does not line up. Output is ordered by `ChecksumKey`
//! so two comparisons of the same logs print identically.

use crate::event::{ChecksumKey, EventLogEntry};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Divergence {
    /// The user function itself serialized differently.
    FunctionMismatch { key: ChecksumKey, left: u64, right: u64 },
    /// Same function, different result.
    ResultMismatch { key: ChecksumKey, left: u64, right: u64 },
    /// Shuffle-map or shuffle-output digest differs.
    HashMismatch { key: ChecksumKey, left: u64, right: u64 },
    /// A rerun of the task inside one log produced a different digest.
    RerunMismatch { key: ChecksumKey, side: Side },
    MissingInLeft { key: ChecksumKey },
    MissingInRight { key: ChecksumKey },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Digest {
    Result { func: u64, result: u64 },
    Single(u64),
}

fn digest_of(entry: &EventLogEntry) -> Option<Digest> {
    match *entry {
        EventLogEntry::ResultTaskChecksum { func_hash, result_hash, .. } => Some(Digest::Result {
            func: func_hash,
            result: result_hash,
        }),
        EventLogEntry::ShuffleMapTaskChecksum { hash, .. } => Some(Digest::Single(hash)),
        EventLogEntry::ShuffleOutputChecksum { checksum, .. } => Some(Digest::Single(checksum)),
        _ => None,
    }
}

/// First occurrence of each key wins; later differing occurrences are
/// reported as reruns that disagree.
fn index(entries: &[EventLogEntry], side: Side, out: &mut Vec<Divergence>) -> BTreeMap<ChecksumKey, Digest> {
    let mut map = BTreeMap::new();
    for entry in entries {
        let (Some(key), Some(digest)) = (entry.checksum_key(), digest_of(entry)) else {
            continue;
        };
        match map.get(&key) {
            None => {
                map.insert(key, digest);
            }
            Some(existing) if *existing != digest => {
                out.push(Divergence::RerunMismatch { key, side });
            }
            Some(_) => {}
        }
    }
    map
}

pub fn compare_checksums(left: &[EventLogEntry], right: &[EventLogEntry]) -> Vec<Divergence> {
    let mut out = Vec::new();
    let left_map = index(left, Side::Left, &mut out);
    let right_map = index(right, Side::Right, &mut out);

    for (key, l) in &left_map {
        match (l, right_map.get(key)) {
            (_, None) => out.push(Divergence::MissingInRight { key: *key }),
            (Digest::Result { func: lf, result: lr }, Some(Digest::Result { func: rf, result: rr })) => {
                if lf != rf {
                    out.push(Divergence::FunctionMismatch { key: *key, left: *lf, right: *rf });
                } else if lr != rr {
                    out.push(Divergence::ResultMismatch { key: *key, left: *lr, right: *rr });
                }
            }
            (Digest::Single(a), Some(Digest::Single(b))) => {
                if a != b {
                    out.push(Divergence::HashMismatch { key: *key, left: *a, right: *b });
                }
            }
            // Keys encode the entry kind, so the digest shapes always agree.
            _ => {}
        }
    }

    for key in right_map.keys() {
        if !left_map.contains_key(key) {
            out.push(Divergence::MissingInLeft { key: *key });
        }
    }

    out
}

impl Divergence {
    pub fn key(&self) -> ChecksumKey {
        match self {
            Divergence::FunctionMismatch { key, .. }
            | Divergence::ResultMismatch { key, .. }
            | Divergence::HashMismatch { key, .. }
            | Divergence::RerunMismatch { key, .. }
            | Divergence::MissingInLeft { key }
            | Divergence::MissingInRight { key } => *key,
        }
    }
}
