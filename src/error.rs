// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use alloc::string::String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumError {
    /// The task variant has no checksum policy. Never fatal.
    Unsupported { kind: String },
    /// Accumulator updates could not be encoded.
    Encoding(String),
}

impl core::fmt::Display for ChecksumError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ChecksumError::Unsupported { kind } => {
                write!(f, "checksum skipped: unsupported task variant {kind}")
            }
            ChecksumError::Encoding(msg) => write!(f, "failed to encode accumulator updates: {msg}"),
        }
    }
}

pub type ChecksumResult<T> = core::result::Result<T, ChecksumError>;
