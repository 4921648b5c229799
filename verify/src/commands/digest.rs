// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use replay_node::events::digest_event_log;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct DigestReport {
    path: String,
    entry_count: u64,
    checksum_count: u64,
    log_hash: String,
}

pub fn run(log: &Path) -> anyhow::Result<()> {
    let digest = digest_event_log(log).with_context(|| format!("Failed to digest event log {}", log.display()))?;

    let report = DigestReport {
        path: log.display().to_string(),
        entry_count: digest.entry_count,
        checksum_count: digest.checksum_count,
        log_hash: digest.log_hash_hex(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
