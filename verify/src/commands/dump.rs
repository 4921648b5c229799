// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use replay_node::events::read_event_log;
use std::io::Write;
use std::path::Path;

pub fn run(log: &Path) -> anyhow::Result<()> {
    let entries = read_event_log(log).with_context(|| format!("Failed to read event log {}", log.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for entry in &entries {
        serde_json::to_writer(&mut out, entry)?;
        writeln!(out)?;
    }
    Ok(())
}
