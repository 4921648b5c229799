// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use replay_kernel::divergence::{compare_checksums, Divergence, Side};
use replay_kernel::event::ChecksumKey;
use replay_node::events::read_event_log;
use std::path::Path;

/// Print the divergences between two logs and return how many there were.
pub fn run(left: &Path, right: &Path) -> anyhow::Result<usize> {
    let left_entries = read_event_log(left).with_context(|| format!("Failed to read {}", left.display()))?;
    let right_entries = read_event_log(right).with_context(|| format!("Failed to read {}", right.display()))?;

    let divergences = compare_checksums(&left_entries, &right_entries);
    if divergences.is_empty() {
        println!("No divergence: {} and {} agree on every checksum", left.display(), right.display());
        return Ok(0);
    }

    println!("{}", render(&divergences));
    println!("{} divergence(s)", divergences.len());
    Ok(divergences.len())
}

fn render(divergences: &[Divergence]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Task", "Divergence", "Left", "Right"]);

    for d in divergences {
        table.add_row(row(d));
    }
    table
}

fn row(d: &Divergence) -> Vec<String> {
    let hex = |h: u64| format!("0x{:016x}", h);
    let (kind, left, right) = match *d {
        Divergence::FunctionMismatch { left, right, .. } => ("function differs", hex(left), hex(right)),
        Divergence::ResultMismatch { left, right, .. } => ("result differs", hex(left), hex(right)),
        Divergence::HashMismatch { left, right, .. } => ("hash differs", hex(left), hex(right)),
        Divergence::RerunMismatch { side: Side::Left, .. } => ("reruns disagree", "inconsistent".into(), "-".into()),
        Divergence::RerunMismatch { side: Side::Right, .. } => ("reruns disagree", "-".into(), "inconsistent".into()),
        Divergence::MissingInLeft { .. } => ("missing", "absent".into(), "present".into()),
        Divergence::MissingInRight { .. } => ("missing", "present".into(), "absent".into()),
    };
    vec![describe(d.key()), kind.to_string(), left, right]
}

fn describe(key: ChecksumKey) -> String {
    match key {
        ChecksumKey::ResultTask { dataset_id, partition } => format!("result {}:{}", dataset_id, partition),
        ChecksumKey::ShuffleMapTask { dataset_id, partition } => format!("shuffle-map {}:{}", dataset_id, partition),
        ChecksumKey::ShuffleOutput {
            dataset_id,
            partition,
            output_split,
        } => format!("shuffle-output {}:{}/{}", dataset_id, partition, output_split.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_kernel::types::{DatasetId, Partition};

    #[test]
    fn test_row_names_task_and_hashes() {
        let key = ChecksumKey::ResultTask {
            dataset_id: DatasetId(7),
            partition: Partition(3),
        };
        let cells = row(&Divergence::ResultMismatch { key, left: 1, right: 2 });

        assert_eq!(cells[0], "result rdd_7:p3");
        assert_eq!(cells[1], "result differs");
        assert_eq!(cells[2], "0x0000000000000001");
        assert_eq!(cells[3], "0x0000000000000002");
    }
}
