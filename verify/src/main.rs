// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "replay-verify")]
#[command(about = "Offline inspection and comparison of replay event logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every entry of an event log as one JSON object per line
    Dump {
        log: PathBuf,
    },
    /// Print entry counts and the BLAKE3 hash of an event log
    Digest {
        log: PathBuf,
    },
    /// Compare the checksums recorded by two runs. Exits 1 when they diverge.
    Diff {
        left: PathBuf,
        right: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dump { log } => commands::dump::run(&log)?,
        Commands::Digest { log } => commands::digest::run(&log)?,
        Commands::Diff { left, right } => {
            let divergences = commands::diff::run(&left, &right)?;
            if divergences > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
