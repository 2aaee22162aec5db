//! Stale lock removal for crashed workers.
//!
//! Workers never expire locks on their own; only an operator runs this,
//! after confirming no live worker could still hold them.

use crate::error::CliError;
use crate::runner::CliRunner;
use clap::Args;
use reefpipe::lock::LockManager;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the `sweep-locks` command.
#[derive(Debug, Args)]
pub struct SweepLocksArgs {
    /// Path to the deployment config file
    #[arg(long, default_value = "reefpipe.ini")]
    pub config: PathBuf,

    /// Only remove locks older than this many hours
    #[arg(long, default_value = "12")]
    pub max_age_hours: u64,
}

/// Run the `sweep-locks` command.
pub fn run(args: SweepLocksArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&args.config)?;
    runner.log_startup("sweep-locks");

    let manager = LockManager::new(&runner.config().apply.lock_dir)
        .map_err(|e| CliError::Sweep(e.to_string()))?;
    let max_age = Duration::from_secs(args.max_age_hours * 3600);
    let removed = manager
        .sweep_stale(max_age)
        .map_err(|e| CliError::Sweep(e.to_string()))?;

    if removed.is_empty() {
        println!(
            "No locks older than {}h under {}",
            args.max_age_hours,
            runner.config().apply.lock_dir.display()
        );
    } else {
        println!("Removed {} stale lock(s):", removed.len());
        for label in removed {
            println!("  {}", label);
        }
    }
    Ok(())
}
