//! Catalog progress report from marker state.

use crate::error::CliError;
use crate::runner::CliRunner;
use clap::Args;
use reefpipe::catalog::QuadCatalog;
use reefpipe::lock::{MarkerClient, QuadState};
use reefpipe::pipeline::PipelineError;
use std::path::PathBuf;

/// Arguments for the `status` command.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Path to the deployment config file
    #[arg(long, default_value = "reefpipe.ini")]
    pub config: PathBuf,

    /// List the labels of unprocessed quads
    #[arg(long)]
    pub pending: bool,
}

/// Run the `status` command.
pub fn run(args: StatusArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&args.config)?;
    runner.log_startup("status");

    let storage = runner.config().storage_context();
    let catalog = QuadCatalog::from_store(storage.store(), storage.src_prefix())
        .map_err(PipelineError::from)?;
    let markers = MarkerClient::new(storage.store_arc(), storage.dest_prefix());

    let mut complete = 0usize;
    let mut corrupt = 0usize;
    let mut no_apply = 0usize;
    let mut pending = Vec::new();
    for blob in catalog.quads() {
        let label = blob.label();
        match markers.state(&label).map_err(PipelineError::from)? {
            QuadState::Complete => complete += 1,
            QuadState::Corrupt => corrupt += 1,
            QuadState::NoApply => no_apply += 1,
            QuadState::NotStarted => pending.push(label),
        }
    }

    println!("Catalog: {} quads under '{}'", catalog.len(), storage.src_prefix());
    println!("  Complete: {}", complete);
    println!("  Corrupt:  {}", corrupt);
    println!("  No apply: {}", no_apply);
    println!("  Pending:  {}", pending.len());
    if args.pending {
        for label in pending {
            println!("    {}", label);
        }
    }
    Ok(())
}
