//! The main command: apply the model across the quad catalog.

use crate::error::CliError;
use crate::runner::CliRunner;
use clap::Args;
use reefpipe::pipeline::ApplyPipeline;
use std::path::PathBuf;

/// Arguments for the `apply` command.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Path to the deployment config file
    #[arg(long, default_value = "reefpipe.ini")]
    pub config: PathBuf,

    /// Override the configured response mapping
    #[arg(long)]
    pub response_mapping: Option<String>,

    /// Override the configured model version
    #[arg(long)]
    pub model_version: Option<String>,

    /// Stop after this many quads of actual work (skips do not count)
    #[arg(long)]
    pub max_quads: Option<usize>,
}

/// Run the `apply` command.
pub fn run(args: ApplyArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(&args.config)?;
    runner.log_startup("apply");

    if let Some(mapping) = args.response_mapping {
        runner.config_mut().apply.response_mapping = mapping;
    }
    if let Some(version) = args.model_version {
        runner.config_mut().model.version = version;
    }

    let pipeline = ApplyPipeline::from_config(runner.config())?;
    let catalog = pipeline.catalog()?;
    println!(
        "Applying {} {} to {} quads under '{}'",
        runner.config().model.name,
        runner.config().model.version,
        catalog.len(),
        runner.config().store.src_prefix
    );

    let summary = pipeline.run(&catalog, args.max_quads)?;

    println!("Run finished:");
    println!("  Completed:      {}", summary.completed);
    println!("  No reef:        {}", summary.no_reef);
    println!("  Corrupt source: {}", summary.corrupt);
    println!(
        "  Skipped:        {} (complete {}, corrupt {}, no_apply {})",
        summary.already_complete + summary.already_corrupt + summary.already_no_apply,
        summary.already_complete,
        summary.already_corrupt,
        summary.already_no_apply
    );
    println!("  Locked:         {}", summary.locked);
    Ok(())
}
