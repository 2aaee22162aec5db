//! reefpipe CLI - Command-line interface
//!
//! This binary provides a command-line interface to the reefpipe library.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use commands::{apply, status, sweep_locks};

#[derive(Parser)]
#[command(name = "reefpipe")]
#[command(version = reefpipe::VERSION)]
#[command(about = "Apply benthic habitat models to satellite imagery quads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process the quad catalog: mosaic, infer, post-process, publish
    Apply(apply::ApplyArgs),
    /// Report marker state across the catalog
    Status(status::StatusArgs),
    /// Remove stale lock files left by crashed workers
    SweepLocks(sweep_locks::SweepLocksArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Apply(args) => apply::run(args),
        Command::Status(args) => status::run(args),
        Command::SweepLocks(args) => sweep_locks::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
