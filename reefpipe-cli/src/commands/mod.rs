//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`apply`] - Run the application pipeline over the quad catalog
//! - [`status`] - Summarize marker state across the catalog
//! - [`sweep_locks`] - Remove stale lock files left by crashed workers

pub mod apply;
pub mod status;
pub mod sweep_locks;
