//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading and logging initialization to reduce
//! duplication across command handlers.

use crate::error::CliError;
use reefpipe::logging::{default_log_dir, init_logging, LoggingGuard};
use reefpipe::pipeline::ApplyConfig;
use std::path::Path;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ApplyConfig,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    pub fn new(config_path: &Path) -> Result<Self, CliError> {
        let config =
            ApplyConfig::load_from(config_path).map_err(|e| CliError::Config(e.to_string()))?;

        let logging_guard = init_logging(default_log_dir())
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ApplyConfig {
        &self.config
    }

    /// Mutable access for command-line overrides of config values.
    pub fn config_mut(&mut self) -> &mut ApplyConfig {
        &mut self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("reefpipe v{}", reefpipe::VERSION);
        info!("reefpipe CLI: {} command", command);
    }
}
