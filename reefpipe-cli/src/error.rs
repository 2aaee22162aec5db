//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use reefpipe::pipeline::PipelineError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// The application run failed
    Pipeline(PipelineError),
    /// Lock sweep failure
    Sweep(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("The config file needs [store], [apply], and [model] sections;");
                eprintln!("see config.example.ini in the repository root.");
            }
            CliError::Pipeline(e) if e.is_corrupt_input() => {
                // Corrupt quads are marked and skipped inside the run, so
                // reaching here means a bug; no extra help to give.
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Pipeline(e) => write!(f, "Application run failed: {}", e),
            CliError::Sweep(msg) => write!(f, "Lock sweep failed: {}", msg),
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::Config("missing configuration: model.command".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: missing configuration: model.command"
        );

        let err = CliError::LoggingInit("permission denied".to_string());
        assert!(err.to_string().contains("initialize logging"));
    }
}
