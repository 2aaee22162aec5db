//! Model invocation via an external command.

use super::{InferenceError, InferenceModel};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Exit code by which the model signals unreadable input (sysexits
/// `EX_DATAERR`).
const EXIT_DATA_ERROR: i32 = 65;

/// Runs a model as a subprocess.
///
/// The configured command is invoked with two positional arguments, the
/// features raster path and the probabilities output path. A zero exit
/// writes `num_classes` float bands to the output; exit code 65 marks
/// the input corrupt; anything else is a model failure.
pub struct ExternalCommandModel {
    program: String,
    args: Vec<String>,
    num_classes: usize,
}

impl ExternalCommandModel {
    /// Build from a whitespace-split command line, e.g.
    /// `"python3 apply_model.py --weights v3.pt"`.
    pub fn new(command_line: &str, num_classes: usize) -> Result<Self, InferenceError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| InferenceError::Failed("empty model command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            num_classes,
        })
    }
}

impl InferenceModel for ExternalCommandModel {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn apply(&self, features: &Path, probabilities: &Path) -> Result<(), InferenceError> {
        info!(
            program = %self.program,
            features = %features.display(),
            "invoking model"
        );
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(features)
            .arg(probabilities)
            .output()
            .map_err(|e| InferenceError::Failed(format!("spawn '{}': {}", self.program, e)))?;

        match output.status.code() {
            Some(0) => {
                debug!(probabilities = %probabilities.display(), "model run complete");
                Ok(())
            }
            Some(EXIT_DATA_ERROR) => Err(InferenceError::CorruptInput(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )),
            Some(code) => Err(InferenceError::Failed(format!(
                "'{}' exited with code {}: {}",
                self.program,
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            None => Err(InferenceError::Failed(format!(
                "'{}' terminated by signal",
                self.program
            ))),
        }
    }
}
