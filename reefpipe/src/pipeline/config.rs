//! INI configuration for an application run.
//!
//! One config file describes one deployment: where the source mosaic
//! lives, where products are published, which model to run and how much
//! context buffer it needs. Workers on different hosts point at the same
//! file and coordinate purely through the shared store and lock
//! directory.

use crate::store::{LocalStore, StorageContext};
use ini::Ini;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Default context buffer, sized for a model window core of 256 px.
pub const DEFAULT_BUFFER_PIXELS: usize = 128;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// A key the run cannot proceed without
    #[error("missing configuration: {section}.{key}")]
    MissingValue { section: String, key: String },

    /// Invalid configuration value
    #[error("invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings for the `[store]` section.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Root of the shared object store
    pub root: PathBuf,
    /// Key prefix holding source mosaic quads
    pub src_prefix: String,
    /// Key prefix receiving published products and markers
    pub dest_prefix: String,
}

/// Settings for the `[apply]` section.
#[derive(Debug, Clone)]
pub struct ApplySettings {
    /// Scratch space for per-quad working directories
    pub scratch_dir: PathBuf,
    /// Shared directory for exclusive-create lock files
    pub lock_dir: PathBuf,
    /// Context buffer around the focal quad, in pixels
    pub buffer_pixels: usize,
    /// Response mapping name, a path segment of every published product
    pub response_mapping: String,
}

/// Settings for the `[model]` section.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Model name, a path segment of every published product
    pub name: String,
    /// Model version, a path segment of every published product
    pub version: String,
    /// Command line invoked per quad with features and output paths
    pub command: String,
    /// Fine-class probability bands the model emits
    pub num_classes: usize,
}

/// Complete application configuration loaded from an INI file.
#[derive(Debug, Clone)]
pub struct ApplyConfig {
    pub store: StoreSettings,
    pub apply: ApplySettings,
    pub model: ModelSettings,
}

impl ApplyConfig {
    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Storage context over a local filesystem store rooted at
    /// `store.root`.
    pub fn storage_context(&self) -> StorageContext {
        StorageContext::new(
            Arc::new(LocalStore::new(&self.store.root)),
            &self.store.src_prefix,
            &self.store.dest_prefix,
        )
    }
}

/// Parse an `Ini` object into an `ApplyConfig`.
fn parse_ini(ini: &Ini) -> Result<ApplyConfig, ConfigError> {
    let store = StoreSettings {
        root: PathBuf::from(required(ini, "store", "root")?),
        src_prefix: required(ini, "store", "src_prefix")?,
        dest_prefix: required(ini, "store", "dest_prefix")?,
    };

    let apply_section = ini.section(Some("apply"));
    let buffer_pixels = match apply_section.and_then(|s| s.get("buffer_pixels")) {
        Some(v) => v
            .parse::<usize>()
            .ok()
            .filter(|&b| b > 0)
            .ok_or_else(|| ConfigError::InvalidValue {
                section: "apply".to_string(),
                key: "buffer_pixels".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer (pixels)".to_string(),
            })?,
        None => DEFAULT_BUFFER_PIXELS,
    };
    let apply = ApplySettings {
        scratch_dir: PathBuf::from(required(ini, "apply", "scratch_dir")?),
        lock_dir: PathBuf::from(required(ini, "apply", "lock_dir")?),
        buffer_pixels,
        response_mapping: required(ini, "apply", "response_mapping")?,
    };

    let num_classes_raw = required(ini, "model", "num_classes")?;
    let num_classes = num_classes_raw
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            section: "model".to_string(),
            key: "num_classes".to_string(),
            value: num_classes_raw,
            reason: "must be a positive integer".to_string(),
        })?;
    let model = ModelSettings {
        name: required(ini, "model", "name")?,
        version: required(ini, "model", "version")?,
        command: required(ini, "model", "command")?,
        num_classes,
    };

    Ok(ApplyConfig {
        store,
        apply,
        model,
    })
}

/// Fetch a key that has no usable default.
fn required(ini: &Ini, section: &str, key: &str) -> Result<String, ConfigError> {
    ini.section(Some(section))
        .and_then(|s| s.get(key))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingValue {
            section: section.to_string(),
            key: key.to_string(),
        })
}
