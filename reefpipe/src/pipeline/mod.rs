//! The application pipeline: catalog to published products.
//!
//! ```text
//!   catalog ──► gates ──► lock ──► fetch ──► mosaic ──► model
//!                 │                                       │
//!                 ▼                                       ▼
//!               skip                        aggregate / crop / mask
//!                                                         │
//!                                           no reef? ◄────┤
//!                                              │          ▼
//!                                          no_apply    publish
//!                                                         │
//!                                                         ▼
//!                                              application_complete
//! ```
//!
//! Submodules: [`config`] loads the INI deployment description,
//! [`paths`] computes destination keys, [`publisher`] uploads artifact
//! sets, and [`apply`] orchestrates the per-quad sequence.

mod apply;
mod config;
mod error;
mod paths;
mod publisher;

pub use apply::{ApplyPipeline, QuadOutcome, RunSummary};
pub use config::{ApplyConfig, ApplySettings, ConfigError, ModelSettings, StoreSettings,
    DEFAULT_BUFFER_PIXELS};
pub use error::PipelineError;
pub use paths::{
    DestLayout, ARTIFACTS, CLASSIFICATION_TIF, PROBABILITIES_TIF, REEF_HEATMAP_TIF,
    REEF_OUTLINE_TIF,
};
pub use publisher::Publisher;
