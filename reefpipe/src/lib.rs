//! Reefpipe - distributed application of benthic habitat models to
//! satellite imagery quads.
//!
//! A trained segmentation model is applied independently to thousands of
//! geospatial tiles ("quads"). Many worker processes run the same loop over
//! the quad catalog with no coordination beyond a shared lock/marker store,
//! so every quad is processed at most once and a crashed worker never
//! produces a half-written result.
//!
//! # Per-quad flow
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ QuadCatalog  │──▶│ LockManager  │──▶│ build_mosaic  │
//! │ (list store) │   │ (gate/skip)  │   │ (focal + 8)   │
//! └──────────────┘   └──────────────┘   └───────┬───────┘
//!                                               ▼
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Publisher   │◀──│ PostProcess  │◀──│ InferenceModel│
//! │ (artifacts + │   │ (aggregate,  │   │ (probability  │
//! │  markers)    │   │  classify)   │   │  bands)       │
//! └──────────────┘   └──────────────┘   └───────────────┘
//! ```
//!
//! The scratch directory and lock are released on every exit path; the only
//! durable side effects are uploaded artifacts and the three terminal
//! markers (`application_complete`, `data_corrupt`, `no_apply`).

pub mod catalog;
pub mod lock;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod quad;
pub mod raster;
pub mod store;

/// Version of the reefpipe library and CLI.
///
/// Synchronized across all workspace members; injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
