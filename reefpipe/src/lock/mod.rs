//! Per-quad mutual exclusion and terminal-state markers.
//!
//! Many worker processes race over the same catalog; the only shared
//! mutable resource is a lock file per quad, claimed with atomic
//! exclusive-create semantics and released unconditionally by its owner.
//! Losing the race is the expected common case under high concurrency,
//! not an error.
//!
//! Terminal states are recorded as durable marker objects in the store at
//! quad-root granularity:
//!
//! | Marker                 | Meaning                                   |
//! |------------------------|-------------------------------------------|
//! | `application_complete` | all artifacts uploaded                    |
//! | `data_corrupt`         | source raster unreadable; skip until the  |
//! |                        | marker is manually cleared                |
//! | `no_apply`             | processed cleanly, no reef present        |
//!
//! A worker killed mid-quad leaves a stale lock file. Processing never
//! reaps locks it does not own; [`LockManager::sweep_stale`] exists for
//! explicit operator use (`reefpipe sweep-locks`).

mod manager;
mod markers;

pub use manager::{LockError, LockManager, QuadLock};
pub use markers::{
    MarkerClient, QuadState, COMPLETE_MARKER, CORRUPT_MARKER, NO_APPLY_MARKER,
};
