//! Quad identity and the immutable tile-graph node.
//!
//! A quad is one rectangular tile of the global imagery grid, identified by
//! a discrete coordinate label such as `L15-0331E-1257N` (zoom level 15,
//! easting index 331, northing index 1257). Tiles are contiguous on a
//! regular grid, so 8-neighbor adjacency is computable from index
//! arithmetic alone.
//!
//! [`QuadBlob`] binds a [`QuadKey`] to its object-store location plus the
//! up-to-8 contextual neighbor blobs used for edge-effect-free inference.
//! Blobs are immutable once built; neighbor lists are assembled through
//! [`QuadBlobBuilder`] before the value exists.

mod blob;
mod key;

pub use blob::{BlobRef, QuadBlob, QuadBlobBuilder, QuadBlobError};
pub use key::{QuadKey, QuadKeyError};
