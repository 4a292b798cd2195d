//! Persistence for point-set handles.
//!
//! The binary stream format stores a whole collection: a header, the
//! per-array and per-set counts, every bounding box and every point, all
//! little-endian. Reading rebuilds the block through the same layout and
//! allocation path used by in-memory construction. A `serde` rendition of
//! the handles is provided for text formats.

pub mod binary;
pub mod serde;
pub mod traits;
