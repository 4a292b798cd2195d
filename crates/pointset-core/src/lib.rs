//! # Pointset Core Library
//!
//! Cache-packed, copy-on-write containers for hierarchical groups of 3D
//! coordinates, built as the positional backbone for molecular modelling
//! code.
//!
//! ## Architectural Philosophy
//!
//! Coordinates are grouped on three levels: a [`PointSetCollection`] holds
//! [`PointSetArray`]s, which hold [`PointSet`]s, which hold points. However
//! the levels nest, the whole payload of a collection lives in one arena
//! block so that distance screening and bounding-volume tests walk memory
//! linearly instead of chasing pointers.
//!
//! - **Sharing.** Handles are reference-counted views into a block. Cloning
//!   one, or taking a child view, never copies points.
//! - **Copy-on-write.** Every write path detaches first: a shared block is
//!   cloned before it is modified, so other handles keep seeing the old data
//!   and can be read from other threads without locks.
//! - **Batched edits.** A [`PointSetEditor`] marks its set dirty instead of
//!   recomputing the bounding box after every edit, and refreshes it once on
//!   commit.
//!
//! ## Features
//!
//! - `parallel` - Recompute bounding boxes of many sets with `rayon`.

pub mod core;

pub use crate::core::error::PointSetError;
pub use crate::core::geometry::bbox::BoundingBox;
pub use crate::core::geometry::frame::AxisSet;
pub use crate::core::io::binary::{FORMAT_MAGIC, FORMAT_VERSION, StreamError};
pub use crate::core::io::traits::BinaryFormat;
pub use crate::core::models::array::PointSetArray;
pub use crate::core::models::collection::PointSetCollection;
pub use crate::core::models::editor::PointSetEditor;
pub use crate::core::models::point_set::PointSet;
