//! # Core Module
//!
//! The data structures and algorithms behind the point-set containers.
//!
//! ## Overview
//!
//! All the numeric payload of a collection (every point, every cached
//! bounding box and the bookkeeping that addresses them) lives in a single
//! arena block, so spatial code scans memory linearly. Handles into the
//! block are cheap to clone and share it; writers copy it first when it is
//! shared.
//!
//! ## Architecture
//!
//! - **Errors** ([`error`]) - The error type shared by every container operation
//! - **Geometry** ([`geometry`]) - Bounding boxes and coordinate frames
//! - **Arena** (`arena`) - Layout planning, allocation and copy-on-write sharing
//! - **Handles** ([`models`]) - Point sets, their editor, arrays and collections
//! - **Persistence** ([`io`]) - The binary stream format and `serde` support

pub(crate) mod arena;
pub mod error;
pub mod geometry;
pub mod io;
pub mod models;
