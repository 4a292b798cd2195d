//! # Point-Set Handles
//!
//! The public handle types through which callers read and write point data.
//!
//! ## Overview
//!
//! Every handle is a view into a shared arena block: a reference-counted
//! pointer plus an index. Handles are cheap to clone, safe to send across
//! threads for reading, and behave like values: a write through one handle
//! never shows up through another, because writes copy a shared block first.
//!
//! ## Key Components
//!
//! - [`point_set`] - An immutable run of points with its cached bounding box
//! - [`editor`] - A mutable cursor that batches edits to one set and refreshes
//!   the box once on commit
//! - [`array`] - An ordered sequence of sets stored back to back
//! - [`collection`] - The top-level sequence of arrays, the unit that is built,
//!   passed around and persisted

pub mod array;
pub mod collection;
pub mod editor;
pub mod point_set;
