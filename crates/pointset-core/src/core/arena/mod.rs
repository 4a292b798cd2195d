//! The single backing allocation behind every point-set handle.
//!
//! A collection's payload is laid out in one block: array records, set
//! records, one bounding box per set and one flat point table, all in
//! iteration order. Building a block is a two-step affair:
//!
//! 1. An [`ArenaLayout`](layout::ArenaLayout) accumulates per-array set
//!    counts and per-set point counts.
//! 2. [`ArenaBlock::allocate`](block::ArenaBlock::allocate) reserves every
//!    table in one go and *closes* the block, back-filling the start of each
//!    contiguous run.
//!
//! Blocks are shared through [`Arena`](shared::Arena), an atomically
//! reference-counted handle with copy-on-write [`detach`](shared::Arena::detach)
//! and [`extract_array`](shared::Arena::extract_array) for carving out a minimal
//! standalone block.

pub(crate) mod block;
pub(crate) mod layout;
pub(crate) mod shared;
