use super::editor::PointSetEditor;
use crate::core::arena::block::{ArenaBlock, SetRecord, SetSource};
use crate::core::arena::layout::ArenaLayout;
use crate::core::arena::shared::Arena;
use crate::core::error::{PointSetError, unwrap_allocation};
use crate::core::geometry::bbox::BoundingBox;
use nalgebra::Point3;
use std::fmt;
use std::ops::Index;

/// An immutable, ordered group of 3D points with a cached bounding box.
///
/// A `PointSet` is a view of one contiguous run of points inside a shared
/// arena block. Cloning it is cheap (a reference-count bump) and never
/// copies points. Points are changed through a [`PointSetEditor`] obtained
/// from [`edit`](PointSet::edit), which copies the block first if anybody
/// else is looking at it.
#[derive(Debug, Clone)]
pub struct PointSet {
    arena: Arena,
    index: usize,
}

impl PointSet {
    /// Creates a standalone set holding a copy of `points`.
    ///
    /// # Panics
    ///
    /// Panics if the backing block cannot be allocated. Use
    /// [`try_new`](Self::try_new) to handle that case.
    pub fn new(points: &[Point3<f64>]) -> Self {
        unwrap_allocation(Self::try_new(points))
    }

    /// Creates a standalone set holding a copy of `points`.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::Allocation`] if the backing block cannot be
    /// allocated.
    pub fn try_new(points: &[Point3<f64>]) -> Result<Self, PointSetError> {
        let block = ArenaBlock::assemble(
            &ArenaLayout::single_set(points.len()),
            [SetSource::fresh(points)],
        )?;
        Ok(Self::from_arena(Arena::new(block), 0))
    }

    pub fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self::new(&points)
    }

    pub(crate) fn from_arena(arena: Arena, index: usize) -> Self {
        Self { arena, index }
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn into_parts(self) -> (Arena, usize) {
        (self.arena, self.index)
    }

    fn record(&self) -> &SetRecord {
        self.arena.block().set(self.index)
    }

    /// Number of points in the set.
    pub fn count(&self) -> usize {
        self.record().point_count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the point at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::Index`] if `index` is not in `0..count()`.
    pub fn at(&self, index: usize) -> Result<&Point3<f64>, PointSetError> {
        PointSetError::check_index(index, self.count())?;
        Ok(&self.as_slice()[index])
    }

    pub fn get(&self, index: usize) -> Option<&Point3<f64>> {
        self.as_slice().get(index)
    }

    /// The points as one contiguous slice, for bulk numeric code.
    pub fn as_slice(&self) -> &[Point3<f64>] {
        self.arena.block().set_points(self.index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point3<f64>> {
        self.as_slice().iter()
    }

    pub fn to_vec(&self) -> Vec<Point3<f64>> {
        self.as_slice().to_vec()
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        self.arena.block().set_box(self.index)
    }

    /// Cheap identity check for hot loops.
    ///
    /// Returns `false` only when both handles view the very same storage, in
    /// which case they are certainly equal. A `true` result means the sets
    /// *may* differ and a full comparison is needed to be sure.
    pub fn maybe_different(&self, other: &PointSet) -> bool {
        !(self.arena.ptr_eq(&other.arena) && self.index == other.index)
    }

    /// Returns a copy of this set that owns a minimal block of its own,
    /// so that it no longer keeps its sibling sets alive.
    ///
    /// A set that is already alone in its block is returned without copying.
    pub fn extract(&self) -> Result<PointSet, PointSetError> {
        Ok(Self::from_arena(self.arena.extract_set(self.index)?, 0))
    }

    /// Starts editing a copy-on-write view of this set.
    pub fn edit(&self) -> PointSetEditor {
        PointSetEditor::from(self.clone())
    }
}

impl Default for PointSet {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl PartialEq for PointSet {
    fn eq(&self, other: &Self) -> bool {
        !self.maybe_different(other) || self.as_slice() == other.as_slice()
    }
}

impl Index<usize> for PointSet {
    type Output = Point3<f64>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point3<f64>;
    type IntoIter = std::slice::Iter<'a, Point3<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Point3<f64>> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self::from_points(iter.into_iter().collect())
    }
}

impl From<&[Point3<f64>]> for PointSet {
    fn from(points: &[Point3<f64>]) -> Self {
        Self::new(points)
    }
}

impl fmt::Display for PointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointSet(count={}, {})", self.count(), self.bounding_box())
    }
}
