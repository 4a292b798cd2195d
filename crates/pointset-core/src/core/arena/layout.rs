use super::block::{ArrayRecord, CollectionRecord, SetRecord};
use crate::core::error::PointSetError;
use crate::core::geometry::bbox::BoundingBox;
use nalgebra::Point3;
use std::mem::size_of;

/// The shape of an arena block before it is allocated.
///
/// A layout records how many point sets each array holds and how many points
/// each set holds, in iteration order. From those counts it derives the three
/// totals `(N, M, K)` and the byte budget of the block. Empty levels still
/// reserve one placeholder record (and one placeholder box), so a block
/// always has something for a handle to point at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ArenaLayout {
    sets_per_array: Vec<usize>,
    points_per_set: Vec<usize>,
}

impl ArenaLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout of a single array holding a single set of `point_count` points.
    pub fn single_set(point_count: usize) -> Self {
        let mut layout = Self::new();
        layout.push_array([point_count]);
        layout
    }

    /// Builds a layout from per-array set counts and per-set point counts.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::IncompatibleSize`] if the per-array set counts
    /// do not add up to the number of per-set point counts supplied.
    pub fn from_counts(
        sets_per_array: Vec<usize>,
        points_per_set: Vec<usize>,
    ) -> Result<Self, PointSetError> {
        let declared = sets_per_array
            .iter()
            .try_fold(0usize, |acc, &n| acc.checked_add(n))
            .ok_or(PointSetError::Allocation { bytes: usize::MAX })?;
        PointSetError::check_size(declared, points_per_set.len())?;
        Ok(Self {
            sets_per_array,
            points_per_set,
        })
    }

    /// Appends an array whose sets hold the given numbers of points.
    pub fn push_array<I>(&mut self, point_counts: I) -> &mut Self
    where
        I: IntoIterator<Item = usize>,
    {
        let before = self.points_per_set.len();
        self.points_per_set.extend(point_counts);
        self.sets_per_array.push(self.points_per_set.len() - before);
        self
    }

    pub fn array_count(&self) -> usize {
        self.sets_per_array.len()
    }

    pub fn set_count(&self) -> usize {
        self.points_per_set.len()
    }

    pub fn point_count(&self) -> usize {
        self.points_per_set
            .iter()
            .fold(0usize, |acc, &n| acc.saturating_add(n))
    }

    pub fn sets_per_array(&self) -> &[usize] {
        &self.sets_per_array
    }

    pub fn points_per_set(&self) -> &[usize] {
        &self.points_per_set
    }

    /// Total size in bytes of a block with this layout, or `None` on overflow.
    ///
    /// Every table is naturally aligned for its element type, so no padding
    /// is added between them.
    pub fn byte_size(&self) -> Option<usize> {
        let arrays = self.array_count().max(1).checked_mul(size_of::<ArrayRecord>())?;
        let sets = self
            .set_count()
            .max(1)
            .checked_mul(size_of::<SetRecord>() + size_of::<BoundingBox>())?;
        let points = self
            .points_per_set
            .iter()
            .try_fold(0usize, |acc, &n| acc.checked_add(n))?
            .checked_mul(size_of::<Point3<f64>>())?;

        size_of::<CollectionRecord>()
            .checked_add(arrays)?
            .checked_add(sets)?
            .checked_add(points)
    }
}
