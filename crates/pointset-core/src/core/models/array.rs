use super::point_set::PointSet;
use crate::core::arena::block::{ArenaBlock, ArrayRecord, SetSource};
use crate::core::arena::layout::ArenaLayout;
use crate::core::arena::shared::Arena;
use crate::core::error::{PointSetError, unwrap_allocation};
use crate::core::geometry::bbox::BoundingBox;
use crate::core::geometry::frame::AxisSet;
use crate::core::geometry::rotate_about;
use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
use std::fmt;
use std::ops::Range;

/// An ordered sequence of [`PointSet`]s stored back to back in one arena.
///
/// The points of every set in the array form one contiguous run, as do
/// their bounding boxes, so whole-array numeric code can work on
/// [`points`](Self::points) and [`bounding_boxes`](Self::bounding_boxes)
/// directly. Like every handle in this crate, an array is a cheap-to-clone
/// view; writes detach the storage first.
#[derive(Debug, Clone)]
pub struct PointSetArray {
    arena: Arena,
    index: usize,
}

impl PointSetArray {
    /// Builds a standalone array with one set per entry of `sets`.
    ///
    /// # Panics
    ///
    /// Panics if the backing block cannot be allocated.
    pub fn new<S: AsRef<[Point3<f64>]>>(sets: &[S]) -> Self {
        unwrap_allocation(Self::try_new(sets))
    }

    pub fn try_new<S: AsRef<[Point3<f64>]>>(sets: &[S]) -> Result<Self, PointSetError> {
        Self::assemble(sets.iter().map(|s| SetSource::fresh(s.as_ref())).collect())
    }

    /// Builds a standalone array holding copies of `sets`. Their cached
    /// boxes are copied rather than recomputed.
    pub fn from_sets(sets: &[PointSet]) -> Self {
        unwrap_allocation(Self::try_from_sets(sets))
    }

    pub fn try_from_sets(sets: &[PointSet]) -> Result<Self, PointSetError> {
        Self::assemble(
            sets.iter()
                .map(|s| SetSource::cached(s.as_slice(), s.bounding_box()))
                .collect(),
        )
    }

    fn assemble(sources: Vec<SetSource<'_>>) -> Result<Self, PointSetError> {
        let mut layout = ArenaLayout::new();
        layout.push_array(sources.iter().map(|s| s.points.len()));
        let block = ArenaBlock::assemble(&layout, sources)?;
        Ok(Self::from_arena(Arena::new(block), 0))
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

    /// Borrowed sources for every set of this array, in order.
    pub(crate) fn set_sources(&self) -> Vec<SetSource<'_>> {
        let block = self.arena.block();
        self.record()
            .sets()
            .map(|s| SetSource::cached(block.set_points(s), block.set_box(s)))
            .collect()
    }

    fn record(&self) -> &ArrayRecord {
        self.arena.block().array(self.index)
    }

    fn global_set(&self, index: usize) -> Result<usize, PointSetError> {
        let record = self.record();
        PointSetError::check_index(index, record.set_count)?;
        Ok(record.set_start + index)
    }

    /// Number of sets in the array.
    pub fn count(&self) -> usize {
        self.record().set_count
    }

    /// Number of points across every set in the array.
    pub fn n_points(&self) -> usize {
        self.record().point_count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns a view of set `index`. No points are copied.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::Index`] if `index` is not in `0..count()`.
    pub fn at(&self, index: usize) -> Result<PointSet, PointSetError> {
        let set = self.global_set(index)?;
        Ok(PointSet::from_arena(self.arena.clone(), set))
    }

    pub fn get(&self, index: usize) -> Option<PointSet> {
        self.at(index).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = PointSet> + '_ {
        self.record()
            .sets()
            .map(move |s| PointSet::from_arena(self.arena.clone(), s))
    }

    /// Every point of every set, in order, as one contiguous slice.
    pub fn points(&self) -> &[Point3<f64>] {
        self.arena.block().array_points(self.index)
    }

    /// The cached box of every set, in set order.
    pub fn bounding_boxes(&self) -> &[BoundingBox] {
        self.arena.block().array_boxes(self.index)
    }

    /// The box enclosing every set; null for an array with no points.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::union_all(self.bounding_boxes())
    }

    pub fn point_counts(&self) -> Vec<usize> {
        let block = self.arena.block();
        self.record()
            .sets()
            .map(|s| block.set(s).point_count)
            .collect()
    }

    /// Overwrites set `index` in place with the points and box of `set`.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::Index`] for a bad index and
    /// [`PointSetError::IncompatibleSize`] if `set` does not hold exactly as
    /// many points as the set it replaces. The array is unchanged on error.
    pub fn update(&mut self, index: usize, set: &PointSet) -> Result<(), PointSetError> {
        let global = self.global_set(index)?;
        PointSetError::check_size(self.arena.block().set(global).point_count, set.count())?;
        self.arena
            .detach()
            .overwrite_set(global, set.as_slice(), *set.bounding_box())
    }

    /// Overwrites the points of set `index` in place and recomputes its box.
    pub fn update_points(
        &mut self,
        index: usize,
        points: &[Point3<f64>],
    ) -> Result<(), PointSetError> {
        let global = self.global_set(index)?;
        PointSetError::check_size(self.arena.block().set(global).point_count, points.len())?;
        self.arena
            .detach()
            .overwrite_set(global, points, BoundingBox::from_points(points))
    }

    /// Appends a copy of `set`. The array moves to a newly built block.
    pub fn append(&mut self, set: &PointSet) -> Result<(), PointSetError> {
        let mut sources = self.set_sources();
        sources.push(SetSource::cached(set.as_slice(), set.bounding_box()));
        *self = Self::assemble(sources)?;
        Ok(())
    }

    /// Appends copies of every set of `other`. The array moves to a newly
    /// built block.
    pub fn append_array(&mut self, other: &PointSetArray) -> Result<(), PointSetError> {
        let mut sources = self.set_sources();
        sources.extend(other.set_sources());
        *self = Self::assemble(sources)?;
        Ok(())
    }

    /// Removes set `index`. The array moves to a newly built block.
    pub fn remove(&mut self, index: usize) -> Result<(), PointSetError> {
        PointSetError::check_index(index, self.count())?;
        let mut sources = self.set_sources();
        sources.remove(index);
        *self = Self::assemble(sources)?;
        Ok(())
    }

    /// Concatenates every set into a single standalone set.
    pub fn merge(&self) -> PointSet {
        PointSet::new(self.points())
    }

    /// Returns a copy of this array that owns a minimal block of its own.
    pub fn extract(&self) -> Result<PointSetArray, PointSetError> {
        Ok(Self::from_arena(self.arena.extract_array(self.index)?, 0))
    }

    /// Returns `false` only when both handles view the same array of the
    /// same block.
    pub fn maybe_different(&self, other: &PointSetArray) -> bool {
        !(self.arena.ptr_eq(&other.arena) && self.index == other.index)
    }

    fn transform_sets<F>(&mut self, sets: Range<usize>, f: F)
    where
        F: Fn(&Point3<f64>) -> Point3<f64> + Sync,
    {
        let block = self.arena.block();
        let touched: usize = sets.clone().map(|s| block.set(s).point_count).sum();
        if touched > 0 {
            self.arena.detach().transform_sets(sets, f);
        }
    }

    fn transform_all<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Point3<f64>) -> Point3<f64> + Sync,
    {
        let sets = self.record().sets();
        self.transform_sets(sets, f);
        self
    }

    fn transform_one<F>(&mut self, index: usize, f: F) -> Result<&mut Self, PointSetError>
    where
        F: Fn(&Point3<f64>) -> Point3<f64> + Sync,
    {
        let global = self.global_set(index)?;
        self.transform_sets(global..global + 1, f);
        Ok(self)
    }

    /// Moves every point of every set by `delta` and refreshes their boxes.
    pub fn translate(&mut self, delta: &Vector3<f64>) -> &mut Self {
        if *delta == Vector3::zeros() {
            return self;
        }
        self.transform_all(|p| p + delta)
    }

    pub fn translate_at(
        &mut self,
        index: usize,
        delta: &Vector3<f64>,
    ) -> Result<&mut Self, PointSetError> {
        if *delta == Vector3::zeros() {
            self.global_set(index)?;
            return Ok(self);
        }
        self.transform_one(index, |p| p + delta)
    }

    pub fn rotate(&mut self, matrix: &Matrix3<f64>, pivot: &Point3<f64>) -> &mut Self {
        self.transform_all(|p| rotate_about(p, matrix, pivot))
    }

    pub fn rotate_at(
        &mut self,
        index: usize,
        matrix: &Matrix3<f64>,
        pivot: &Point3<f64>,
    ) -> Result<&mut Self, PointSetError> {
        self.transform_one(index, |p| rotate_about(p, matrix, pivot))
    }

    pub fn rotate_quaternion(
        &mut self,
        rotation: &UnitQuaternion<f64>,
        pivot: &Point3<f64>,
    ) -> &mut Self {
        let matrix = rotation.to_rotation_matrix().into_inner();
        self.rotate(&matrix, pivot)
    }

    pub fn map_into(&mut self, axes: &AxisSet) -> &mut Self {
        self.transform_all(|p| axes.to_identity(p))
    }

    pub fn map_into_at(
        &mut self,
        index: usize,
        axes: &AxisSet,
    ) -> Result<&mut Self, PointSetError> {
        self.transform_one(index, |p| axes.to_identity(p))
    }

    pub fn change_frame(&mut self, from: &AxisSet, to: &AxisSet) -> &mut Self {
        self.transform_all(|p| from.to_frame(to, p))
    }

    pub fn change_frame_at(
        &mut self,
        index: usize,
        from: &AxisSet,
        to: &AxisSet,
    ) -> Result<&mut Self, PointSetError> {
        self.transform_one(index, |p| from.to_frame(to, p))
    }
}

impl From<PointSet> for PointSetArray {
    /// Wraps a single set, extracting it first if it shares its block with
    /// siblings.
    fn from(set: PointSet) -> Self {
        let arena = unwrap_allocation(set.arena().extract_set(set.index()));
        Self::from_arena(arena, 0)
    }
}

impl Default for PointSetArray {
    fn default() -> Self {
        Self::from_sets(&[])
    }
}

impl PartialEq for PointSetArray {
    fn eq(&self, other: &Self) -> bool {
        if !self.maybe_different(other) {
            return true;
        }
        self.count() == other.count() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for PointSetArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PointSetArray(count={}, points={}, {})",
            self.count(),
            self.n_points(),
            self.bounding_box()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn sample() -> PointSetArray {
        PointSetArray::new(&[
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)],
            vec![],
            vec![p(0.0, 2.0, 0.0), p(0.0, 3.0, 0.0), p(0.0, 4.0, 1.0)],
        ])
    }

    #[test]
    fn counts_and_contiguous_runs() {
        let array = sample();
        assert_eq!(array.count(), 3);
        assert_eq!(array.n_points(), 5);
        assert_eq!(array.point_counts(), vec![2, 0, 3]);
        assert_eq!(array.points().len(), 5);
        assert_eq!(array.points()[2], p(0.0, 2.0, 0.0));
        assert_eq!(array.bounding_boxes().len(), 3);
        assert!(array.bounding_boxes()[1].is_null());
    }

    #[test]
    fn at_views_sets_without_copying() {
        let array = sample();
        let third = array.at(2).unwrap();
        assert_eq!(third.count(), 3);
        assert_eq!(third[2], p(0.0, 4.0, 1.0));
        assert!(third.arena().ptr_eq(array.arena()));
        assert_eq!(array.at(3).err(), Some(PointSetError::Index { index: 3, count: 3 }));
        assert!(array.get(3).is_none());
        assert_eq!(array.iter().count(), 3);
    }

    #[test]
    fn bounding_box_is_the_union_of_set_boxes() {
        let array = sample();
        assert_eq!(array.bounding_box(), BoundingBox::from_points(array.points()));
        assert!(PointSetArray::default().bounding_box().is_null());
    }

    #[test]
    fn update_overwrites_in_place_when_counts_match() {
        let mut array = sample();
        let replacement = PointSet::new(&[p(7.0, 7.0, 7.0), p(8.0, 8.0, 8.0)]);
        array.update(0, &replacement).unwrap();

        assert_eq!(array.at(0).unwrap(), replacement);
        assert_eq!(array.bounding_boxes()[0], *replacement.bounding_box());
        assert_eq!(array.at(2).unwrap(), sample().at(2).unwrap());
    }

    #[test]
    fn update_rejects_mismatched_counts_and_leaves_array_untouched() {
        let mut array = sample();
        let alias = array.clone();
        let result = array.update(2, &PointSet::new(&[p(0.0, 0.0, 0.0)]));

        assert_eq!(
            result,
            Err(PointSetError::IncompatibleSize {
                expected: 3,
                actual: 1
            })
        );
        assert_eq!(array.point_counts(), vec![2, 0, 3]);
        assert!(!array.maybe_different(&alias));
        assert!(array.update(5, &PointSet::default()).is_err());
        assert!(array.update_points(0, &[]).is_err());
    }

    #[test]
    fn update_does_not_leak_into_aliases() {
        let original = sample();
        let mut writer = original.clone();
        writer.update_points(2, &[p(1.0, 1.0, 1.0); 3]).unwrap();

        assert_eq!(original.at(2).unwrap()[0], p(0.0, 2.0, 0.0));
        assert_eq!(writer.at(2).unwrap()[0], p(1.0, 1.0, 1.0));
        assert_eq!(
            writer.bounding_boxes()[2],
            BoundingBox::from_points(&[p(1.0, 1.0, 1.0)])
        );
    }

    #[test]
    fn append_and_remove_rebuild_the_block() {
        let mut array = sample();
        let before = array.clone();
        array.append(&PointSet::new(&[p(9.0, 9.0, 9.0)])).unwrap();

        assert_eq!(array.count(), 4);
        assert_eq!(array.n_points(), 6);
        assert!(array.maybe_different(&before));
        assert_eq!(before.count(), 3);

        array.remove(1).unwrap();
        assert_eq!(array.point_counts(), vec![2, 3, 1]);
        assert_eq!(array.at(2).unwrap()[0], p(9.0, 9.0, 9.0));
        assert!(array.remove(3).is_err());

        array.append_array(&before).unwrap();
        assert_eq!(array.point_counts(), vec![2, 3, 1, 2, 0, 3]);
    }

    #[test]
    fn merge_concatenates_every_point() {
        let array = sample();
        let merged = array.merge();
        assert_eq!(merged.as_slice(), array.points());
        assert_eq!(*merged.bounding_box(), array.bounding_box());
    }

    #[test]
    fn from_set_extracts_a_minimal_block() {
        let array = sample();
        let lone = PointSetArray::from(array.at(2).unwrap());
        assert_eq!(lone.count(), 1);
        assert_eq!(lone.points(), &array.points()[2..5]);
        assert!(!lone.arena().ptr_eq(array.arena()));
    }

    #[test]
    fn bulk_translate_moves_points_and_boxes() {
        let mut array = sample();
        let delta = Vector3::new(0.0, 0.0, 10.0);
        array.translate(&delta);

        assert_eq!(array.points()[0], p(0.0, 0.0, 10.0));
        for (set, bbox) in array.iter().zip(array.bounding_boxes()) {
            assert_eq!(*bbox, BoundingBox::from_points(set.as_slice()));
        }

        array.translate_at(0, &-delta).unwrap();
        assert_eq!(array.points()[0], p(0.0, 0.0, 0.0));
        assert_eq!(array.points()[2], p(0.0, 2.0, 10.0));
        assert!(array.translate_at(3, &delta).is_err());
        assert!(array.translate_at(3, &Vector3::zeros()).is_err());
    }

    #[test]
    fn zero_translate_keeps_sharing() {
        let original = sample();
        let mut alias = original.clone();
        alias.translate(&Vector3::zeros());
        assert!(!alias.maybe_different(&original));
    }

    #[test]
    fn rotations_and_frames_touch_only_the_requested_set() {
        let mut array = sample();
        let half_turn = Matrix3::from_diagonal(&Vector3::new(-1.0, -1.0, 1.0));
        array.rotate_at(0, &half_turn, &Point3::origin()).unwrap();
        assert_eq!(array.points()[1], p(-1.0, 0.0, 0.0));
        assert_eq!(array.points()[2], p(0.0, 2.0, 0.0));

        let frame = AxisSet::new(Matrix3::identity(), p(0.0, 2.0, 0.0)).unwrap();
        array.map_into_at(2, &frame).unwrap();
        assert_eq!(array.points()[2], p(0.0, 0.0, 0.0));

        array.change_frame(&AxisSet::identity(), &frame);
        assert_eq!(array.points()[2], p(0.0, 2.0, 0.0));
        assert_eq!(array.bounding_box(), BoundingBox::from_points(array.points()));
    }

    #[test]
    fn equality_compares_contents() {
        assert_eq!(sample(), sample());
        let mut changed = sample();
        changed.update_points(0, &[p(0.0, 0.0, 0.0); 2]).unwrap();
        assert_ne!(changed, sample());
        assert!(sample().to_string().starts_with("PointSetArray(count=3, points=5"));
    }
}
