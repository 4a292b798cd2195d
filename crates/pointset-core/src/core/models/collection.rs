use super::array::PointSetArray;
use super::point_set::PointSet;
use crate::core::arena::block::{ArenaBlock, SetSource};
use crate::core::arena::layout::ArenaLayout;
use crate::core::arena::shared::Arena;
use crate::core::error::{PointSetError, unwrap_allocation};
use crate::core::geometry::bbox::BoundingBox;
use crate::core::geometry::frame::AxisSet;
use crate::core::geometry::rotate_about;
use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
use std::fmt;
use std::ops::Range;

/// The top-level container: an ordered sequence of [`PointSetArray`]s whose
/// points, boxes and bookkeeping all live in one arena block.
///
/// This is the unit that is normally built, passed around and persisted.
/// Arrays and sets obtained from it are views into the same block.
#[derive(Debug, Clone)]
pub struct PointSetCollection {
    arena: Arena,
}

impl PointSetCollection {
    /// Builds a collection from raw points nested as arrays of sets.
    ///
    /// # Panics
    ///
    /// Panics if the backing block cannot be allocated.
    pub fn new(arrays: &[Vec<Vec<Point3<f64>>>]) -> Self {
        unwrap_allocation(Self::try_new(arrays))
    }

    pub fn try_new(arrays: &[Vec<Vec<Point3<f64>>>]) -> Result<Self, PointSetError> {
        Self::assemble(
            arrays
                .iter()
                .map(|sets| sets.iter().map(|s| SetSource::fresh(s)).collect())
                .collect(),
        )
    }

    /// Builds a collection holding copies of `arrays`, boxes included.
    pub fn from_arrays(arrays: &[PointSetArray]) -> Self {
        unwrap_allocation(Self::try_from_arrays(arrays))
    }

    pub fn try_from_arrays(arrays: &[PointSetArray]) -> Result<Self, PointSetError> {
        Self::assemble(arrays.iter().map(PointSetArray::set_sources).collect())
    }

    fn assemble(arrays: Vec<Vec<SetSource<'_>>>) -> Result<Self, PointSetError> {
        let mut layout = ArenaLayout::new();
        for sets in &arrays {
            layout.push_array(sets.iter().map(|s| s.points.len()));
        }
        let block = ArenaBlock::assemble(&layout, arrays.into_iter().flatten())?;
        Ok(Self::from_arena(Arena::new(block)))
    }

    pub(crate) fn from_arena(arena: Arena) -> Self {
        Self { arena }
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    fn array_sources(&self) -> Vec<Vec<SetSource<'_>>> {
        let block = self.arena.block();
        (0..self.count())
            .map(|a| {
                block
                    .array(a)
                    .sets()
                    .map(|s| SetSource::cached(block.set_points(s), block.set_box(s)))
                    .collect()
            })
            .collect()
    }

    fn global_set(&self, array: usize, set: usize) -> Result<usize, PointSetError> {
        PointSetError::check_index(array, self.count())?;
        let record = self.arena.block().array(array);
        PointSetError::check_index(set, record.set_count)?;
        Ok(record.set_start + set)
    }

    /// Number of arrays.
    pub fn count(&self) -> usize {
        self.arena.block().array_count()
    }

    /// Number of sets across every array.
    pub fn n_sets(&self) -> usize {
        self.arena.block().set_count()
    }

    /// Number of points across every set.
    pub fn n_points(&self) -> usize {
        self.arena.block().point_count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns a view of array `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::Index`] if `index` is not in `0..count()`.
    pub fn at(&self, index: usize) -> Result<PointSetArray, PointSetError> {
        PointSetError::check_index(index, self.count())?;
        Ok(PointSetArray::from_arena(self.arena.clone(), index))
    }

    /// Returns a view of set `set` of array `array`.
    pub fn at_set(&self, array: usize, set: usize) -> Result<PointSet, PointSetError> {
        self.at(array)?.at(set)
    }

    pub fn get(&self, index: usize) -> Option<PointSetArray> {
        self.at(index).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = PointSetArray> + '_ {
        (0..self.count()).map(move |a| PointSetArray::from_arena(self.arena.clone(), a))
    }

    /// Every point in the collection, in iteration order.
    pub fn points(&self) -> &[Point3<f64>] {
        self.arena.block().points()
    }

    /// The cached box of every set, in iteration order.
    pub fn bounding_boxes(&self) -> &[BoundingBox] {
        self.arena.block().boxes()
    }

    /// The box enclosing every point. An empty collection yields the null
    /// box rather than failing.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::union_all(self.bounding_boxes())
    }

    /// Number of sets in each array.
    pub fn set_counts(&self) -> Vec<usize> {
        (0..self.count())
            .map(|a| self.arena.block().array(a).set_count)
            .collect()
    }

    /// Number of points in each set, in iteration order.
    pub fn point_counts(&self) -> Vec<usize> {
        let block = self.arena.block();
        (0..block.set_count()).map(|s| block.set(s).point_count).collect()
    }

    /// Overwrites array `index` in place with the contents of `array`.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::IncompatibleSize`] unless `array` has the same
    /// number of sets as the array it replaces and every set holds the same
    /// number of points. The collection is unchanged on error.
    pub fn update(&mut self, index: usize, array: &PointSetArray) -> Result<(), PointSetError> {
        PointSetError::check_index(index, self.count())?;
        let source = array.arena().block();
        self.arena.block().check_array_shape(index, source, array.index())?;
        self.arena
            .detach()
            .overwrite_array(index, source, array.index())
    }

    /// Overwrites set `set` of array `array` in place.
    pub fn update_set(
        &mut self,
        array: usize,
        set: usize,
        replacement: &PointSet,
    ) -> Result<(), PointSetError> {
        let global = self.global_set(array, set)?;
        let expected = self.arena.block().set(global).point_count;
        PointSetError::check_size(expected, replacement.count())?;
        self.arena.detach().overwrite_set(
            global,
            replacement.as_slice(),
            *replacement.bounding_box(),
        )
    }

    /// Overwrites the points of set `set` of array `array` in place and
    /// recomputes its box.
    pub fn update_points(
        &mut self,
        array: usize,
        set: usize,
        points: &[Point3<f64>],
    ) -> Result<(), PointSetError> {
        let global = self.global_set(array, set)?;
        PointSetError::check_size(self.arena.block().set(global).point_count, points.len())?;
        self.arena
            .detach()
            .overwrite_set(global, points, BoundingBox::from_points(points))
    }

    /// Appends a copy of `array`. The collection moves to a newly built
    /// block.
    pub fn append(&mut self, array: &PointSetArray) -> Result<(), PointSetError> {
        let mut arrays = self.array_sources();
        arrays.push(array.set_sources());
        *self = Self::assemble(arrays)?;
        Ok(())
    }

    /// Removes array `index`. The collection moves to a newly built block.
    pub fn remove(&mut self, index: usize) -> Result<(), PointSetError> {
        PointSetError::check_index(index, self.count())?;
        let mut arrays = self.array_sources();
        arrays.remove(index);
        *self = Self::assemble(arrays)?;
        Ok(())
    }

    /// Flattens every array into a single standalone array, keeping each
    /// set and its cached box.
    pub fn merge(&self) -> PointSetArray {
        let block = self.arena.block();
        PointSetArray::from_sets(
            &(0..block.set_count())
                .map(|s| PointSet::from_arena(self.arena.clone(), s))
                .collect::<Vec<_>>(),
        )
    }

    /// Returns `false` only when both handles share the same block.
    pub fn maybe_different(&self, other: &PointSetCollection) -> bool {
        !self.arena.ptr_eq(&other.arena)
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
        let sets = 0..self.n_sets();
        self.transform_sets(sets, f);
        self
    }

    fn transform_array<F>(&mut self, index: usize, f: F) -> Result<&mut Self, PointSetError>
    where
        F: Fn(&Point3<f64>) -> Point3<f64> + Sync,
    {
        PointSetError::check_index(index, self.count())?;
        let sets = self.arena.block().array(index).sets();
        self.transform_sets(sets, f);
        Ok(self)
    }

    /// Moves every point by `delta` and refreshes every box.
    pub fn translate(&mut self, delta: &Vector3<f64>) -> &mut Self {
        if *delta == Vector3::zeros() {
            return self;
        }
        self.transform_all(|p| p + delta)
    }

    /// Moves every point of array `index` by `delta`.
    pub fn translate_at(
        &mut self,
        index: usize,
        delta: &Vector3<f64>,
    ) -> Result<&mut Self, PointSetError> {
        if *delta == Vector3::zeros() {
            PointSetError::check_index(index, self.count())?;
            return Ok(self);
        }
        self.transform_array(index, |p| p + delta)
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
        self.transform_array(index, |p| rotate_about(p, matrix, pivot))
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
        self.transform_array(index, |p| axes.to_identity(p))
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
        self.transform_array(index, |p| from.to_frame(to, p))
    }
}

impl From<PointSetArray> for PointSetCollection {
    /// Wraps a single array, extracting it first if it shares its block
    /// with siblings.
    fn from(array: PointSetArray) -> Self {
        Self::from_arena(unwrap_allocation(array.arena().extract_array(array.index())))
    }
}

impl From<PointSet> for PointSetCollection {
    fn from(set: PointSet) -> Self {
        Self::from_arena(unwrap_allocation(set.arena().extract_set(set.index())))
    }
}

impl Default for PointSetCollection {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl PartialEq for PointSetCollection {
    fn eq(&self, other: &Self) -> bool {
        if !self.maybe_different(other) {
            return true;
        }
        self.count() == other.count() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for PointSetCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PointSetCollection(arrays={}, sets={}, points={}, {})",
            self.count(),
            self.n_sets(),
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

    fn line(start: usize, len: usize) -> Vec<Point3<f64>> {
        (start..start + len).map(|i| p(i as f64, 0.0, 0.0)).collect()
    }

    /// Two arrays: one of two single-point sets, one of three.
    fn two_and_three() -> PointSetCollection {
        PointSetCollection::new(&[
            vec![line(0, 1), line(1, 1)],
            vec![line(2, 1), line(3, 1), line(4, 1)],
        ])
    }

    #[test]
    fn counts_at_every_level() {
        let collection = two_and_three();
        assert_eq!(collection.count(), 2);
        assert_eq!(collection.n_sets(), 5);
        assert_eq!(collection.n_points(), 5);
        assert_eq!(collection.set_counts(), vec![2, 3]);
        assert_eq!(collection.point_counts(), vec![1; 5]);
        assert_eq!(collection.at(1).unwrap().count(), 3);
        assert_eq!(collection.at_set(1, 2).unwrap()[0], p(4.0, 0.0, 0.0));
        assert_eq!(
            collection.at(2).err(),
            Some(PointSetError::Index { index: 2, count: 2 })
        );
        assert!(collection.at_set(0, 2).is_err());
    }

    #[test]
    fn extracting_an_array_copies_exactly_its_slice() {
        let collection = two_and_three();
        let second = collection.at(1).unwrap();
        let extracted = PointSetCollection::from(second.extract().unwrap());

        assert_eq!(extracted.count(), 1);
        assert_eq!(extracted.n_sets(), 3);
        assert_eq!(extracted.points(), &collection.points()[2..5]);
        assert_eq!(extracted.bounding_boxes(), &collection.bounding_boxes()[2..5]);
        assert!(extracted.maybe_different(&collection));
    }

    #[test]
    fn empty_collection_has_zero_counts_and_a_null_box() {
        let empty = PointSetCollection::default();
        assert_eq!(empty.count(), 0);
        assert_eq!(empty.n_sets(), 0);
        assert_eq!(empty.n_points(), 0);
        assert!(empty.is_empty());
        assert!(empty.points().is_empty());
        assert!(empty.bounding_boxes().is_empty());
        assert!(empty.bounding_box().is_null());
        assert_eq!(empty.iter().count(), 0);
        assert!(empty.at(0).is_err());
        assert!(empty.to_string().contains("arrays=0"));
    }

    #[test]
    fn update_with_mismatched_shape_fails_and_changes_nothing() {
        let mut collection = two_and_three();
        let snapshot = collection.clone();

        let wrong_sets = PointSetArray::new(&[line(0, 1), line(0, 1)]);
        assert_eq!(
            collection.update(1, &wrong_sets),
            Err(PointSetError::IncompatibleSize {
                expected: 3,
                actual: 2
            })
        );

        let wrong_points = PointSetArray::new(&[line(0, 1), line(0, 2), line(0, 1)]);
        assert_eq!(
            collection.update(1, &wrong_points),
            Err(PointSetError::IncompatibleSize {
                expected: 1,
                actual: 2
            })
        );

        assert!(!collection.maybe_different(&snapshot));
        assert_eq!(collection.set_counts(), vec![2, 3]);
        assert_eq!(collection.points(), snapshot.points());
    }

    #[test]
    fn update_overwrites_and_isolates_aliases() {
        let mut collection = two_and_three();
        let alias = collection.clone();
        let replacement = PointSetArray::new(&[line(10, 1), line(20, 1), line(30, 1)]);

        collection.update(1, &replacement).unwrap();
        assert_eq!(collection.at(1).unwrap(), replacement);
        assert_eq!(collection.at(0).unwrap(), alias.at(0).unwrap());
        assert_eq!(alias.points()[2], p(2.0, 0.0, 0.0));
        assert!(collection.maybe_different(&alias));
    }

    #[test]
    fn update_set_and_points_write_through_the_collection() {
        let mut collection = two_and_three();
        let alias = collection.clone();

        collection
            .update_set(0, 1, &PointSet::new(&[p(5.0, 5.0, 5.0)]))
            .unwrap();
        collection.update_points(1, 0, &[p(6.0, 6.0, 6.0)]).unwrap();

        assert_eq!(collection.points()[1], p(5.0, 5.0, 5.0));
        assert_eq!(collection.points()[2], p(6.0, 6.0, 6.0));
        assert_eq!(collection.bounding_box().max_coords(), p(6.0, 6.0, 6.0));
        assert_eq!(alias.points()[1], p(1.0, 0.0, 0.0));
        assert!(collection.update_set(0, 1, &PointSet::default()).is_err());
    }

    #[test]
    fn append_remove_and_merge() {
        let mut collection = two_and_three();
        collection.append(&PointSetArray::new(&[line(7, 2)])).unwrap();
        assert_eq!(collection.set_counts(), vec![2, 3, 1]);
        assert_eq!(collection.n_points(), 7);

        collection.remove(0).unwrap();
        assert_eq!(collection.set_counts(), vec![3, 1]);
        assert_eq!(collection.points()[0], p(2.0, 0.0, 0.0));
        assert!(collection.remove(2).is_err());

        let merged = collection.merge();
        assert_eq!(merged.count(), 4);
        assert_eq!(merged.points(), collection.points());
        assert_eq!(merged.bounding_boxes(), collection.bounding_boxes());
    }

    #[test]
    fn wrapping_a_single_child_extracts_it() {
        let collection = two_and_three();
        let from_set = PointSetCollection::from(collection.at_set(1, 0).unwrap());
        assert_eq!(from_set.count(), 1);
        assert_eq!(from_set.points(), &[p(2.0, 0.0, 0.0)]);

        let standalone = PointSetArray::new(&[line(0, 3)]);
        let wrapped = PointSetCollection::from(standalone.clone());
        assert!(wrapped.arena().ptr_eq(standalone.arena()));
    }

    #[test]
    fn bulk_transforms_refresh_boxes() {
        let mut collection = two_and_three();
        collection.translate_at(1, &Vector3::new(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(collection.points()[1], p(1.0, 0.0, 0.0));
        assert_eq!(collection.points()[2], p(2.0, 1.0, 0.0));

        collection.rotate_quaternion(&UnitQuaternion::identity(), &Point3::origin());
        collection.translate(&Vector3::new(0.0, 0.0, -1.0));
        for (set, bbox) in collection
            .iter()
            .flat_map(|a| a.iter().collect::<Vec<_>>())
            .zip(collection.bounding_boxes())
        {
            assert_eq!(*bbox, BoundingBox::from_points(set.as_slice()));
        }
        assert!(collection.translate_at(2, &Vector3::x()).is_err());
        assert!(collection.map_into_at(2, &AxisSet::identity()).is_err());
    }

    #[test]
    fn zero_translation_keeps_the_block_shared() {
        let collection = two_and_three();
        let mut alias = collection.clone();
        alias.translate(&Vector3::zeros());
        alias.translate_at(0, &Vector3::zeros()).unwrap();
        assert!(!alias.maybe_different(&collection));
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(two_and_three(), two_and_three());
        assert_ne!(two_and_three(), PointSetCollection::default());
        let rebuilt =
            PointSetCollection::from_arrays(&two_and_three().iter().collect::<Vec<_>>());
        assert_eq!(rebuilt, two_and_three());
    }
}
