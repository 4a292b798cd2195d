use super::point_set::PointSet;
use crate::core::arena::shared::Arena;
use crate::core::error::PointSetError;
use crate::core::geometry::frame::AxisSet;
use crate::core::geometry::rotate_about;
use nalgebra::{Isometry3, Matrix3, Point3, UnitQuaternion, Vector3};

/// A mutable cursor over the points of a single [`PointSet`].
///
/// Edits are batched: every mutating call marks the editor dirty instead of
/// recomputing the bounding box, and [`commit`](PointSetEditor::commit)
/// recomputes the box once, in a single pass, before handing back an
/// immutable [`PointSet`] that views the same storage.
///
/// The first write after construction (or after a commit) detaches the
/// storage, so handles that aliased the original set keep seeing the
/// original points.
#[derive(Debug, Clone)]
pub struct PointSetEditor {
    arena: Arena,
    index: usize,
    needs_update: bool,
}

impl From<PointSet> for PointSetEditor {
    fn from(set: PointSet) -> Self {
        let (arena, index) = set.into_parts();
        Self {
            arena,
            index,
            needs_update: false,
        }
    }
}

impl PointSetEditor {
    pub fn count(&self) -> usize {
        self.arena.block().set(self.index).point_count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn as_slice(&self) -> &[Point3<f64>] {
        self.arena.block().set_points(self.index)
    }

    pub fn at(&self, index: usize) -> Result<&Point3<f64>, PointSetError> {
        PointSetError::check_index(index, self.count())?;
        Ok(&self.as_slice()[index])
    }

    /// Returns `true` if points changed since the box was last computed.
    pub fn is_dirty(&self) -> bool {
        self.needs_update
    }

    /// Mutable access to every point. Marks the editor dirty.
    pub fn points_mut(&mut self) -> &mut [Point3<f64>] {
        self.needs_update = true;
        let index = self.index;
        self.arena.detach().set_points_mut(index)
    }

    fn point_mut(&mut self, index: usize) -> Result<&mut Point3<f64>, PointSetError> {
        PointSetError::check_index(index, self.count())?;
        Ok(&mut self.points_mut()[index])
    }

    fn apply<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        if !self.is_empty() {
            for point in self.points_mut() {
                *point = f(point);
            }
        }
        self
    }

    fn apply_at<F>(&mut self, index: usize, f: F) -> Result<&mut Self, PointSetError>
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        let point = self.point_mut(index)?;
        *point = f(point);
        Ok(self)
    }

    /// Moves every point by `delta`.
    ///
    /// A zero `delta` is a no-op: points, box and dirty flag are untouched
    /// and the storage is not detached.
    pub fn translate(&mut self, delta: &Vector3<f64>) -> &mut Self {
        if *delta == Vector3::zeros() {
            return self;
        }
        self.apply(|p| p + delta)
    }

    /// Moves the point at `index` by `delta`.
    pub fn translate_at(
        &mut self,
        index: usize,
        delta: &Vector3<f64>,
    ) -> Result<&mut Self, PointSetError> {
        PointSetError::check_index(index, self.count())?;
        if *delta == Vector3::zeros() {
            return Ok(self);
        }
        self.apply_at(index, |p| p + delta)
    }

    /// Rotates every point by `matrix` about `pivot`.
    pub fn rotate(&mut self, matrix: &Matrix3<f64>, pivot: &Point3<f64>) -> &mut Self {
        self.apply(|p| rotate_about(p, matrix, pivot))
    }

    pub fn rotate_at(
        &mut self,
        index: usize,
        matrix: &Matrix3<f64>,
        pivot: &Point3<f64>,
    ) -> Result<&mut Self, PointSetError> {
        self.apply_at(index, |p| rotate_about(p, matrix, pivot))
    }

    /// Rotates every point by `rotation` about `pivot`.
    pub fn rotate_quaternion(
        &mut self,
        rotation: &UnitQuaternion<f64>,
        pivot: &Point3<f64>,
    ) -> &mut Self {
        let matrix = rotation.to_rotation_matrix().into_inner();
        self.rotate(&matrix, pivot)
    }

    pub fn rotate_quaternion_at(
        &mut self,
        index: usize,
        rotation: &UnitQuaternion<f64>,
        pivot: &Point3<f64>,
    ) -> Result<&mut Self, PointSetError> {
        let matrix = rotation.to_rotation_matrix().into_inner();
        self.rotate_at(index, &matrix, pivot)
    }

    /// Applies a rigid-body transform to every point.
    pub fn transform(&mut self, isometry: &Isometry3<f64>) -> &mut Self {
        self.apply(|p| isometry.transform_point(p))
    }

    pub fn transform_at(
        &mut self,
        index: usize,
        isometry: &Isometry3<f64>,
    ) -> Result<&mut Self, PointSetError> {
        self.apply_at(index, |p| isometry.transform_point(p))
    }

    /// Replaces every point at once.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::IncompatibleSize`] if `points` is not exactly
    /// as long as the set; nothing is written in that case.
    pub fn set_coordinates(&mut self, points: &[Point3<f64>]) -> Result<&mut Self, PointSetError> {
        PointSetError::check_size(self.count(), points.len())?;
        if !points.is_empty() {
            self.points_mut().copy_from_slice(points);
        }
        Ok(self)
    }

    pub fn set_coordinates_at(
        &mut self,
        index: usize,
        point: Point3<f64>,
    ) -> Result<&mut Self, PointSetError> {
        *self.point_mut(index)? = point;
        Ok(self)
    }

    /// Re-expresses every point in the frame `axes`.
    pub fn map_into(&mut self, axes: &AxisSet) -> &mut Self {
        self.apply(|p| axes.to_identity(p))
    }

    pub fn map_into_at(
        &mut self,
        index: usize,
        axes: &AxisSet,
    ) -> Result<&mut Self, PointSetError> {
        self.apply_at(index, |p| axes.to_identity(p))
    }

    /// Moves every point from frame `from` into frame `to`.
    pub fn change_frame(&mut self, from: &AxisSet, to: &AxisSet) -> &mut Self {
        self.apply(|p| from.to_frame(to, p))
    }

    pub fn change_frame_at(
        &mut self,
        index: usize,
        from: &AxisSet,
        to: &AxisSet,
    ) -> Result<&mut Self, PointSetError> {
        self.apply_at(index, |p| from.to_frame(to, p))
    }

    /// Finishes a batch of edits.
    ///
    /// Recomputes the bounding box once if anything changed, then returns an
    /// immutable set viewing the same storage; no points are copied.
    pub fn commit(&mut self) -> PointSet {
        if self.needs_update {
            let index = self.index;
            self.arena.detach().refresh_boxes(index..index + 1);
            self.needs_update = false;
        }
        PointSet::from_arena(self.arena.clone(), self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::bbox::BoundingBox;
    use std::f64::consts::FRAC_PI_2;

    fn square() -> PointSet {
        PointSet::new(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
    }

    fn assert_close(a: &[Point3<f64>], b: &[Point3<f64>]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).norm() < 1e-12, "{x} != {y}");
        }
    }

    #[test]
    fn translate_marks_dirty_and_commit_refreshes_box() {
        let mut editor = square().edit();
        editor.translate(&Vector3::new(2.0, 0.0, 0.0));
        assert!(editor.is_dirty());

        let moved = editor.commit();
        assert!(!editor.is_dirty());
        assert_eq!(moved[0], Point3::new(2.0, 0.0, 0.0));
        assert_eq!(*moved.bounding_box(), BoundingBox::from_points(moved.as_slice()));
    }

    #[test]
    fn translate_by_zero_is_a_no_op() {
        let original = square();
        let mut editor = original.edit();
        editor.translate(&Vector3::zeros());
        editor.translate_at(1, &Vector3::zeros()).unwrap();

        assert!(!editor.is_dirty());
        let committed = editor.commit();
        assert!(!committed.maybe_different(&original));
        assert_eq!(committed.bounding_box(), original.bounding_box());
        assert_eq!(committed.as_slice(), original.as_slice());
    }

    #[test]
    fn box_is_not_updated_until_commit() {
        let original = square();
        let mut editor = original.clone().edit();
        editor.set_coordinates_at(0, Point3::new(-5.0, 0.0, 0.0)).unwrap();

        let stale = *editor.arena.block().set_box(editor.index);
        assert_eq!(stale, *original.bounding_box());

        let committed = editor.commit();
        assert_eq!(committed.bounding_box().min_coords().x, -5.0);
    }

    #[test]
    fn commit_after_many_edits_matches_fresh_box() {
        let mut editor = square().edit();
        editor
            .translate(&Vector3::new(1.0, 1.0, 1.0))
            .rotate_quaternion(
                &UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
                &Point3::origin(),
            );
        editor.translate_at(2, &Vector3::new(0.0, 0.0, 7.0)).unwrap();
        let frame = AxisSet::new(Matrix3::identity() * 2.0, Point3::new(1.0, 1.0, 1.0)).unwrap();
        editor.map_into(&frame);

        let committed = editor.commit();
        assert_eq!(
            *committed.bounding_box(),
            BoundingBox::from_points(committed.as_slice())
        );
    }

    #[test]
    fn edits_do_not_leak_into_aliasing_handles() {
        let original = square();
        let alias = original.clone();

        let mut editor = original.edit();
        editor.translate(&Vector3::new(0.0, 0.0, 3.0));
        let edited = editor.commit();

        assert_eq!(alias.as_slice(), square().as_slice());
        assert_eq!(original.as_slice(), square().as_slice());
        assert_eq!(edited[0], Point3::new(0.0, 0.0, 3.0));
        assert!(edited.maybe_different(&alias));
    }

    #[test]
    fn rotate_with_matrix_and_quaternion_agree() {
        let pivot = Point3::new(0.5, 0.5, 0.0);
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);

        let by_quaternion = square().edit().rotate_quaternion(&rotation, &pivot).commit();
        let by_matrix = square()
            .edit()
            .rotate(&rotation.to_rotation_matrix().into_inner(), &pivot)
            .commit();

        assert_close(by_quaternion.as_slice(), by_matrix.as_slice());
        assert_close(
            by_matrix.as_slice(),
            &[
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
        );
    }

    #[test]
    fn transform_applies_rigid_motion() {
        let isometry = Isometry3::translation(0.0, 0.0, -1.0);
        let mut editor = square().edit();
        editor.transform_at(3, &isometry).unwrap();
        let moved = editor.transform(&isometry).commit();
        assert_eq!(moved[3], Point3::new(0.0, 1.0, -2.0));
        assert_eq!(moved[0], Point3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn per_index_edits_are_bounds_checked() {
        let mut editor = square().edit();
        let rotation = Matrix3::identity();
        let origin = Point3::origin();

        assert_eq!(
            editor.translate_at(4, &Vector3::x()).err(),
            Some(PointSetError::Index { index: 4, count: 4 })
        );
        assert!(editor.rotate_at(9, &rotation, &origin).is_err());
        assert!(editor.set_coordinates_at(4, origin).is_err());
        assert!(editor.map_into_at(4, &AxisSet::identity()).is_err());
        assert!(editor
            .change_frame_at(4, &AxisSet::identity(), &AxisSet::identity())
            .is_err());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn set_coordinates_requires_matching_length() {
        let mut editor = square().edit();
        let result = editor.set_coordinates(&[Point3::origin()]);
        assert_eq!(
            result.err(),
            Some(PointSetError::IncompatibleSize {
                expected: 4,
                actual: 1
            })
        );
        assert!(!editor.is_dirty());

        let replacement = vec![Point3::new(9.0, 9.0, 9.0); 4];
        editor.set_coordinates(&replacement).unwrap();
        assert_eq!(editor.commit().as_slice(), replacement.as_slice());
    }

    #[test]
    fn map_into_and_change_frame_use_the_frame_transforms() {
        let frame = AxisSet::from_rotation(
            &UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            Point3::new(1.0, 0.0, 0.0),
        );
        let points = square().to_vec();

        let mapped = square().edit().map_into(&frame).commit();
        let expected: Vec<_> = points.iter().map(|p| frame.to_identity(p)).collect();
        assert_close(mapped.as_slice(), &expected);

        let identity = AxisSet::identity();
        let changed = square().edit().change_frame(&identity, &frame).commit();
        let expected: Vec<_> = points.iter().map(|p| frame.from_identity(p)).collect();
        assert_close(changed.as_slice(), &expected);
    }
}
