use crate::core::error::PointSetError;
use nalgebra::{Matrix3, Point3, UnitQuaternion};

/// An affine coordinate frame: a set of axes plus an origin.
///
/// `from_identity` maps a point expressed in this frame into the global
/// (identity) frame, `to_identity` performs the inverse mapping. The inverse
/// matrix is computed once when the frame is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSet {
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
    origin: Point3<f64>,
}

impl Default for AxisSet {
    fn default() -> Self {
        Self::identity()
    }
}

impl AxisSet {
    /// The global cartesian frame.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
            inverse: Matrix3::identity(),
            origin: Point3::origin(),
        }
    }

    /// Creates a frame from its axes matrix and origin.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::SingularFrame`] if `matrix` has no inverse.
    pub fn new(matrix: Matrix3<f64>, origin: Point3<f64>) -> Result<Self, PointSetError> {
        let inverse = matrix
            .try_inverse()
            .ok_or(PointSetError::SingularFrame)?;
        Ok(Self {
            matrix,
            inverse,
            origin,
        })
    }

    /// Creates an orthonormal frame from a rotation and an origin.
    pub fn from_rotation(rotation: &UnitQuaternion<f64>, origin: Point3<f64>) -> Self {
        let matrix = rotation.to_rotation_matrix().into_inner();
        Self {
            matrix,
            inverse: matrix.transpose(),
            origin,
        }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn inverse_matrix(&self) -> &Matrix3<f64> {
        &self.inverse
    }

    pub fn origin(&self) -> &Point3<f64> {
        &self.origin
    }

    pub fn is_identity(&self) -> bool {
        self.origin == Point3::origin() && self.matrix == Matrix3::identity()
    }

    /// Maps a point expressed in this frame into the identity frame.
    #[inline]
    pub fn from_identity(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.matrix * point.coords) + self.origin.coords
    }

    /// Maps a point expressed in the identity frame into this frame.
    #[inline]
    pub fn to_identity(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.inverse * (point - self.origin))
    }

    /// Maps a point expressed in this frame into the frame `other`.
    #[inline]
    pub fn to_frame(&self, other: &AxisSet, point: &Point3<f64>) -> Point3<f64> {
        other.from_identity(&self.to_identity(point))
    }
}
