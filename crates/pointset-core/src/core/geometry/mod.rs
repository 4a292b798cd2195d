//! Geometric value types consumed by the point-set containers.
//!
//! Points, displacements, matrices and quaternions come straight from
//! `nalgebra`; this module adds the two types the containers need on top of
//! them: the axis-aligned [`BoundingBox`](bbox::BoundingBox) cached for every
//! point set, and the [`AxisSet`](frame::AxisSet) coordinate frame used when
//! re-expressing points in another frame.

pub mod bbox;
pub mod frame;

use nalgebra::{Matrix3, Point3};

/// Rotates `point` by `matrix` about `pivot`.
#[inline]
pub(crate) fn rotate_about(
    point: &Point3<f64>,
    matrix: &Matrix3<f64>,
    pivot: &Point3<f64>,
) -> Point3<f64> {
    pivot + matrix * (point - pivot)
}
