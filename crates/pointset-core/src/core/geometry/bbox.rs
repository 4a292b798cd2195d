use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned box summarising the spatial extent of a group of points.
///
/// The box is stored as a center plus half-extents, together with the radius
/// of the sphere that encloses it. A box computed from zero points is *null*:
/// it sits at the origin with zero extents and acts as the identity for
/// [`union`](BoundingBox::union), so empty groups never distort the extent
/// of the groups around them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    center: Point3<f64>,
    half_extents: Vector3<f64>,
    radius: f64,
    null: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::null()
    }
}

impl BoundingBox {
    /// Returns the null box (no points).
    pub fn null() -> Self {
        Self {
            center: Point3::origin(),
            half_extents: Vector3::zeros(),
            radius: 0.0,
            null: true,
        }
    }

    /// Creates a box from its center and (non-negative) half-extents.
    pub fn new(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        let half_extents = half_extents.abs();
        Self {
            center,
            half_extents,
            radius: half_extents.norm(),
            null: false,
        }
    }

    /// Creates the box spanning the two corners `min` and `max`.
    pub fn from_min_max(min: &Point3<f64>, max: &Point3<f64>) -> Self {
        let center = nalgebra::center(min, max);
        Self::new(center, (max - min) * 0.5)
    }

    /// Computes the tightest box around `points`.
    ///
    /// An empty slice yields the null box.
    pub fn from_points(points: &[Point3<f64>]) -> Self {
        let Some(first) = points.first() else {
            return Self::null();
        };

        let (min, max) = points
            .iter()
            .skip(1)
            .fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p)));

        Self::from_min_max(&min, &max)
    }

    /// Reassembles a box from its stored components.
    ///
    /// Used by deserialisation, which already knows whether the owning group
    /// is empty.
    pub(crate) fn from_parts(
        center: Point3<f64>,
        half_extents: Vector3<f64>,
        radius: f64,
        null: bool,
    ) -> Self {
        if null {
            Self::null()
        } else {
            Self {
                center,
                half_extents,
                radius,
                null,
            }
        }
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    pub fn center(&self) -> &Point3<f64> {
        &self.center
    }

    pub fn half_extents(&self) -> &Vector3<f64> {
        &self.half_extents
    }

    /// Radius of the sphere centred on [`center`](Self::center) that encloses the box.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn min_coords(&self) -> Point3<f64> {
        self.center - self.half_extents
    }

    pub fn max_coords(&self) -> Point3<f64> {
        self.center + self.half_extents
    }

    /// Returns the smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        match (self.null, other.null) {
            (true, _) => *other,
            (_, true) => *self,
            _ => Self::from_min_max(
                &self.min_coords().inf(&other.min_coords()),
                &self.max_coords().sup(&other.max_coords()),
            ),
        }
    }

    /// Grows this box in place so that it also encloses `other`.
    pub fn add(&mut self, other: &BoundingBox) {
        *self = self.union(other);
    }

    /// Returns the union of every box yielded by `boxes` (null if there are none).
    pub fn union_all<'a, I>(boxes: I) -> BoundingBox
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(Self::null(), |acc, b| acc.union(b))
    }

    /// Moves the box by `delta`. A null box stays null.
    pub fn translate(&mut self, delta: &Vector3<f64>) {
        if !self.null {
            self.center += delta;
        }
    }

    /// Returns `true` if the two boxes overlap (touching counts as overlapping).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        if self.null || other.null {
            return false;
        }
        let gap = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        gap.iter().zip(reach.iter()).all(|(g, r)| g <= r)
    }

    /// Returns `true` if `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        if self.null || other.null {
            return false;
        }
        let (min, max) = (self.min_coords(), self.max_coords());
        let (other_min, other_max) = (other.min_coords(), other.max_coords());
        (0..3).all(|axis| other_min[axis] >= min[axis] && other_max[axis] <= max[axis])
    }

    pub fn contains_point(&self, point: &Point3<f64>) -> bool {
        if self.null {
            return false;
        }
        let offset = (point - self.center).abs();
        offset
            .iter()
            .zip(self.half_extents.iter())
            .all(|(o, h)| o <= h)
    }

    /// Shortest distance between the surfaces of the two boxes.
    ///
    /// Overlapping boxes are at distance zero; a null box is infinitely far
    /// from everything.
    pub fn min_distance(&self, other: &BoundingBox) -> f64 {
        if self.null || other.null {
            return f64::INFINITY;
        }
        let gap = (self.center - other.center).abs() - (self.half_extents + other.half_extents);
        gap.map(|g| g.max(0.0)).norm()
    }

    /// Returns `true` if some point of `other` may lie within `distance` of this box.
    ///
    /// This is the screening test used before an exact per-point comparison.
    pub fn within_distance(&self, distance: f64, other: &BoundingBox) -> bool {
        self.min_distance(other) <= distance
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.null {
            return write!(f, "BoundingBox(null)");
        }
        let min = self.min_coords();
        let max = self.max_coords();
        write!(
            f,
            "BoundingBox(min=({:.3}, {:.3}, {:.3}), max=({:.3}, {:.3}, {:.3}))",
            min.x, min.y, min.z, max.x, max.y, max.z
        )
    }
}
