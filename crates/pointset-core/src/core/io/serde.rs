//! Text-friendly `serde` support for the handle types.
//!
//! Handles serialize as nested sequences of `[x, y, z]` triples: a set is a
//! sequence of points, an array a sequence of sets, a collection a sequence
//! of arrays. Bounding boxes are not serialized; they are recomputed when a
//! handle is deserialized.

use crate::core::models::array::PointSetArray;
use crate::core::models::collection::PointSetCollection;
use crate::core::models::point_set::PointSet;
use nalgebra::Point3;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

type RawSet = Vec<[f64; 3]>;

fn to_points(raw: &[[f64; 3]]) -> Vec<Point3<f64>> {
    raw.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect()
}

impl Serialize for PointSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|p| [p.x, p.y, p.z]))
    }
}

impl<'de> Deserialize<'de> for PointSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSet::deserialize(deserializer)?;
        PointSet::try_new(&to_points(&raw)).map_err(D::Error::custom)
    }
}

impl Serialize for PointSetArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for PointSetArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<RawSet>::deserialize(deserializer)?;
        let sets: Vec<_> = raw.iter().map(|set| to_points(set)).collect();
        PointSetArray::try_new(&sets).map_err(D::Error::custom)
    }
}

impl Serialize for PointSetCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for PointSetCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<Vec<RawSet>>::deserialize(deserializer)?;
        let arrays: Vec<Vec<_>> = raw
            .iter()
            .map(|array| array.iter().map(|set| to_points(set)).collect())
            .collect();
        PointSetCollection::try_new(&arrays).map_err(D::Error::custom)
    }
}
