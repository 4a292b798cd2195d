use super::layout::ArenaLayout;
use crate::core::error::PointSetError;
use crate::core::geometry::bbox::BoundingBox;
use nalgebra::Point3;
use std::ops::Range;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Totals for a whole block: `N` arrays, `M` sets and `K` points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CollectionRecord {
    pub array_count: usize,
    pub set_count: usize,
    pub point_count: usize,
}

/// Addressing for one point-set array: a contiguous run of set records and
/// the contiguous run of points those sets cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ArrayRecord {
    pub set_start: usize,
    pub set_count: usize,
    pub point_start: usize,
    pub point_count: usize,
}

impl ArrayRecord {
    #[inline]
    pub fn sets(&self) -> Range<usize> {
        self.set_start..self.set_start + self.set_count
    }

    #[inline]
    pub fn points(&self) -> Range<usize> {
        self.point_start..self.point_start + self.point_count
    }
}

/// Addressing for one point set. Its bounding box lives at the same index
/// in the box table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SetRecord {
    pub array: usize,
    pub point_start: usize,
    pub point_count: usize,
}

impl SetRecord {
    #[inline]
    pub fn points(&self) -> Range<usize> {
        self.point_start..self.point_start + self.point_count
    }
}

/// Points (and optionally an already computed box) used to fill one set.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SetSource<'a> {
    pub points: &'a [Point3<f64>],
    pub bbox: Option<&'a BoundingBox>,
}

impl<'a> SetSource<'a> {
    /// A set whose box must be computed from its points.
    pub fn fresh(points: &'a [Point3<f64>]) -> Self {
        Self { points, bbox: None }
    }

    /// A set whose box is copied as-is.
    pub fn cached(points: &'a [Point3<f64>], bbox: &'a BoundingBox) -> Self {
        Self {
            points,
            bbox: Some(bbox),
        }
    }
}

/// The single backing store of a point-set collection.
///
/// All payload lives in four flat tables: array records, set records, one
/// bounding box per set and one point table. Records refer to each other by
/// index only, so a block can be cloned wholesale and every index stays
/// valid in the clone.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArenaBlock {
    totals: CollectionRecord,
    arrays: Vec<ArrayRecord>,
    sets: Vec<SetRecord>,
    boxes: Vec<BoundingBox>,
    points: Vec<Point3<f64>>,
}

fn reserve_table<T>(len: usize, bytes: usize) -> Result<Vec<T>, PointSetError> {
    let mut table = Vec::new();
    table
        .try_reserve_exact(len)
        .map_err(|_| PointSetError::Allocation { bytes })?;
    Ok(table)
}

impl ArenaBlock {
    /// Allocates and closes a block shaped by `layout`.
    ///
    /// Points start at the origin and every box is null. Either the whole
    /// block is built or an error is returned; nothing partially built
    /// escapes.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::Allocation`] if the byte budget overflows or
    /// any table cannot be reserved.
    pub fn allocate(layout: &ArenaLayout) -> Result<Self, PointSetError> {
        let bytes = layout
            .byte_size()
            .ok_or(PointSetError::Allocation { bytes: usize::MAX })?;

        let totals = CollectionRecord {
            array_count: layout.array_count(),
            set_count: layout.set_count(),
            point_count: layout.point_count(),
        };

        let mut arrays = reserve_table(totals.array_count.max(1), bytes)?;
        arrays.extend(layout.sets_per_array().iter().map(|&set_count| ArrayRecord {
            set_count,
            ..ArrayRecord::default()
        }));
        if arrays.is_empty() {
            arrays.push(ArrayRecord::default());
        }

        let mut sets = reserve_table(totals.set_count.max(1), bytes)?;
        sets.extend(layout.points_per_set().iter().map(|&point_count| SetRecord {
            point_count,
            ..SetRecord::default()
        }));
        if sets.is_empty() {
            sets.push(SetRecord::default());
        }

        let mut boxes = reserve_table(sets.len(), bytes)?;
        boxes.resize(sets.len(), BoundingBox::null());

        let mut points = reserve_table(totals.point_count, bytes)?;
        points.resize(totals.point_count, Point3::origin());

        let mut block = Self {
            totals,
            arrays,
            sets,
            boxes,
            points,
        };
        block.close();

        trace!(
            arrays = totals.array_count,
            sets = totals.set_count,
            points = totals.point_count,
            bytes,
            "Allocated arena block."
        );
        Ok(block)
    }

    /// Allocates a block and fills every set, in order, from `sources`.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::IncompatibleSize`] if a source does not hold
    /// the number of points the layout reserves for it, or if the number of
    /// sources differs from the number of sets.
    pub fn assemble<'a, I>(layout: &ArenaLayout, sources: I) -> Result<Self, PointSetError>
    where
        I: IntoIterator<Item = SetSource<'a>>,
    {
        let mut block = Self::allocate(layout)?;
        let mut filled = 0;

        for source in sources {
            if filled == block.totals.set_count {
                return Err(PointSetError::IncompatibleSize {
                    expected: block.totals.set_count,
                    actual: filled + 1,
                });
            }
            let bbox = source
                .bbox
                .copied()
                .unwrap_or_else(|| BoundingBox::from_points(source.points));
            block.overwrite_set(filled, source.points, bbox)?;
            filled += 1;
        }

        PointSetError::check_size(block.totals.set_count, filled)?;
        Ok(block)
    }

    /// Back-fills the start offsets of every array and set so that their
    /// runs are contiguous and ordered left to right, and totals each
    /// array's points.
    fn close(&mut self) {
        let mut set_cursor = 0;
        let mut point_cursor = 0;

        for (index, array) in self
            .arrays
            .iter_mut()
            .take(self.totals.array_count)
            .enumerate()
        {
            array.set_start = set_cursor;
            array.point_start = point_cursor;
            for set in &mut self.sets[set_cursor..set_cursor + array.set_count] {
                set.array = index;
                set.point_start = point_cursor;
                point_cursor += set.point_count;
            }
            array.point_count = point_cursor - array.point_start;
            set_cursor += array.set_count;
        }

        debug_assert_eq!(set_cursor, self.totals.set_count);
        debug_assert_eq!(point_cursor, self.totals.point_count);
        debug_assert_eq!(self.points.len(), self.totals.point_count);
    }

    pub fn array_count(&self) -> usize {
        self.totals.array_count
    }

    pub fn set_count(&self) -> usize {
        self.totals.set_count
    }

    pub fn point_count(&self) -> usize {
        self.totals.point_count
    }

    pub fn array(&self, index: usize) -> &ArrayRecord {
        &self.arrays[index]
    }

    pub fn set(&self, index: usize) -> &SetRecord {
        &self.sets[index]
    }

    /// Every point in the block, in iteration order.
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// One box per set, in set order.
    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes[..self.totals.set_count]
    }

    pub fn points_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.points
    }

    pub fn boxes_mut(&mut self) -> &mut [BoundingBox] {
        &mut self.boxes[..self.totals.set_count]
    }

    pub fn set_points(&self, index: usize) -> &[Point3<f64>] {
        &self.points[self.sets[index].points()]
    }

    pub fn set_points_mut(&mut self, index: usize) -> &mut [Point3<f64>] {
        let range = self.sets[index].points();
        &mut self.points[range]
    }

    pub fn set_box(&self, index: usize) -> &BoundingBox {
        &self.boxes[index]
    }

    pub fn array_points(&self, index: usize) -> &[Point3<f64>] {
        &self.points[self.arrays[index].points()]
    }

    pub fn array_boxes(&self, index: usize) -> &[BoundingBox] {
        &self.boxes[self.arrays[index].sets()]
    }

    /// Recomputes the boxes of the sets in `sets` from their current points.
    pub fn refresh_boxes(&mut self, sets: Range<usize>) {
        let points = &self.points;
        let records = &self.sets[sets.clone()];
        let boxes = &mut self.boxes[sets];

        #[cfg(not(feature = "parallel"))]
        let iterator = boxes.iter_mut().zip(records.iter());

        #[cfg(feature = "parallel")]
        let iterator = boxes.par_iter_mut().zip(records.par_iter());

        iterator.for_each(|(bbox, record)| {
            *bbox = BoundingBox::from_points(&points[record.points()]);
        });
    }

    /// Applies `f` to every point of the sets in `sets`, then refreshes
    /// their boxes.
    pub fn transform_sets<F>(&mut self, sets: Range<usize>, f: F)
    where
        F: Fn(&Point3<f64>) -> Point3<f64> + Sync,
    {
        let run = self.point_run(sets.clone());
        if run.is_empty() {
            return;
        }
        for point in &mut self.points[run] {
            *point = f(point);
        }
        self.refresh_boxes(sets);
    }

    /// Overwrites the points and box of one set in place.
    ///
    /// # Errors
    ///
    /// Returns [`PointSetError::IncompatibleSize`] if `points` is not exactly
    /// as long as the set. The block is left untouched in that case.
    pub fn overwrite_set(
        &mut self,
        index: usize,
        points: &[Point3<f64>],
        bbox: BoundingBox,
    ) -> Result<(), PointSetError> {
        let record = self.sets[index];
        PointSetError::check_size(record.point_count, points.len())?;
        self.points[record.points()].copy_from_slice(points);
        self.boxes[index] = bbox;
        Ok(())
    }

    /// Checks that array `source_index` of `source` has exactly the shape of
    /// array `index`: the same number of sets, and pairwise the same number
    /// of points per set.
    pub fn check_array_shape(
        &self,
        index: usize,
        source: &ArenaBlock,
        source_index: usize,
    ) -> Result<(), PointSetError> {
        let target = self.arrays[index];
        let replacement = source.arrays[source_index];
        PointSetError::check_size(target.set_count, replacement.set_count)?;

        self.sets[target.sets()]
            .iter()
            .zip(&source.sets[replacement.sets()])
            .try_for_each(|(mine, theirs)| {
                PointSetError::check_size(mine.point_count, theirs.point_count)
            })
    }

    /// Overwrites array `index` in place with array `source_index` of `source`.
    ///
    /// Nothing is written unless [`check_array_shape`](Self::check_array_shape)
    /// passes.
    pub fn overwrite_array(
        &mut self,
        index: usize,
        source: &ArenaBlock,
        source_index: usize,
    ) -> Result<(), PointSetError> {
        self.check_array_shape(index, source, source_index)?;
        let target = self.arrays[index];
        let replacement = source.arrays[source_index];

        self.points[target.points()].copy_from_slice(&source.points[replacement.points()]);
        self.boxes[target.sets()].copy_from_slice(&source.boxes[replacement.sets()]);
        Ok(())
    }

    /// Builds a minimal block holding only set `index`.
    pub fn extract_set(&self, index: usize) -> Result<ArenaBlock, PointSetError> {
        let points = self.set_points(index);
        Self::assemble(
            &ArenaLayout::single_set(points.len()),
            [SetSource::cached(points, &self.boxes[index])],
        )
    }

    /// Builds a minimal block holding only array `index`.
    pub fn extract_array(&self, index: usize) -> Result<ArenaBlock, PointSetError> {
        let record = self.arrays[index];
        let mut layout = ArenaLayout::new();
        layout.push_array(self.sets[record.sets()].iter().map(|s| s.point_count));

        let mut block = Self::allocate(&layout)?;
        block.points.copy_from_slice(&self.points[record.points()]);
        block.boxes[..record.set_count].copy_from_slice(&self.boxes[record.sets()]);
        Ok(block)
    }

    /// Range of the point table covered by the contiguous sets in `sets`.
    fn point_run(&self, sets: Range<usize>) -> Range<usize> {
        if sets.is_empty() {
            return 0..0;
        }
        let first = self.sets[sets.start];
        let last = self.sets[sets.end - 1];
        first.point_start..last.point_start + last.point_count
    }
}
