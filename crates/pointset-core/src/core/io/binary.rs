use super::traits::BinaryFormat;
use crate::core::arena::block::ArenaBlock;
use crate::core::arena::layout::ArenaLayout;
use crate::core::arena::shared::Arena;
use crate::core::error::PointSetError;
use crate::core::geometry::bbox::BoundingBox;
use crate::core::models::array::PointSetArray;
use crate::core::models::collection::PointSetCollection;
use crate::core::models::point_set::PointSet;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nalgebra::Point3;
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Magic number opening every point-set stream ("PSCC").
pub const FORMAT_MAGIC: u32 = 0x5053_4343;

/// Current stream format version.
pub const FORMAT_VERSION: u32 = 1;

/// Upper bound on how many elements are reserved ahead of reading them, so
/// that a hostile count cannot force a huge allocation.
const MAX_PREALLOCATED: usize = 4096;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a point-set stream (magic number {found:#010x})")]
    BadMagic { found: u32 },
    #[error("Unsupported stream version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("Corrupt stream: {0}")]
    Corrupt(String),
    #[error("Stream holds {arrays} array(s) and {sets} set(s), which does not match the requested type")]
    UnexpectedShape { arrays: usize, sets: usize },
    #[error("Invalid layout: {0}")]
    Layout(#[from] PointSetError),
}

fn write_count(writer: &mut impl Write, count: usize) -> io::Result<()> {
    writer.write_u64::<LittleEndian>(count as u64)
}

fn write_point(writer: &mut impl Write, point: &Point3<f64>) -> io::Result<()> {
    writer.write_f64::<LittleEndian>(point.x)?;
    writer.write_f64::<LittleEndian>(point.y)?;
    writer.write_f64::<LittleEndian>(point.z)
}

fn write_box(writer: &mut impl Write, bbox: &BoundingBox) -> io::Result<()> {
    write_point(writer, bbox.center())?;
    let half = bbox.half_extents();
    writer.write_f64::<LittleEndian>(half.x)?;
    writer.write_f64::<LittleEndian>(half.y)?;
    writer.write_f64::<LittleEndian>(half.z)?;
    writer.write_f64::<LittleEndian>(bbox.radius())
}

/// Writes the whole block: header, counts, boxes, then points.
#[instrument(skip_all)]
pub(crate) fn write_block(block: &ArenaBlock, writer: &mut impl Write) -> Result<(), StreamError> {
    writer.write_u32::<LittleEndian>(FORMAT_MAGIC)?;
    writer.write_u32::<LittleEndian>(FORMAT_VERSION)?;
    write_count(writer, block.array_count())?;
    write_count(writer, block.set_count())?;
    write_count(writer, block.point_count())?;

    for array in 0..block.array_count() {
        write_count(writer, block.array(array).set_count)?;
    }
    for set in 0..block.set_count() {
        write_count(writer, block.set(set).point_count)?;
    }
    for bbox in block.boxes() {
        write_box(writer, bbox)?;
    }
    for point in block.points() {
        write_point(writer, point)?;
    }

    debug!(
        arrays = block.array_count(),
        sets = block.set_count(),
        points = block.point_count(),
        "Wrote point-set collection."
    );
    Ok(())
}

fn read_count(reader: &mut impl Read, what: &str) -> Result<usize, StreamError> {
    let raw = reader.read_u64::<LittleEndian>()?;
    usize::try_from(raw)
        .map_err(|_| StreamError::Corrupt(format!("{what} {raw} does not fit in memory")))
}

fn read_counts(
    reader: &mut impl Read,
    len: usize,
    what: &str,
) -> Result<Vec<usize>, StreamError> {
    let mut counts = Vec::with_capacity(len.min(MAX_PREALLOCATED));
    for _ in 0..len {
        counts.push(read_count(reader, what)?);
    }
    Ok(counts)
}

fn check_total(counts: &[usize], declared: usize, what: &str) -> Result<(), StreamError> {
    let total = counts
        .iter()
        .try_fold(0usize, |acc, &n| acc.checked_add(n))
        .ok_or_else(|| StreamError::Corrupt(format!("{what} overflow")))?;
    if total != declared {
        return Err(StreamError::Corrupt(format!(
            "{what} add up to {total} but the header declares {declared}"
        )));
    }
    Ok(())
}

fn read_point(reader: &mut impl Read) -> io::Result<Point3<f64>> {
    let x = reader.read_f64::<LittleEndian>()?;
    let y = reader.read_f64::<LittleEndian>()?;
    let z = reader.read_f64::<LittleEndian>()?;
    Ok(Point3::new(x, y, z))
}

fn read_box(reader: &mut impl Read, empty: bool) -> io::Result<BoundingBox> {
    let center = read_point(reader)?;
    let half = read_point(reader)?.coords;
    let radius = reader.read_f64::<LittleEndian>()?;
    Ok(BoundingBox::from_parts(center, half, radius, empty))
}

/// Reads a whole block.
///
/// Counts are cross-checked before anything is sized from them, and the
/// payload is read into bounded temporaries before the block is allocated,
/// so a short or lying stream fails without building a block.
#[instrument(skip_all)]
pub(crate) fn read_block(reader: &mut impl Read) -> Result<ArenaBlock, StreamError> {
    let magic = reader.read_u32::<LittleEndian>()?;
    if magic != FORMAT_MAGIC {
        return Err(StreamError::BadMagic { found: magic });
    }
    let version = reader.read_u32::<LittleEndian>()?;
    if version != FORMAT_VERSION {
        return Err(StreamError::UnsupportedVersion {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    let array_count = read_count(reader, "array count")?;
    let set_count = read_count(reader, "set count")?;
    let point_count = read_count(reader, "point count")?;
    trace!(array_count, set_count, point_count, "Read stream header.");

    let sets_per_array = read_counts(reader, array_count, "array set count")?;
    let points_per_set = read_counts(reader, set_count, "set point count")?;
    check_total(&sets_per_array, set_count, "per-array set counts")?;
    check_total(&points_per_set, point_count, "per-set point counts")?;
    let layout = ArenaLayout::from_counts(sets_per_array, points_per_set)?;

    let mut boxes = Vec::with_capacity(set_count.min(MAX_PREALLOCATED));
    for &count in layout.points_per_set() {
        boxes.push(read_box(reader, count == 0)?);
    }
    let mut points = Vec::with_capacity(point_count.min(MAX_PREALLOCATED));
    for _ in 0..point_count {
        points.push(read_point(reader)?);
    }

    let mut block = ArenaBlock::allocate(&layout)?;
    block.boxes_mut().copy_from_slice(&boxes);
    block.points_mut().copy_from_slice(&points);

    debug!(
        arrays = array_count,
        sets = set_count,
        points = point_count,
        "Read point-set collection."
    );
    Ok(block)
}

impl BinaryFormat for PointSetCollection {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), StreamError> {
        write_block(self.arena().block(), writer)
    }

    fn read_from(reader: &mut impl Read) -> Result<Self, StreamError> {
        Ok(Self::from_arena(Arena::new(read_block(reader)?)))
    }
}

/// Written as a one-array collection.
impl BinaryFormat for PointSetArray {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), StreamError> {
        write_block(self.extract()?.arena().block(), writer)
    }

    fn read_from(reader: &mut impl Read) -> Result<Self, StreamError> {
        let block = read_block(reader)?;
        if block.array_count() != 1 {
            return Err(StreamError::UnexpectedShape {
                arrays: block.array_count(),
                sets: block.set_count(),
            });
        }
        Ok(Self::from_arena(Arena::new(block), 0))
    }
}

/// Written as a collection of one array holding one set.
impl BinaryFormat for PointSet {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), StreamError> {
        write_block(self.extract()?.arena().block(), writer)
    }

    fn read_from(reader: &mut impl Read) -> Result<Self, StreamError> {
        let block = read_block(reader)?;
        if block.array_count() != 1 || block.set_count() != 1 {
            return Err(StreamError::UnexpectedShape {
                arrays: block.array_count(),
                sets: block.set_count(),
            });
        }
        Ok(Self::from_arena(Arena::new(block), 0))
    }
}
