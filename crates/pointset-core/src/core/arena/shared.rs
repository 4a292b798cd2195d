use super::block::ArenaBlock;
use crate::core::error::PointSetError;
use std::sync::Arc;
use tracing::debug;

/// A reference-counted handle to an [`ArenaBlock`].
///
/// Cloning an `Arena` bumps an atomic reference count; the block is freed
/// when the last handle drops. Reads go through [`block`](Arena::block);
/// the only way to write is [`detach`](Arena::detach), which first makes
/// the block exclusive to this handle.
#[derive(Debug, Clone)]
pub(crate) struct Arena {
    block: Arc<ArenaBlock>,
}

impl Arena {
    pub fn new(block: ArenaBlock) -> Self {
        Self {
            block: Arc::new(block),
        }
    }

    #[inline]
    pub fn block(&self) -> &ArenaBlock {
        &self.block
    }

    /// Number of handles currently sharing the block.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.block)
    }

    pub fn is_shared(&self) -> bool {
        self.ref_count() > 1
    }

    /// Returns `true` if both handles refer to the very same block.
    pub fn ptr_eq(&self, other: &Arena) -> bool {
        Arc::ptr_eq(&self.block, &other.block)
    }

    /// Guarantees exclusive ownership of the block and returns it mutably.
    ///
    /// An exclusive block is returned as-is. A shared block is cloned into a
    /// new allocation owned by this handle alone, and one reference to the
    /// original is released; every other handle keeps seeing the original,
    /// unmodified data. Records address each other by index, so the clone
    /// needs no fix-up.
    pub fn detach(&mut self) -> &mut ArenaBlock {
        if self.is_shared() {
            debug!(
                arrays = self.block.array_count(),
                sets = self.block.set_count(),
                points = self.block.point_count(),
                sharers = self.ref_count(),
                "Cloning shared arena block before mutation."
            );
        }
        Arc::make_mut(&mut self.block)
    }

    /// Returns an arena holding only set `index`.
    ///
    /// If the set is already the sole occupant of this block, the block
    /// itself is shared rather than copied.
    pub fn extract_set(&self, index: usize) -> Result<Arena, PointSetError> {
        let block = self.block();
        if block.array_count() == 1 && block.set_count() == 1 {
            return Ok(self.clone());
        }
        debug!(
            set = index,
            points = block.set(index).point_count,
            "Extracting point set into a standalone arena."
        );
        block.extract_set(index).map(Self::new)
    }

    /// Returns an arena holding only array `index`.
    ///
    /// If the array is already the sole occupant of this block, the block
    /// itself is shared rather than copied.
    pub fn extract_array(&self, index: usize) -> Result<Arena, PointSetError> {
        let block = self.block();
        if block.array_count() == 1 {
            return Ok(self.clone());
        }
        debug!(
            array = index,
            sets = block.array(index).set_count,
            points = block.array(index).point_count,
            "Extracting point-set array into a standalone arena."
        );
        block.extract_array(index).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::super::block::SetSource;
    use super::super::layout::ArenaLayout;
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn two_array_arena() -> Arena {
        let points: Vec<Point3<f64>> = (0..5).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let mut layout = ArenaLayout::new();
        layout.push_array([1, 1]).push_array([1, 1, 1]);
        let block = ArenaBlock::assemble(
            &layout,
            (0..5).map(|i| SetSource::fresh(&points[i..i + 1])),
        )
        .unwrap();
        Arena::new(block)
    }

    #[test]
    fn clones_share_the_block_and_count_references() {
        let arena = two_array_arena();
        assert_eq!(arena.ref_count(), 1);
        assert!(!arena.is_shared());

        let alias = arena.clone();
        assert!(arena.ptr_eq(&alias));
        assert_eq!(arena.ref_count(), 2);

        drop(alias);
        assert_eq!(arena.ref_count(), 1);
    }

    #[test]
    fn detach_on_exclusive_block_does_not_copy() {
        let mut arena = two_array_arena();
        let before = arena.block() as *const ArenaBlock;
        arena.detach();
        assert_eq!(before, arena.block() as *const ArenaBlock);
    }

    #[test]
    fn detach_on_shared_block_isolates_the_writer() {
        let original = two_array_arena();
        let mut writer = original.clone();

        writer
            .detach()
            .transform_sets(0..5, |p| p + Vector3::new(0.0, 0.0, 1.0));

        assert!(!writer.ptr_eq(&original));
        assert_eq!(writer.ref_count(), 1);
        assert_eq!(original.ref_count(), 1);
        assert_eq!(original.block().points()[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(writer.block().points()[0], Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn extract_array_copies_only_when_shared_with_siblings() {
        let arena = two_array_arena();
        let second = arena.extract_array(1).unwrap();

        assert!(!second.ptr_eq(&arena));
        assert_eq!(second.block().array_count(), 1);
        assert_eq!(second.block().set_count(), 3);
        assert_eq!(second.block().points(), &arena.block().points()[2..5]);
        assert_eq!(second.block().boxes(), &arena.block().boxes()[2..5]);

        let again = second.extract_array(0).unwrap();
        assert!(again.ptr_eq(&second));
    }

    #[test]
    fn extract_set_copies_only_when_shared_with_siblings() {
        let arena = two_array_arena();
        let set = arena.extract_set(3).unwrap();
        assert_eq!(set.block().set_count(), 1);
        assert_eq!(set.block().points(), &[Point3::new(3.0, 0.0, 0.0)]);

        let again = set.extract_set(0).unwrap();
        assert!(again.ptr_eq(&set));
    }
}
