use thiserror::Error;

/// Errors raised by the point-set containers and their editors.
///
/// Bounds and size mismatches are always reported to the immediate caller;
/// nothing is clamped or truncated silently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointSetError {
    /// An index fell outside `[0, count)`.
    #[error("Index {index} is out of range (valid range is 0..{count})")]
    Index {
        /// The offending index.
        index: usize,
        /// The number of valid elements.
        count: usize,
    },

    /// Replacement data is not shaped like the data it replaces.
    ///
    /// Raised when a point count, or the number of sets in an array, differs
    /// between the target and its replacement.
    #[error("Incompatible size: expected {expected} but got {actual}")]
    IncompatibleSize {
        /// Size of the target.
        expected: usize,
        /// Size of the replacement.
        actual: usize,
    },

    /// The arena block could not be allocated.
    #[error("Failed to allocate an arena block of {bytes} bytes")]
    Allocation {
        /// Size of the requested block (saturated on overflow).
        bytes: usize,
    },

    /// A coordinate frame was built from a matrix that cannot be inverted.
    #[error("Coordinate frame matrix is singular and cannot be inverted")]
    SingularFrame,
}

impl PointSetError {
    /// Checks that `index` addresses one of `count` elements.
    #[inline]
    pub(crate) fn check_index(index: usize, count: usize) -> Result<(), Self> {
        if index < count {
            Ok(())
        } else {
            Err(Self::Index { index, count })
        }
    }

    /// Checks that a replacement of `actual` points fits a target of `expected` points.
    #[inline]
    pub(crate) fn check_size(expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::IncompatibleSize { expected, actual })
        }
    }
}

/// Unwraps the result of an allocation whose failure is unrecoverable.
///
/// The infallible constructors behave like the standard collections: when
/// the backing storage cannot be obtained the program does not continue.
/// Callers that want to handle the failure use the `try_*` constructors.
#[track_caller]
pub(crate) fn unwrap_allocation<T>(result: Result<T, PointSetError>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("{error}"),
    }
}
