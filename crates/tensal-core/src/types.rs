//! Core type definitions for tensal tensors.
//!
//! This module defines the fundamental types used throughout the stack:
//!
//! - Type aliases for shapes, labels, and slice ranges ([`Shape`], [`Label`],
//!   [`Indices`], [`IndexRange`])
//! - Backend selection ([`BackendKind`]) for the storage policy under a
//!   tensor handle

use smallvec::SmallVec;
use std::fmt;

/// Type alias for tensor rank (number of dimensions).
pub type Rank = usize;

/// Shape type using SmallVec to avoid heap allocation for common ranks.
///
/// Optimized for tensors with up to 6 dimensions; higher ranks (at least 8
/// are supported everywhere) spill to the heap automatically.
pub type Shape = SmallVec<[usize; 6]>;

/// A single index label, e.g. `'i'` in `A("ij")`.
pub type Label = char;

/// An ordered sequence of index labels, e.g. `['i', 'j']` for `"ij"`.
pub type Indices = SmallVec<[Label; 8]>;

/// Half-open `[lo, hi)` intervals, one per axis, selecting a hyper-rectangle.
pub type IndexRange = Vec<(usize, usize)>;

/// Storage policy under a tensor handle.
///
/// Only the in-core dense backend is implemented in this build; the disk and
/// distributed kinds are pluggable implementations of the same storage
/// contract and report `backend-unsupported` until one is wired in.
/// `Agnostic` defers to the library default.
///
/// # Examples
///
/// ```
/// use tensal_core::BackendKind;
///
/// assert_eq!(BackendKind::Agnostic.resolve(), BackendKind::Core);
/// assert_eq!(BackendKind::Disk.resolve(), BackendKind::Disk);
/// assert_eq!(format!("{}", BackendKind::Core), "core");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackendKind {
    /// In-core dense storage (contiguous row-major doubles)
    Core,
    /// Disk-resident storage, paged through the in-core kernels
    Disk,
    /// Cluster-distributed storage
    Distributed,
    /// Defer to the library default backend
    Agnostic,
}

impl BackendKind {
    /// Resolve `Agnostic` to the library default backend.
    pub fn resolve(self) -> BackendKind {
        match self {
            BackendKind::Agnostic => BackendKind::Core,
            other => other,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Core => "core",
            BackendKind::Disk => "disk",
            BackendKind::Distributed => "distributed",
            BackendKind::Agnostic => "agnostic",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_resolve() {
        assert_eq!(BackendKind::Core.resolve(), BackendKind::Core);
        assert_eq!(BackendKind::Agnostic.resolve(), BackendKind::Core);
        assert_eq!(BackendKind::Distributed.resolve(), BackendKind::Distributed);
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(format!("{}", BackendKind::Disk), "disk");
        assert_eq!(format!("{}", BackendKind::Agnostic), "agnostic");
    }

    #[test]
    fn test_shape_smallvec_inline_and_spill() {
        let small: Shape = Shape::from_slice(&[2, 3, 4]);
        assert_eq!(small.len(), 3);

        // Rank 8 must be representable
        let big: Shape = Shape::from_slice(&[2; 8]);
        assert_eq!(big.len(), 8);
    }
}
