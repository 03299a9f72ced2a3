//! Error types for tensor operations
//!
//! Every failure in the tensal stack is one of a small set of categories,
//! detected eagerly before any storage is written. The categories are carried
//! as structured variants so callers can match on them instead of parsing
//! message strings.

use thiserror::Error;

/// Error type for tensor operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TensorError {
    /// Extents disagree across an operation's contract
    #[error("{operation}: shape mismatch - expected {expected:?}, got {actual:?}. {context}")]
    ShapeMismatch {
        operation: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
        context: String,
    },

    /// Label count differs from rank, illegal label multiplicity, or a
    /// non-permutation where one is required
    #[error("{operation}: label mismatch: {message}")]
    LabelMismatch { operation: String, message: String },

    /// Operation not supported by the tensor's backend
    #[error("{operation}: not supported by the {kind} backend")]
    BackendUnsupported { operation: String, kind: String },

    /// Slice interval violates an axis extent
    #[error("{operation}: range [{lo}, {hi}) out of bounds for axis {axis} with extent {extent}")]
    RangeOutOfBounds {
        operation: String,
        axis: usize,
        lo: usize,
        hi: usize,
        extent: usize,
    },

    /// N-way product with inconsistent label algebra
    #[error("contraction planning failed: {message}")]
    PlanningFailure { message: String },

    /// Backend cannot obtain memory for a tensor or temporary
    #[error("{operation}: cannot allocate storage for shape {shape:?}")]
    AllocationFailure { operation: String, shape: Vec<usize> },
}

impl TensorError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(
        operation: impl Into<String>,
        expected: Vec<usize>,
        actual: Vec<usize>,
        context: impl Into<String>,
    ) -> Self {
        TensorError::ShapeMismatch {
            operation: operation.into(),
            expected,
            actual,
            context: context.into(),
        }
    }

    /// Create a label mismatch error
    pub fn label_mismatch(operation: impl Into<String>, message: impl Into<String>) -> Self {
        TensorError::LabelMismatch {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a backend unsupported error
    pub fn backend_unsupported(operation: impl Into<String>, kind: impl Into<String>) -> Self {
        TensorError::BackendUnsupported {
            operation: operation.into(),
            kind: kind.into(),
        }
    }

    /// Create a range out of bounds error
    pub fn range_out_of_bounds(
        operation: impl Into<String>,
        axis: usize,
        range: (usize, usize),
        extent: usize,
    ) -> Self {
        TensorError::RangeOutOfBounds {
            operation: operation.into(),
            axis,
            lo: range.0,
            hi: range.1,
            extent,
        }
    }

    /// Create a planning failure error
    pub fn planning_failure(message: impl Into<String>) -> Self {
        TensorError::PlanningFailure {
            message: message.into(),
        }
    }

    /// Create an allocation failure error
    pub fn allocation_failure(operation: impl Into<String>, shape: &[usize]) -> Self {
        TensorError::AllocationFailure {
            operation: operation.into(),
            shape: shape.to_vec(),
        }
    }
}

/// Result type for tensor operations
pub type Result<T> = std::result::Result<T, TensorError>;
