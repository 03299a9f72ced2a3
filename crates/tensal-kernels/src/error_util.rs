//! Small error-construction helpers local to the kernels.

use tensal_core::TensorError;

/// Shape mismatch with slices instead of owned vectors at the call site.
pub(crate) fn layout_error(
    operation: &str,
    expected: &[usize],
    actual: &[usize],
    context: &str,
) -> TensorError {
    TensorError::shape_mismatch(operation, expected.to_vec(), actual.to_vec(), context)
}

/// Internal reshape failure surfaced as a shape mismatch. The kernels
/// validate before reshaping, so reaching this indicates inconsistent
/// operands rather than a usage error.
pub(crate) fn reshape_error(operation: &str, err: impl ToString) -> TensorError {
    TensorError::shape_mismatch(operation, Vec::new(), Vec::new(), err.to_string())
}
