//! Hyper-rectangle assignment.
//!
//! Computes `C[Cranges] <- alpha * A[Aranges] + beta * C[Cranges]` where each
//! range list holds one half-open `[lo, hi)` interval per axis. Elements map
//! one-to-one in index order; there is no reordering.

use crate::util::linear_to_coord;
use tensal_core::{DenseData, Result, TensorError};

fn validate_ranges(
    operation: &str,
    what: &str,
    ranges: &[(usize, usize)],
    shape: &[usize],
) -> Result<()> {
    if ranges.len() != shape.len() {
        return Err(TensorError::shape_mismatch(
            operation,
            vec![shape.len()],
            vec![ranges.len()],
            format!("{} range list must have one interval per axis", what),
        ));
    }
    for (axis, (&(lo, hi), &extent)) in ranges.iter().zip(shape.iter()).enumerate() {
        if lo > hi || hi > extent {
            return Err(TensorError::range_out_of_bounds(
                operation,
                axis,
                (lo, hi),
                extent,
            ));
        }
    }
    Ok(())
}

/// Slice kernel: `C[Cranges] <- alpha * A[Aranges] + beta * C[Cranges]`.
///
/// The two range lists must select windows of identical per-axis width, and
/// every interval must lie within its axis extent. When `beta == 0` the
/// target window is never read; elements outside the window are untouched.
///
/// # Errors
///
/// * [`TensorError::ShapeMismatch`] - range-list rank disagrees with a
///   tensor's rank, or window widths differ on some axis
/// * [`TensorError::RangeOutOfBounds`] - an interval violates its extent
///
/// # Examples
///
/// ```
/// use tensal_core::DenseData;
/// use tensal_kernels::slice;
///
/// let a = DenseData::from_elem(&[4, 4], 1.0);
/// let mut c = DenseData::zeros(&[4, 4]);
/// slice(&mut c, &a, &[(1, 3), (1, 3)], &[(0, 2), (0, 2)], 1.0, 1.0).unwrap();
/// assert_eq!(c[&[1, 1]], 1.0);
/// assert_eq!(c[&[0, 0]], 0.0);
/// ```
pub fn slice(
    c: &mut DenseData,
    a: &DenseData,
    cranges: &[(usize, usize)],
    aranges: &[(usize, usize)],
    alpha: f64,
    beta: f64,
) -> Result<()> {
    validate_ranges("slice", "target", cranges, c.shape())?;
    validate_ranges("slice", "source", aranges, a.shape())?;

    let window: Vec<usize> = cranges.iter().map(|&(lo, hi)| hi - lo).collect();
    let a_window: Vec<usize> = aranges.iter().map(|&(lo, hi)| hi - lo).collect();
    if window != a_window {
        return Err(TensorError::shape_mismatch(
            "slice",
            window,
            a_window,
            "window widths must agree on every axis",
        ));
    }

    let numel: usize = window.iter().product();
    let rank = window.len();
    let mut c_coord = vec![0; rank];
    let mut a_coord = vec![0; rank];

    for idx in 0..numel {
        let w = linear_to_coord(idx, &window);
        for axis in 0..rank {
            c_coord[axis] = cranges[axis].0 + w[axis];
            a_coord[axis] = aranges[axis].0 + w[axis];
        }
        let src = alpha * a[&a_coord[..]];
        let dst = &mut c[&c_coord[..]];
        *dst = if beta == 0.0 { src } else { src + beta * *dst };
    }

    Ok(())
}
