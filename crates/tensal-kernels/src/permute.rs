//! Generalized transpose.
//!
//! Computes `C(Cinds) <- alpha * A(Ainds) + beta * C(Cinds)` where `Cinds` is
//! a permutation of `Ainds`. The label sequences define the axis permutation;
//! the traversal itself is a single fused pass over the aligned views, which
//! ndarray walks in the memory order of the destination (the innermost
//! contiguous axis of `C` runs fastest).

use crate::error_util::layout_error;
use ndarray::{ArrayViewD, IxDyn, Zip};
use tensal_core::labels;
use tensal_core::{DenseData, Label, Result};

/// Accumulate a permuted view of `a` into `c`:
/// `c <- alpha * permuted(a) + beta * c`.
///
/// Axis `k` of `c` corresponds to axis `perm[k]` of `a`. When `beta == 0`
/// the destination is never read, so a NaN-filled target is overwritten
/// cleanly.
pub(crate) fn accumulate_permuted(
    c: &mut DenseData,
    a: ArrayViewD<'_, f64>,
    perm: &[usize],
    alpha: f64,
    beta: f64,
) -> Result<()> {
    let aligned = a.permuted_axes(IxDyn(perm));
    if aligned.shape() != c.shape() {
        return Err(layout_error(
            "permute",
            c.shape(),
            aligned.shape(),
            "target extents must match the permuted source",
        ));
    }
    if beta == 0.0 {
        Zip::from(c.view_mut())
            .and(&aligned)
            .for_each(|c, &x| *c = alpha * x);
    } else {
        Zip::from(c.view_mut())
            .and(&aligned)
            .for_each(|c, &x| *c = alpha * x + beta * *c);
    }
    Ok(())
}

/// Permute kernel: `C(Cinds) <- alpha * A(Ainds) + beta * C(Cinds)`.
///
/// Rank 0 and rank 1 degenerate to scale-and-add.
///
/// # Errors
///
/// * [`tensal_core::TensorError::LabelMismatch`] - label counts disagree with
///   ranks, a label repeats, or the sequences are not permutations of each
///   other
/// * [`tensal_core::TensorError::ShapeMismatch`] - extents disagree under the
///   permutation
///
/// # Examples
///
/// ```
/// use tensal_core::{labels::parse_indices, DenseData};
/// use tensal_kernels::permute;
///
/// let a = DenseData::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let mut c = DenseData::zeros(&[2, 2]);
/// permute(
///     &mut c,
///     &a,
///     &parse_indices("ij"),
///     &parse_indices("ji"),
///     1.0,
///     0.0,
/// )
/// .unwrap();
/// assert_eq!(c.data(), &[1.0, 3.0, 2.0, 4.0]);
/// ```
pub fn permute(
    c: &mut DenseData,
    a: &DenseData,
    cinds: &[Label],
    ainds: &[Label],
    alpha: f64,
    beta: f64,
) -> Result<()> {
    labels::extent_map(
        "permute",
        &[(ainds, a.shape()), (cinds, c.shape())],
    )?;
    let perm = labels::permutation_between("permute", cinds, ainds)?;
    accumulate_permuted(c, a.view(), &perm, alpha, beta)
}
