//! General pairwise contraction.
//!
//! Computes `C(Cinds) <- alpha * A(Ainds) * B(Binds) + beta * C(Cinds)` for
//! arbitrary labelings by reduction to a dense matrix product:
//!
//! 1. labels repeated on one operand or foreign to the other two are resolved
//!    by a [`reduce_repeated`] pre-step (trace, diagonal, or unilateral sum),
//! 2. the remaining labels are classified into externals `PA`/`PB`, Hadamard
//!    batch labels `H`, and contracted labels `I`,
//! 3. `A` is transposed to `[H, PA, I]` and `B` to `[H, I, PB]` in standard
//!    layout, and each `H` block is dispatched to the external GEMM kernel,
//! 4. the `[H, PA, PB]` result is permute-accumulated into `C` with the
//!    caller's `beta`.
//!
//! Rank-2 pairs with no Hadamard labels skip the transposition entirely and
//! feed (possibly transposed) views straight to GEMM, choosing the transposed
//! variant `C^T = B^T A^T` when the output labeling is reversed.

use crate::error_util::reshape_error;
use crate::permute::accumulate_permuted;
use crate::reduce::reduce_repeated;
use ndarray::linalg::general_mat_mul;
use ndarray::{Array3, Axis, Ix2, IxDyn};
use std::collections::HashMap;
use tensal_core::labels::{self, indices_to_string, ContractionClasses};
use tensal_core::{DenseData, Indices, Label, Result, TensorError};

/// Contract kernel:
/// `C(Cinds) <- alpha * A(Ainds) * B(Binds) + beta * C(Cinds)`.
///
/// Every label in `Cinds` must appear on at least one input; labels shared by
/// both inputs and absent from the output are summed; labels on all three
/// tensors batch elementwise. When `beta == 0` the target is never read.
///
/// # Errors
///
/// * [`TensorError::LabelMismatch`] - label counts disagree with ranks, the
///   output repeats a label, or an output label appears on neither input
/// * [`TensorError::ShapeMismatch`] - a label's extent is inconsistent
///   across its occurrences
///
/// # Examples
///
/// ```
/// use tensal_core::{labels::parse_indices, DenseData};
/// use tensal_kernels::contract;
///
/// let a = DenseData::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let b = DenseData::from_vec(vec![5.0, 6.0, 7.0, 8.0], &[2, 2]).unwrap();
/// let mut c = DenseData::zeros(&[2, 2]);
/// contract(
///     &mut c,
///     &a,
///     &b,
///     &parse_indices("ij"),
///     &parse_indices("ik"),
///     &parse_indices("kj"),
///     1.0,
///     0.0,
/// )
/// .unwrap();
/// assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn contract(
    c: &mut DenseData,
    a: &DenseData,
    b: &DenseData,
    cinds: &[Label],
    ainds: &[Label],
    binds: &[Label],
    alpha: f64,
    beta: f64,
) -> Result<()> {
    let map = labels::extent_map(
        "contract",
        &[
            (ainds, a.shape()),
            (binds, b.shape()),
            (cinds, c.shape()),
        ],
    )?;
    if labels::has_repeats(cinds) {
        return Err(TensorError::label_mismatch(
            "contract",
            format!(
                "output labels \"{}\" contain a repeat",
                indices_to_string(cinds)
            ),
        ));
    }

    // Resolve traces, diagonals, and unilateral sums before classification.
    let a_lab = labels::kept_labels(ainds, &[binds, cinds]);
    let b_lab = labels::kept_labels(binds, &[ainds, cinds]);
    let a_reduced;
    let a_eff: &DenseData = if a_lab.as_slice() != ainds {
        a_reduced = reduce_repeated(a, ainds, &a_lab)?;
        &a_reduced
    } else {
        a
    };
    let b_reduced;
    let b_eff: &DenseData = if b_lab.as_slice() != binds {
        b_reduced = reduce_repeated(b, binds, &b_lab)?;
        &b_reduced
    } else {
        b
    };

    let classes = labels::classify_contraction("contract", cinds, &a_lab, &b_lab)?;

    if classes.hadamard.is_empty()
        && classes.external_a.len() == 1
        && classes.external_b.len() == 1
        && classes.contracted.len() == 1
    {
        return gemm_rank2(c, a_eff, b_eff, cinds, &a_lab, &b_lab, &classes, alpha, beta);
    }

    gemm_batched(c, a_eff, b_eff, cinds, &a_lab, &b_lab, &classes, &map, alpha, beta)
}

/// Matrix-matrix case: both operands rank 2, output rank 2, no Hadamard
/// labels. GEMM runs on views, with at most transposition flags.
#[allow(clippy::too_many_arguments)]
fn gemm_rank2(
    c: &mut DenseData,
    a: &DenseData,
    b: &DenseData,
    cinds: &[Label],
    a_lab: &[Label],
    b_lab: &[Label],
    classes: &ContractionClasses,
    alpha: f64,
    beta: f64,
) -> Result<()> {
    let pa = classes.external_a[0];
    let pb = classes.external_b[0];

    let a2 = a
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|e| reshape_error("contract", e))?;
    let a2 = if a_lab[0] == pa { a2 } else { a2.reversed_axes() };

    let b2 = b
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|e| reshape_error("contract", e))?;
    let b2 = if b_lab[1] == pb { b2 } else { b2.reversed_axes() };

    let mut c2 = c
        .view_mut()
        .into_dimensionality::<Ix2>()
        .map_err(|e| reshape_error("contract", e))?;

    if cinds[0] == pa {
        general_mat_mul(alpha, &a2, &b2, beta, &mut c2);
    } else {
        // Output labeling is (PB, PA): take the transposed variant,
        // C = B^T A^T.
        general_mat_mul(alpha, &b2.reversed_axes(), &a2.reversed_axes(), beta, &mut c2);
    }
    Ok(())
}

/// General case: transpose both operands into GEMM layout and batch over the
/// Hadamard labels.
#[allow(clippy::too_many_arguments)]
fn gemm_batched(
    c: &mut DenseData,
    a: &DenseData,
    b: &DenseData,
    cinds: &[Label],
    a_lab: &[Label],
    b_lab: &[Label],
    classes: &ContractionClasses,
    map: &HashMap<Label, usize>,
    alpha: f64,
    beta: f64,
) -> Result<()> {
    let size_of = |ls: &[Label]| -> usize { ls.iter().map(|l| map[l]).product() };
    let hs = size_of(&classes.hadamard);
    let m = size_of(&classes.external_a);
    let k = size_of(&classes.contracted);
    let n = size_of(&classes.external_b);

    let position = |order: &[Label], l: Label| -> usize {
        order.iter().position(|&x| x == l).expect("label classified")
    };

    // A -> [H, PA, I]
    let a_order: Indices = classes
        .hadamard
        .iter()
        .chain(classes.external_a.iter())
        .chain(classes.contracted.iter())
        .copied()
        .collect();
    let perm_a: Vec<usize> = a_order.iter().map(|&l| position(a_lab, l)).collect();
    let a3 = a
        .view()
        .permuted_axes(IxDyn(&perm_a))
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((hs, m, k))
        .map_err(|e| reshape_error("contract", e))?;

    // B -> [H, I, PB]
    let b_order: Indices = classes
        .hadamard
        .iter()
        .chain(classes.contracted.iter())
        .chain(classes.external_b.iter())
        .copied()
        .collect();
    let perm_b: Vec<usize> = b_order.iter().map(|&l| position(b_lab, l)).collect();
    let b3 = b
        .view()
        .permuted_axes(IxDyn(&perm_b))
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((hs, k, n))
        .map_err(|e| reshape_error("contract", e))?;

    let mut c3 = Array3::<f64>::zeros((hs, m, n));
    for h in 0..hs {
        general_mat_mul(
            alpha,
            &a3.index_axis(Axis(0), h),
            &b3.index_axis(Axis(0), h),
            0.0,
            &mut c3.index_axis_mut(Axis(0), h),
        );
    }

    // [H, PA, PB] -> C's labeling, with the caller's beta.
    let tmp_order: Indices = classes
        .hadamard
        .iter()
        .chain(classes.external_a.iter())
        .chain(classes.external_b.iter())
        .copied()
        .collect();
    let tmp_dims: Vec<usize> = tmp_order.iter().map(|l| map[l]).collect();
    let tmp = c3
        .into_shape_with_order(IxDyn(&tmp_dims))
        .map_err(|e| reshape_error("contract", e))?;
    let perm_c: Vec<usize> = cinds.iter().map(|&l| position(&tmp_order, l)).collect();
    accumulate_permuted(c, tmp.view(), &perm_c, 1.0, beta)
}
