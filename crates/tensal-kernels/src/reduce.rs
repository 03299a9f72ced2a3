//! Reduction pre-steps for repeated and unilateral labels.
//!
//! A labeled operand may carry a label more than once, or carry a label that
//! appears on no other operand of its operation. Both cases are resolved
//! before the pairwise kernels run:
//!
//! * a label repeated on the operand and **kept** by the output selects the
//!   diagonal over those axes (`A("ii") -> "i"`),
//! * a label repeated on the operand and **dropped** by the output is a trace
//!   (`A("ii") -> ""`),
//! * a label appearing once and dropped by the output is summed away.

use crate::util::linear_to_coord;
use tensal_core::labels::{self, indices_to_string};
use tensal_core::{DenseData, Label, Result, TensorError};

/// Reduce `a` from labeling `ainds` (repeats allowed) to the repeat-free
/// labeling `outinds`.
///
/// Every output label must occur in `ainds`; every input label missing from
/// `outinds` is summed over (one summation variable per label, shared by all
/// axes carrying it).
///
/// # Errors
///
/// [`TensorError::LabelMismatch`] if `outinds` repeats a label or names one
/// absent from `ainds`; [`TensorError::ShapeMismatch`] if repeated axes
/// disagree on extent.
///
/// # Examples
///
/// ```
/// use tensal_core::{labels::parse_indices, DenseData};
/// use tensal_kernels::reduce_repeated;
///
/// let a = DenseData::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
///
/// // Trace: sum of the diagonal
/// let t = reduce_repeated(&a, &parse_indices("ii"), &parse_indices("")).unwrap();
/// assert_eq!(t.data(), &[5.0]);
///
/// // Reduction to diagonal
/// let d = reduce_repeated(&a, &parse_indices("ii"), &parse_indices("i")).unwrap();
/// assert_eq!(d.data(), &[1.0, 4.0]);
/// ```
pub fn reduce_repeated(a: &DenseData, ainds: &[Label], outinds: &[Label]) -> Result<DenseData> {
    let map = labels::extent_map("reduce", &[(ainds, a.shape())])?;
    if labels::has_repeats(outinds) {
        return Err(TensorError::label_mismatch(
            "reduce",
            format!(
                "output labels \"{}\" contain a repeat",
                indices_to_string(outinds)
            ),
        ));
    }
    for &l in outinds {
        if !ainds.contains(&l) {
            return Err(TensorError::label_mismatch(
                "reduce",
                format!("output label '{}' does not occur in the input", l),
            ));
        }
    }

    let out_shape: Vec<usize> = outinds.iter().map(|l| map[l]).collect();
    let summed: Vec<Label> = labels::unique_labels(ainds)
        .into_iter()
        .filter(|l| !outinds.contains(l))
        .collect();
    let sum_shape: Vec<usize> = summed.iter().map(|l| map[l]).collect();

    // For each input axis, where its coordinate comes from.
    enum Source {
        Out(usize),
        Sum(usize),
    }
    let sources: Vec<Source> = ainds
        .iter()
        .map(|l| match outinds.iter().position(|o| o == l) {
            Some(p) => Source::Out(p),
            None => Source::Sum(summed.iter().position(|s| s == l).expect("label classified")),
        })
        .collect();

    let mut out = DenseData::zeros(&out_shape);
    let out_numel = out.numel();
    let sum_numel: usize = sum_shape.iter().product();
    let mut a_coord = vec![0; ainds.len()];

    for out_idx in 0..out_numel {
        let out_coord = linear_to_coord(out_idx, &out_shape);
        let mut acc = 0.0;
        for sum_idx in 0..sum_numel {
            let sum_coord = linear_to_coord(sum_idx, &sum_shape);
            for (axis, source) in sources.iter().enumerate() {
                a_coord[axis] = match source {
                    Source::Out(p) => out_coord[*p],
                    Source::Sum(p) => sum_coord[*p],
                };
            }
            acc += a[&a_coord[..]];
        }
        out[&out_coord[..]] = acc;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensal_core::labels::parse_indices;

    fn block(vals: Vec<f64>, shape: &[usize]) -> DenseData {
        DenseData::from_vec(vals, shape).unwrap()
    }

    #[test]
    fn test_trace_of_matrix() {
        let a = block(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let t = reduce_repeated(&a, &parse_indices("ii"), &parse_indices("")).unwrap();
        assert_eq!(t.rank(), 0);
        assert_eq!(t.data(), &[5.0]);
    }

    #[test]
    fn test_diagonal_of_matrix() {
        let a = block(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let d = reduce_repeated(&a, &parse_indices("ii"), &parse_indices("i")).unwrap();
        assert_eq!(d.shape(), &[2]);
        assert_eq!(d.data(), &[1.0, 4.0]);
    }

    #[test]
    fn test_partial_trace_keeps_free_axis() {
        // A(iij): trace over i for each j
        let a = block((0..12).map(|x| x as f64).collect(), &[2, 2, 3]);
        let t = reduce_repeated(&a, &parse_indices("iij"), &parse_indices("j")).unwrap();
        assert_eq!(t.shape(), &[3]);
        // diag entries: A[0,0,j] + A[1,1,j] = j + (9 + j)
        assert_eq!(t.data(), &[9.0, 11.0, 13.0]);
    }

    #[test]
    fn test_unilateral_sum() {
        // A(ij) summed over j
        let a = block(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let s = reduce_repeated(&a, &parse_indices("ij"), &parse_indices("i")).unwrap();
        assert_eq!(s.data(), &[6.0, 15.0]);
    }

    #[test]
    fn test_identity_when_nothing_reduced() {
        let a = block(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let r = reduce_repeated(&a, &parse_indices("ij"), &parse_indices("ij")).unwrap();
        assert_eq!(r.data(), a.data());
    }

    #[test]
    fn test_reorders_kept_labels() {
        let a = block(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let r = reduce_repeated(&a, &parse_indices("ij"), &parse_indices("ji")).unwrap();
        assert_eq!(r.shape(), &[3, 2]);
        assert_eq!(r[&[2, 1]], 6.0);
    }

    #[test]
    fn test_rejects_repeated_extent_mismatch() {
        let a = block(vec![0.0; 6], &[2, 3]);
        let err = reduce_repeated(&a, &parse_indices("ii"), &parse_indices("")).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_rejects_unknown_output_label() {
        let a = block(vec![0.0; 4], &[2, 2]);
        let err = reduce_repeated(&a, &parse_indices("ij"), &parse_indices("k")).unwrap_err();
        assert!(matches!(err, TensorError::LabelMismatch { .. }));
    }
}
