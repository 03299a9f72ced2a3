//! Label algebra for contractions and permutations.
//!
//! A labeled operation such as `C("ij") += A("ik") * B("jk")` is fully
//! described by its index label sequences. This module classifies those
//! labels (external, Hadamard, contracted, unilaterally reduced), builds the
//! label → extent map, and validates the invariants every kernel relies on:
//! extent consistency across occurrences, legal multiplicities, and
//! permutation relationships.

use crate::error::{Result, TensorError};
use crate::types::{Indices, Label};
use std::collections::HashMap;

/// Parse an index string like `"ijk"` into a label sequence.
///
/// Each label is a single character; an empty string is the (rank-0) scalar
/// labeling. No validation happens here - label/rank agreement is checked at
/// the operation that consumes the labels.
///
/// # Examples
///
/// ```
/// use tensal_core::labels::parse_indices;
///
/// let inds = parse_indices("ijk");
/// assert_eq!(inds.as_slice(), &['i', 'j', 'k']);
/// assert!(parse_indices("").is_empty());
/// ```
pub fn parse_indices(s: &str) -> Indices {
    s.chars().collect()
}

/// Format a label sequence back into a string, for diagnostics.
pub fn indices_to_string(inds: &[Label]) -> String {
    inds.iter().collect()
}

/// The unique labels of `inds`, in order of first appearance.
pub fn unique_labels(inds: &[Label]) -> Indices {
    let mut out = Indices::new();
    for &l in inds {
        if !out.contains(&l) {
            out.push(l);
        }
    }
    out
}

/// Whether any label occurs more than once in `inds`.
pub fn has_repeats(inds: &[Label]) -> bool {
    unique_labels(inds).len() != inds.len()
}

/// The unique labels of `inds` that also appear in `keep_if_in`, in order of
/// first appearance.
///
/// This is the post-reduction labeling of a contraction operand: labels
/// repeated on one operand collapse to a trace or diagonal, and labels
/// appearing on no other operand (and not on the output) are summed away
/// before the pairwise kernel runs.
pub fn kept_labels(inds: &[Label], keep_if_in: &[&[Label]]) -> Indices {
    let mut out = Indices::new();
    for &l in inds {
        if !out.contains(&l) && keep_if_in.iter().any(|other| other.contains(&l)) {
            out.push(l);
        }
    }
    out
}

/// Build the label → extent map for a set of operands, validating that every
/// occurrence of a label carries the same extent.
///
/// # Errors
///
/// Returns [`TensorError::LabelMismatch`] if an operand's label count differs
/// from its rank, and [`TensorError::ShapeMismatch`] if a label appears with
/// two different extents.
pub fn extent_map(
    operation: &str,
    operands: &[(&[Label], &[usize])],
) -> Result<HashMap<Label, usize>> {
    let mut map = HashMap::new();
    for (inds, shape) in operands {
        if inds.len() != shape.len() {
            return Err(TensorError::label_mismatch(
                operation,
                format!(
                    "label string \"{}\" has {} labels but the tensor has rank {}",
                    indices_to_string(inds),
                    inds.len(),
                    shape.len()
                ),
            ));
        }
        for (&l, &extent) in inds.iter().zip(shape.iter()) {
            match map.get(&l) {
                Some(&prev) if prev != extent => {
                    return Err(TensorError::shape_mismatch(
                        operation,
                        vec![prev],
                        vec![extent],
                        format!("extent of label '{}' is inconsistent", l),
                    ));
                }
                _ => {
                    map.insert(l, extent);
                }
            }
        }
    }
    Ok(map)
}

/// Compute the axis permutation taking `ainds` order to `cinds` order.
///
/// Axis `k` of the output corresponds to axis `perm[k]` of the input. Both
/// sequences must be repeat-free and contain exactly the same labels.
///
/// # Errors
///
/// Returns [`TensorError::LabelMismatch`] if either side repeats a label or
/// the two sides are not permutations of each other.
pub fn permutation_between(operation: &str, cinds: &[Label], ainds: &[Label]) -> Result<Vec<usize>> {
    if has_repeats(cinds) || has_repeats(ainds) {
        return Err(TensorError::label_mismatch(
            operation,
            format!(
                "repeated label in permutation \"{}\" <- \"{}\"",
                indices_to_string(cinds),
                indices_to_string(ainds)
            ),
        ));
    }
    if cinds.len() != ainds.len() {
        return Err(TensorError::label_mismatch(
            operation,
            format!(
                "\"{}\" and \"{}\" differ in length",
                indices_to_string(cinds),
                indices_to_string(ainds)
            ),
        ));
    }
    let mut perm = Vec::with_capacity(cinds.len());
    for &l in cinds {
        match ainds.iter().position(|&a| a == l) {
            Some(p) => perm.push(p),
            None => {
                return Err(TensorError::label_mismatch(
                    operation,
                    format!(
                        "\"{}\" is not a permutation of \"{}\"",
                        indices_to_string(cinds),
                        indices_to_string(ainds)
                    ),
                ));
            }
        }
    }
    Ok(perm)
}

/// Classification of the labels of one pairwise contraction
/// `C(Cinds) = A(Ainds) * B(Binds)`.
///
/// Operands are expected in reduced form (no repeats, no unilateral labels);
/// see [`kept_labels`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractionClasses {
    /// Labels in A and C only (row block of the matrix view)
    pub external_a: Indices,
    /// Labels in B and C only (column block of the matrix view)
    pub external_b: Indices,
    /// Labels in A, B, and C (elementwise batch dimensions)
    pub hadamard: Indices,
    /// Labels in A and B but not C (summed)
    pub contracted: Indices,
}

/// Classify the labels of a pairwise contraction.
///
/// External and Hadamard labels are reported in `cinds` order; contracted
/// labels in `ainds` order.
///
/// # Errors
///
/// Returns [`TensorError::LabelMismatch`] if the output repeats a label, an
/// output label appears on neither input, or an input still carries a repeat
/// or a label foreign to the other two operands (those must be reduced away
/// first).
pub fn classify_contraction(
    operation: &str,
    cinds: &[Label],
    ainds: &[Label],
    binds: &[Label],
) -> Result<ContractionClasses> {
    if has_repeats(cinds) {
        return Err(TensorError::label_mismatch(
            operation,
            format!(
                "output labels \"{}\" contain a repeat",
                indices_to_string(cinds)
            ),
        ));
    }
    if has_repeats(ainds) || has_repeats(binds) {
        return Err(TensorError::label_mismatch(
            operation,
            "input labels must be reduced before classification",
        ));
    }

    let mut classes = ContractionClasses {
        external_a: Indices::new(),
        external_b: Indices::new(),
        hadamard: Indices::new(),
        contracted: Indices::new(),
    };

    for &l in cinds {
        let in_a = ainds.contains(&l);
        let in_b = binds.contains(&l);
        match (in_a, in_b) {
            (true, true) => classes.hadamard.push(l),
            (true, false) => classes.external_a.push(l),
            (false, true) => classes.external_b.push(l),
            (false, false) => {
                return Err(TensorError::label_mismatch(
                    operation,
                    format!("output label '{}' appears on neither input", l),
                ));
            }
        }
    }

    for &l in ainds {
        if !cinds.contains(&l) {
            if binds.contains(&l) {
                classes.contracted.push(l);
            } else {
                return Err(TensorError::label_mismatch(
                    operation,
                    format!("label '{}' appears only on the left input", l),
                ));
            }
        }
    }
    for &l in binds {
        if !cinds.contains(&l) && !ainds.contains(&l) {
            return Err(TensorError::label_mismatch(
                operation,
                format!("label '{}' appears only on the right input", l),
            ));
        }
    }

    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inds(s: &str) -> Indices {
        parse_indices(s)
    }

    #[test]
    fn test_parse_and_format_roundtrip() {
        let i = inds("ikl");
        assert_eq!(indices_to_string(&i), "ikl");
    }

    #[test]
    fn test_unique_labels_and_repeats() {
        assert_eq!(unique_labels(&inds("iji")).as_slice(), &['i', 'j']);
        assert!(has_repeats(&inds("ii")));
        assert!(!has_repeats(&inds("ij")));
    }

    #[test]
    fn test_kept_labels_drops_trace_and_unilateral() {
        // "iij" against output "j" and no other operand: i is traced away
        let kept = kept_labels(&inds("iij"), &[&inds("j")]);
        assert_eq!(kept.as_slice(), &['j']);

        // diagonal: repeated label kept once when the output retains it
        let kept = kept_labels(&inds("iij"), &[&inds("ij")]);
        assert_eq!(kept.as_slice(), &['i', 'j']);
    }

    #[test]
    fn test_extent_map_matmul() {
        let a = inds("ik");
        let b = inds("kj");
        let map = extent_map("contract", &[(&a, &[2, 4]), (&b, &[4, 3])]).unwrap();
        assert_eq!(map[&'i'], 2);
        assert_eq!(map[&'k'], 4);
        assert_eq!(map[&'j'], 3);
    }

    #[test]
    fn test_extent_map_inconsistent() {
        let a = inds("ik");
        let b = inds("kj");
        let err = extent_map("contract", &[(&a, &[2, 4]), (&b, &[5, 3])]).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_extent_map_rank_disagreement() {
        let a = inds("ijk");
        let err = extent_map("permute", &[(&a, &[2, 3])]).unwrap_err();
        assert!(matches!(err, TensorError::LabelMismatch { .. }));
    }

    #[test]
    fn test_permutation_between_transpose() {
        let perm = permutation_between("permute", &inds("ij"), &inds("ji")).unwrap();
        assert_eq!(perm, vec![1, 0]);

        let perm = permutation_between("permute", &inds("kij"), &inds("ijk")).unwrap();
        assert_eq!(perm, vec![2, 0, 1]);
    }

    #[test]
    fn test_permutation_between_rejects_non_permutation() {
        assert!(permutation_between("permute", &inds("ij"), &inds("ik")).is_err());
        assert!(permutation_between("permute", &inds("ii"), &inds("ii")).is_err());
        assert!(permutation_between("permute", &inds("ij"), &inds("ijk")).is_err());
    }

    #[test]
    fn test_classify_matmul() {
        let c = classify_contraction("contract", &inds("ij"), &inds("ik"), &inds("kj")).unwrap();
        assert_eq!(c.external_a.as_slice(), &['i']);
        assert_eq!(c.external_b.as_slice(), &['j']);
        assert!(c.hadamard.is_empty());
        assert_eq!(c.contracted.as_slice(), &['k']);
    }

    #[test]
    fn test_classify_hadamard() {
        let c = classify_contraction("contract", &inds("ij"), &inds("ij"), &inds("ij")).unwrap();
        assert_eq!(c.hadamard.as_slice(), &['i', 'j']);
        assert!(c.contracted.is_empty());
    }

    #[test]
    fn test_classify_outer() {
        let c = classify_contraction("contract", &inds("ij"), &inds("i"), &inds("j")).unwrap();
        assert_eq!(c.external_a.as_slice(), &['i']);
        assert_eq!(c.external_b.as_slice(), &['j']);
        assert!(c.contracted.is_empty());
    }

    #[test]
    fn test_classify_dot() {
        let c = classify_contraction("contract", &inds(""), &inds("ij"), &inds("ij")).unwrap();
        assert_eq!(c.contracted.as_slice(), &['i', 'j']);
        assert!(c.external_a.is_empty());
        assert!(c.external_b.is_empty());
    }

    #[test]
    fn test_classify_rejects_orphan_output_label() {
        let err =
            classify_contraction("contract", &inds("iz"), &inds("ik"), &inds("kj")).unwrap_err();
        assert!(matches!(err, TensorError::LabelMismatch { .. }));
    }

    #[test]
    fn test_classify_rejects_unreduced_input() {
        let err =
            classify_contraction("contract", &inds("j"), &inds("iij"), &inds("j")).unwrap_err();
        assert!(matches!(err, TensorError::LabelMismatch { .. }));
    }
}
