//! Cost model for pairwise contraction steps.
//!
//! One pair-step contracting tensors with label sets `L` and `R` touches
//! every distinct label of `L ∪ R`: the externals it must produce plus the
//! labels it sums over. Its arithmetic cost is the product of those extents.
//! Its memory cost is the size of the intermediate it produces, the product
//! of the step's external extents. The planner minimizes total arithmetic
//! cost, breaking ties by the peak intermediate size.

use std::collections::HashMap;
use tensal_core::{Label, Result, TensorError};

/// Arithmetic cost of one pair-step: the product of the extents of all
/// distinct labels appearing on either side.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use tensal_planner::cost::pair_flops;
///
/// let extents: HashMap<char, usize> =
///     [('i', 10), ('j', 20), ('k', 30)].into_iter().collect();
///
/// // Matrix multiply ij,jk: every output element needs a j-length sum.
/// let flops = pair_flops(&['i', 'j'], &['j', 'k'], &extents).unwrap();
/// assert_eq!(flops, 6000.0);
/// ```
pub fn pair_flops(
    left: &[Label],
    right: &[Label],
    extents: &HashMap<Label, usize>,
) -> Result<f64> {
    let mut flops = 1.0;
    let mut seen = Vec::new();
    for &l in left.iter().chain(right.iter()) {
        if !seen.contains(&l) {
            seen.push(l);
            flops *= lookup(l, extents)? as f64;
        }
    }
    Ok(flops)
}

/// Size in elements of an intermediate with the given external labels.
pub fn external_size(external: &[Label], extents: &HashMap<Label, usize>) -> Result<usize> {
    let mut size = 1usize;
    for &l in external {
        size = size.saturating_mul(lookup(l, extents)?);
    }
    Ok(size)
}

fn lookup(l: Label, extents: &HashMap<Label, usize>) -> Result<usize> {
    extents
        .get(&l)
        .copied()
        .ok_or_else(|| TensorError::planning_failure(format!("no extent known for label '{}'", l)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extents() -> HashMap<Label, usize> {
        [('i', 2), ('j', 3), ('k', 4), ('l', 5)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_pair_flops_matmul() {
        let flops = pair_flops(&['i', 'j'], &['j', 'k'], &extents()).unwrap();
        assert_eq!(flops, 24.0);
    }

    #[test]
    fn test_pair_flops_counts_shared_labels_once() {
        let flops = pair_flops(&['i', 'j'], &['i', 'j'], &extents()).unwrap();
        assert_eq!(flops, 6.0);
    }

    #[test]
    fn test_pair_flops_outer() {
        let flops = pair_flops(&['i'], &['l'], &extents()).unwrap();
        assert_eq!(flops, 10.0);
    }

    #[test]
    fn test_external_size() {
        assert_eq!(external_size(&['i', 'k'], &extents()).unwrap(), 8);
        assert_eq!(external_size(&[], &extents()).unwrap(), 1);
    }

    #[test]
    fn test_unknown_label_fails() {
        let err = pair_flops(&['z'], &[], &extents()).unwrap_err();
        assert!(matches!(err, TensorError::PlanningFailure { .. }));
    }
}
