//! Per-pair primitive selection.
//!
//! Given the (reduced) labelings of one pair-step and its required output,
//! pick the cheapest primitive able to execute it. The lowerer dispatches on
//! the result; the predicates are also useful on their own for inspecting a
//! plan.

use tensal_core::Label;

/// The primitive a pair-step dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PairPrimitive {
    /// Unary step: output labels equal input labels, a permute suffices
    Permute,
    /// One side is a scalar: scale-and-add on the other
    ScaleAdd,
    /// No contracted and no Hadamard labels: outer product (GEMM with an
    /// empty inner dimension)
    OuterProduct,
    /// Both sides rank 2, output rank 2, no Hadamard labels: GEMM after at
    /// most transposition flags
    DirectGemm,
    /// The general Hadamard-batched transpose-transpose-GEMM path
    BatchedGemm,
}

/// Select the primitive for a pair-step.
///
/// `binds` is `None` for a unary step (a product of length one). Labelings
/// are expected in reduced form, as handed to the kernels.
///
/// # Examples
///
/// ```
/// use tensal_planner::{select_primitive, PairPrimitive};
///
/// let a: Vec<char> = "ik".chars().collect();
/// let b: Vec<char> = "kj".chars().collect();
/// let c: Vec<char> = "ij".chars().collect();
/// assert_eq!(select_primitive(&a, Some(&b), &c), PairPrimitive::DirectGemm);
/// ```
pub fn select_primitive(
    ainds: &[Label],
    binds: Option<&[Label]>,
    cinds: &[Label],
) -> PairPrimitive {
    let Some(binds) = binds else {
        return PairPrimitive::Permute;
    };

    if ainds.is_empty() || binds.is_empty() {
        return PairPrimitive::ScaleAdd;
    }

    let contracted = ainds
        .iter()
        .any(|l| binds.contains(l) && !cinds.contains(l));
    let hadamard = ainds
        .iter()
        .any(|l| binds.contains(l) && cinds.contains(l));

    if !contracted && !hadamard {
        return PairPrimitive::OuterProduct;
    }

    if !hadamard && ainds.len() == 2 && binds.len() == 2 && cinds.len() == 2 {
        return PairPrimitive::DirectGemm;
    }

    PairPrimitive::BatchedGemm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(s: &str) -> Vec<Label> {
        s.chars().collect()
    }

    #[test]
    fn test_unary_is_permute() {
        assert_eq!(select_primitive(&l("ij"), None, &l("ji")), PairPrimitive::Permute);
    }

    #[test]
    fn test_scalar_side_is_scale_add() {
        assert_eq!(
            select_primitive(&l(""), Some(&l("ij")), &l("ij")),
            PairPrimitive::ScaleAdd
        );
        assert_eq!(
            select_primitive(&l("ij"), Some(&l("")), &l("ij")),
            PairPrimitive::ScaleAdd
        );
    }

    #[test]
    fn test_outer_product() {
        assert_eq!(
            select_primitive(&l("i"), Some(&l("j")), &l("ij")),
            PairPrimitive::OuterProduct
        );
    }

    #[test]
    fn test_direct_gemm() {
        assert_eq!(
            select_primitive(&l("ik"), Some(&l("kj")), &l("ij")),
            PairPrimitive::DirectGemm
        );
        // Transposed variants still qualify
        assert_eq!(
            select_primitive(&l("ki"), Some(&l("jk")), &l("ji")),
            PairPrimitive::DirectGemm
        );
    }

    #[test]
    fn test_dot_product_is_batched() {
        // Scalar output with everything contracted has no 2x2x2 shape.
        assert_eq!(
            select_primitive(&l("ij"), Some(&l("ij")), &l("")),
            PairPrimitive::BatchedGemm
        );
    }

    #[test]
    fn test_hadamard_is_batched() {
        assert_eq!(
            select_primitive(&l("ij"), Some(&l("ij")), &l("ij")),
            PairPrimitive::BatchedGemm
        );
        assert_eq!(
            select_primitive(&l("hik"), Some(&l("hkj")), &l("hij")),
            PairPrimitive::BatchedGemm
        );
    }

    #[test]
    fn test_higher_rank_is_batched() {
        assert_eq!(
            select_primitive(&l("ijk"), Some(&l("kl")), &l("ijl")),
            PairPrimitive::BatchedGemm
        );
    }
}
