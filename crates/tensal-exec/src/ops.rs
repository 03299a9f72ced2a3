//! Kernel-backed operations on tensor handles.
//!
//! [`TensorOps`] extends [`Tensor`] with the labeled primitives (`contract`,
//! `permute`, `slice_assign`) and the constructors of the expression algebra
//! (`ix` for labels, `block` for slices). Aliasing between the target and an
//! input is detected by handle identity and resolved by snapshotting the
//! input, so `c.permute(&c, "ij", "ji", ...)` is well defined.

use crate::expr::LabeledTensor;
use std::ops::{Mul, Neg};
use tensal_core::labels::parse_indices;
use tensal_core::{DenseData, IndexRange, Result, Tensor};
use tensal_kernels as kernels;

/// Labeled and sliced operations on a tensor handle.
pub trait TensorOps {
    /// Label this tensor for the expression algebra: `a.ix("ik")`.
    fn ix(&self, indices: &str) -> LabeledTensor;

    /// Select a hyper-rectangle for sliced assignment:
    /// `a.block(&[(0, 2), (0, 2)])`.
    fn block(&self, ranges: &[(usize, usize)]) -> SlicedTensor;

    /// `self(Cinds) <- alpha * A(Ainds) * B(Binds) + beta * self(Cinds)`.
    #[allow(clippy::too_many_arguments)]
    fn contract(
        &self,
        a: &Tensor,
        b: &Tensor,
        cinds: &str,
        ainds: &str,
        binds: &str,
        alpha: f64,
        beta: f64,
    ) -> Result<()>;

    /// `self(Cinds) <- alpha * A(Ainds) + beta * self(Cinds)`.
    fn permute(&self, a: &Tensor, cinds: &str, ainds: &str, alpha: f64, beta: f64) -> Result<()>;

    /// `self[Cranges] <- alpha * A[Aranges] + beta * self[Cranges]`.
    fn slice_assign(
        &self,
        a: &Tensor,
        cranges: &[(usize, usize)],
        aranges: &[(usize, usize)],
        alpha: f64,
        beta: f64,
    ) -> Result<()>;
}

impl TensorOps for Tensor {
    fn ix(&self, indices: &str) -> LabeledTensor {
        LabeledTensor::new(self, indices)
    }

    fn block(&self, ranges: &[(usize, usize)]) -> SlicedTensor {
        SlicedTensor::new(self, ranges)
    }

    fn contract(
        &self,
        a: &Tensor,
        b: &Tensor,
        cinds: &str,
        ainds: &str,
        binds: &str,
        alpha: f64,
        beta: f64,
    ) -> Result<()> {
        let ci = parse_indices(cinds);
        let ai = parse_indices(ainds);
        let bi = parse_indices(binds);

        let a_owned: Option<DenseData> = if self.same_storage(a) {
            Some(a.dense()?.clone())
        } else {
            None
        };
        let b_owned: Option<DenseData> = if self.same_storage(b) {
            Some(b.dense()?.clone())
        } else {
            None
        };
        let a_guard;
        let a_ref: &DenseData = match &a_owned {
            Some(data) => data,
            None => {
                a_guard = a.dense()?;
                &a_guard
            }
        };
        let b_guard;
        let b_ref: &DenseData = match &b_owned {
            Some(data) => data,
            None => {
                b_guard = b.dense()?;
                &b_guard
            }
        };

        let mut c = self.dense_mut()?;
        kernels::contract(&mut c, a_ref, b_ref, &ci, &ai, &bi, alpha, beta)
    }

    fn permute(&self, a: &Tensor, cinds: &str, ainds: &str, alpha: f64, beta: f64) -> Result<()> {
        let ci = parse_indices(cinds);
        let ai = parse_indices(ainds);

        let a_owned: Option<DenseData> = if self.same_storage(a) {
            Some(a.dense()?.clone())
        } else {
            None
        };
        let a_guard;
        let a_ref: &DenseData = match &a_owned {
            Some(data) => data,
            None => {
                a_guard = a.dense()?;
                &a_guard
            }
        };

        let mut c = self.dense_mut()?;
        kernels::permute(&mut c, a_ref, &ci, &ai, alpha, beta)
    }

    fn slice_assign(
        &self,
        a: &Tensor,
        cranges: &[(usize, usize)],
        aranges: &[(usize, usize)],
        alpha: f64,
        beta: f64,
    ) -> Result<()> {
        let a_owned: Option<DenseData> = if self.same_storage(a) {
            Some(a.dense()?.clone())
        } else {
            None
        };
        let a_guard;
        let a_ref: &DenseData = match &a_owned {
            Some(data) => data,
            None => {
                a_guard = a.dense()?;
                &a_guard
            }
        };

        let mut c = self.dense_mut()?;
        kernels::slice(&mut c, a_ref, cranges, aranges, alpha, beta)
    }
}

/// A tensor paired with a hyper-rectangle selection and a scalar factor.
///
/// Built with [`TensorOps::block`]; assignment between two sliced tensors
/// dispatches the slice kernel. Slicing into overlapping regions of one
/// tensor is resolved by snapshotting the source first.
#[derive(Clone, Debug)]
pub struct SlicedTensor {
    tensor: Tensor,
    range: IndexRange,
    factor: f64,
}

impl SlicedTensor {
    /// Select `ranges` (one half-open interval per axis) of a tensor.
    pub fn new(tensor: &Tensor, ranges: &[(usize, usize)]) -> Self {
        Self {
            tensor: tensor.clone(),
            range: ranges.to_vec(),
            factor: 1.0,
        }
    }

    /// The underlying tensor handle.
    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    /// The selected ranges.
    pub fn range(&self) -> &IndexRange {
        &self.range
    }

    /// The accumulated scalar factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// `target_block = alpha * source_block`.
    pub fn assign(&self, rhs: &SlicedTensor) -> Result<()> {
        self.apply(rhs, 1.0, 0.0)
    }

    /// `target_block += alpha * source_block`.
    pub fn add_assign(&self, rhs: &SlicedTensor) -> Result<()> {
        self.apply(rhs, 1.0, 1.0)
    }

    /// `target_block -= alpha * source_block`.
    pub fn sub_assign(&self, rhs: &SlicedTensor) -> Result<()> {
        self.apply(rhs, -1.0, 1.0)
    }

    fn apply(&self, rhs: &SlicedTensor, sign: f64, beta: f64) -> Result<()> {
        let alpha = rhs.factor * sign;

        let src_owned: Option<DenseData> = if self.tensor.same_storage(&rhs.tensor) {
            Some(rhs.tensor.dense()?.clone())
        } else {
            None
        };
        let src_guard;
        let src: &DenseData = match &src_owned {
            Some(data) => data,
            None => {
                src_guard = rhs.tensor.dense()?;
                &src_guard
            }
        };

        let mut dst = self.tensor.dense_mut()?;
        kernels::slice(&mut dst, src, &self.range, &rhs.range, alpha, beta)
    }
}

impl Mul<f64> for SlicedTensor {
    type Output = SlicedTensor;

    fn mul(mut self, scalar: f64) -> SlicedTensor {
        self.factor *= scalar;
        self
    }
}

impl Mul<SlicedTensor> for f64 {
    type Output = SlicedTensor;

    fn mul(self, st: SlicedTensor) -> SlicedTensor {
        st * self
    }
}

impl Neg for SlicedTensor {
    type Output = SlicedTensor;

    fn neg(self) -> SlicedTensor {
        self * -1.0
    }
}
