//! In-core dense storage.
//!
//! [`DenseData`] is a contiguous row-major block of `f64` with a dynamic
//! rank, backed by ndarray. The right-most index varies fastest; element
//! `(i0, ..., i_{r-1})` lives at offset `sum_k i_k * prod_{j>k} n_j`. All
//! constructors produce standard layout, and every operation preserves it, so
//! the raw buffer accessors are always valid.
//!
//! Elementwise operations (zero, scale, copy, pointwise, norms, dot) live
//! here; the index-labeled kernels (permute, contract, slice) operate on
//! `DenseData` from the kernels crate.

use crate::error::{Result, TensorError};
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, IxDyn, Zip};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Contiguous row-major dense block of doubles with a dynamic rank.
///
/// # Examples
///
/// ```
/// use tensal_core::DenseData;
///
/// let block = DenseData::zeros(&[2, 3, 4]);
/// assert_eq!(block.rank(), 3);
/// assert_eq!(block.numel(), 24);
/// ```
#[derive(Clone, PartialEq)]
pub struct DenseData {
    data: ArrayD<f64>,
}

impl DenseData {
    /// Create a zero-filled block with the given shape.
    ///
    /// Rank 0 (`&[]`) is a scalar holding one element.
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
        }
    }

    /// Create a zero-filled block, failing instead of aborting when the
    /// element count overflows the address space.
    pub fn try_zeros(operation: &str, shape: &[usize]) -> Result<Self> {
        let mut numel: usize = 1;
        for &extent in shape {
            numel = numel
                .checked_mul(extent)
                .ok_or_else(|| TensorError::allocation_failure(operation, shape))?;
        }
        // A dense f64 block this size cannot be addressed either.
        if numel
            .checked_mul(std::mem::size_of::<f64>())
            .is_none()
        {
            return Err(TensorError::allocation_failure(operation, shape));
        }
        Ok(Self::zeros(shape))
    }

    /// Create a block filled with one value.
    pub fn from_elem(shape: &[usize], value: f64) -> Self {
        Self {
            data: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    /// Create a block from flat row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ShapeMismatch`] if the vector length does not
    /// equal the product of the extents.
    ///
    /// # Examples
    ///
    /// ```
    /// use tensal_core::DenseData;
    ///
    /// let m = DenseData::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(m[&[0, 1]], 2.0);
    /// assert_eq!(m[&[1, 0]], 3.0);
    /// ```
    pub fn from_vec(vec: Vec<f64>, shape: &[usize]) -> Result<Self> {
        let total: usize = shape.iter().product();
        if vec.len() != total {
            return Err(TensorError::shape_mismatch(
                "from_vec",
                vec![total],
                vec![vec.len()],
                format!("shape {:?} does not match the data length", shape),
            ));
        }
        let data = ArrayD::from_shape_vec(IxDyn(shape), vec).map_err(|e| {
            TensorError::shape_mismatch("from_vec", shape.to_vec(), vec![], e.to_string())
        })?;
        Ok(Self { data })
    }

    /// Wrap an existing ndarray, normalizing to standard layout if needed.
    pub fn from_array(array: ArrayD<f64>) -> Self {
        let data = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        Self { data }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Extent of each dimension.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of elements (1 for rank 0).
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Immutable view of the underlying array.
    pub fn view(&self) -> ArrayViewD<'_, f64> {
        self.data.view()
    }

    /// Mutable view of the underlying array.
    pub fn view_mut(&mut self) -> ArrayViewMutD<'_, f64> {
        self.data.view_mut()
    }

    /// Raw row-major element buffer.
    pub fn data(&self) -> &[f64] {
        // Standard layout is a constructor invariant.
        self.data.as_slice().expect("dense storage is contiguous")
    }

    /// Raw row-major element buffer, mutable.
    pub fn data_mut(&mut self) -> &mut [f64] {
        self.data
            .as_slice_mut()
            .expect("dense storage is contiguous")
    }

    /// Set every element to zero.
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Multiply every element by `alpha`.
    pub fn scale(&mut self, alpha: f64) {
        self.data.mapv_inplace(|x| alpha * x);
    }

    /// Overwrite with `alpha * other`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ShapeMismatch`] if the shapes differ.
    pub fn copy_from(&mut self, other: &DenseData, alpha: f64) -> Result<()> {
        self.check_same_shape("copy", other)?;
        Zip::from(&mut self.data)
            .and(&other.data)
            .for_each(|c, &x| *c = alpha * x);
        Ok(())
    }

    /// Accumulate `alpha * other` into self.
    pub fn scale_and_add(&mut self, alpha: f64, other: &DenseData) -> Result<()> {
        self.check_same_shape("scale_and_add", other)?;
        Zip::from(&mut self.data)
            .and(&other.data)
            .for_each(|c, &x| *c += alpha * x);
        Ok(())
    }

    /// Elementwise multiply by `other`.
    pub fn pointwise_multiply(&mut self, other: &DenseData) -> Result<()> {
        self.check_same_shape("pointwise_multiply", other)?;
        Zip::from(&mut self.data)
            .and(&other.data)
            .for_each(|c, &x| *c *= x);
        Ok(())
    }

    /// Elementwise divide by `other`. Division by zero follows IEEE 754.
    pub fn pointwise_divide(&mut self, other: &DenseData) -> Result<()> {
        self.check_same_shape("pointwise_divide", other)?;
        Zip::from(&mut self.data)
            .and(&other.data)
            .for_each(|c, &x| *c /= x);
        Ok(())
    }

    /// p-norm of the element buffer.
    ///
    /// `p = 0` gives the max-abs norm, `p = 1` the sum of absolute values,
    /// `p = 2` the Frobenius norm, and any other `p` the general
    /// `(sum |x|^p)^(1/p)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tensal_core::DenseData;
    ///
    /// let v = DenseData::from_vec(vec![3.0, -4.0], &[2]).unwrap();
    /// assert_eq!(v.norm(0.0), 4.0);
    /// assert_eq!(v.norm(1.0), 7.0);
    /// assert!((v.norm(2.0) - 5.0).abs() < 1e-12);
    /// ```
    pub fn norm(&self, p: f64) -> f64 {
        if p == 0.0 {
            self.data.iter().fold(0.0, |acc, &x| acc.max(x.abs()))
        } else if p == 1.0 {
            self.data.iter().map(|&x| x.abs()).sum()
        } else if p == 2.0 {
            self.data.iter().map(|&x| x * x).sum::<f64>().sqrt()
        } else {
            self.data
                .iter()
                .map(|&x| x.abs().powf(p))
                .sum::<f64>()
                .powf(1.0 / p)
        }
    }

    /// Inner product with `other`.
    pub fn dot(&self, other: &DenseData) -> Result<f64> {
        self.check_same_shape("dot", other)?;
        let mut sum = 0.0;
        Zip::from(&self.data)
            .and(&other.data)
            .for_each(|&x, &y| sum += x * y);
        Ok(sum)
    }

    fn check_same_shape(&self, operation: &str, other: &DenseData) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(TensorError::shape_mismatch(
                operation,
                self.shape().to_vec(),
                other.shape().to_vec(),
                "operands must share one shape",
            ));
        }
        Ok(())
    }
}

impl Index<&[usize]> for DenseData {
    type Output = f64;

    fn index(&self, coord: &[usize]) -> &f64 {
        &self.data[coord]
    }
}

impl IndexMut<&[usize]> for DenseData {
    fn index_mut(&mut self, coord: &[usize]) -> &mut f64 {
        &mut self.data[coord]
    }
}

impl fmt::Debug for DenseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseData")
            .field("shape", &self.shape())
            .field("numel", &self.numel())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_reflectors() {
        let d = DenseData::zeros(&[2, 3, 4]);
        assert_eq!(d.rank(), 3);
        assert_eq!(d.shape(), &[2, 3, 4]);
        assert_eq!(d.numel(), 24);
        assert!(d.data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_rank_zero_scalar() {
        let mut s = DenseData::zeros(&[]);
        assert_eq!(s.rank(), 0);
        assert_eq!(s.numel(), 1);
        s.data_mut()[0] = 7.5;
        assert_eq!(s.data()[0], 7.5);
    }

    #[test]
    fn test_row_major_layout() {
        // Offset of (i, j, k) in a (2, 3, 4) block is i*12 + j*4 + k.
        let d = DenseData::from_vec((0..24).map(|x| x as f64).collect(), &[2, 3, 4]).unwrap();
        assert_eq!(d[&[0, 0, 1]], 1.0);
        assert_eq!(d[&[0, 1, 0]], 4.0);
        assert_eq!(d[&[1, 0, 0]], 12.0);
        assert_eq!(d[&[1, 2, 3]], 23.0);
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let err = DenseData::from_vec(vec![1.0, 2.0, 3.0], &[2, 2]).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_try_zeros_overflow() {
        let err = DenseData::try_zeros("build", &[usize::MAX, 2]).unwrap_err();
        assert!(matches!(err, TensorError::AllocationFailure { .. }));
    }

    #[test]
    fn test_zero_scale_copy() {
        let mut a = DenseData::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        a.scale(2.0);
        assert_eq!(a.data(), &[2.0, 4.0, 6.0, 8.0]);

        let mut b = DenseData::zeros(&[2, 2]);
        b.copy_from(&a, 0.5).unwrap();
        assert_eq!(b.data(), &[1.0, 2.0, 3.0, 4.0]);

        b.zero();
        assert!(b.data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_scale_and_add() {
        let mut c = DenseData::from_vec(vec![1.0, 1.0], &[2]).unwrap();
        let x = DenseData::from_vec(vec![2.0, 3.0], &[2]).unwrap();
        c.scale_and_add(2.0, &x).unwrap();
        assert_eq!(c.data(), &[5.0, 7.0]);
    }

    #[test]
    fn test_pointwise_ops() {
        let mut c = DenseData::from_vec(vec![2.0, 6.0], &[2]).unwrap();
        let x = DenseData::from_vec(vec![2.0, 3.0], &[2]).unwrap();
        c.pointwise_multiply(&x).unwrap();
        assert_eq!(c.data(), &[4.0, 18.0]);
        c.pointwise_divide(&x).unwrap();
        assert_eq!(c.data(), &[2.0, 6.0]);
    }

    #[test]
    fn test_pointwise_shape_mismatch() {
        let mut c = DenseData::zeros(&[2, 2]);
        let x = DenseData::zeros(&[4]);
        assert!(c.pointwise_multiply(&x).is_err());
        assert!(c.dot(&x).is_err());
    }

    #[test]
    fn test_norms() {
        let v = DenseData::from_vec(vec![1.0, -2.0, 2.0], &[3]).unwrap();
        assert_eq!(v.norm(0.0), 2.0);
        assert_eq!(v.norm(1.0), 5.0);
        assert!((v.norm(2.0) - 3.0).abs() < 1e-12);
        // General p: (1 + 8 + 8)^(1/3)
        assert!((v.norm(3.0) - 17.0_f64.powf(1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_dot_matches_norm2() {
        let v = DenseData::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let d = v.dot(&v).unwrap();
        let n = v.norm(2.0);
        assert!((d - n * n).abs() < 1e-12);
    }
}
