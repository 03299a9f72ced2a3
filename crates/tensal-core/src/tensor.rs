//! The reference-counted tensor handle.
//!
//! A [`Tensor`] is a cheap-clone handle to one block of storage plus its
//! metadata (name, backend kind, shape). Two handles are equal iff they
//! reference the same storage; dropping the last handle frees the storage.
//!
//! The core is single-threaded from the caller's perspective, so the handle
//! is `Rc<RefCell<...>>`: no internal locks are taken, and the caller owns
//! the discipline of not mutating a tensor while holding a raw-buffer
//! borrow on it.

use crate::dense::DenseData;
use crate::error::{Result, TensorError};
use crate::types::{BackendKind, Shape};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Disk-resident storage. Pluggable backend, not wired into this build.
#[derive(Clone, Debug)]
pub struct DiskResident {
    _phantom: PhantomData<()>,
}

/// Cluster-distributed storage. Pluggable backend, not wired into this build.
#[derive(Clone, Debug)]
pub struct DistResident {
    _phantom: PhantomData<()>,
}

/// Backend-owned storage behind a tensor handle.
///
/// Only `Core` carries data in this build. The other variants exist so the
/// storage contract is explicit: a future backend implements the same
/// operation set, typically by paging blocks through the in-core kernels.
#[derive(Clone, Debug)]
pub enum StorageRepr {
    /// In-core dense storage
    Core(DenseData),
    /// Disk-resident storage (unavailable in this build)
    Disk(DiskResident),
    /// Cluster-distributed storage (unavailable in this build)
    Distributed(DistResident),
}

impl StorageRepr {
    /// The in-core block, if this is in-core storage.
    pub fn as_core(&self) -> Option<&DenseData> {
        match self {
            StorageRepr::Core(d) => Some(d),
            _ => None,
        }
    }

    /// The in-core block, mutable, if this is in-core storage.
    pub fn as_core_mut(&mut self) -> Option<&mut DenseData> {
        match self {
            StorageRepr::Core(d) => Some(d),
            _ => None,
        }
    }
}

struct TensorData {
    name: String,
    kind: BackendKind,
    shape: Shape,
    storage: StorageRepr,
}

/// Reference-counted handle to a dense block of doubles with a named shape.
///
/// # Examples
///
/// ```
/// use tensal_core::{BackendKind, Tensor};
///
/// let a = Tensor::build(BackendKind::Core, "A", &[2, 3]).unwrap();
/// assert_eq!(a.rank(), 2);
/// assert_eq!(a.numel(), 6);
///
/// // Handles share storage; equality is storage identity.
/// let alias = a.clone();
/// assert_eq!(a, alias);
///
/// let b = Tensor::build(BackendKind::Core, "A", &[2, 3]).unwrap();
/// assert_ne!(a, b);
/// ```
#[derive(Clone)]
pub struct Tensor {
    inner: Rc<RefCell<TensorData>>,
}

impl Tensor {
    /// Build a tensor, eagerly allocating zeroed storage.
    ///
    /// `Agnostic` resolves to the library default backend. Building a disk or
    /// distributed tensor fails with `backend-unsupported` in this
    /// in-core-only build.
    ///
    /// # Errors
    ///
    /// [`TensorError::AllocationFailure`] if the element count overflows the
    /// address space; [`TensorError::BackendUnsupported`] for backends not
    /// compiled in.
    pub fn build(kind: BackendKind, name: impl Into<String>, dims: &[usize]) -> Result<Tensor> {
        let kind = kind.resolve();
        let storage = match kind {
            BackendKind::Core | BackendKind::Agnostic => {
                StorageRepr::Core(DenseData::try_zeros("build", dims)?)
            }
            BackendKind::Disk | BackendKind::Distributed => {
                return Err(TensorError::backend_unsupported("build", kind.to_string()));
            }
        };
        Ok(Tensor {
            inner: Rc::new(RefCell::new(TensorData {
                name: name.into(),
                kind,
                shape: Shape::from_slice(dims),
                storage,
            })),
        })
    }

    /// Build a tensor with the name and shape of another.
    pub fn build_like(kind: BackendKind, other: &Tensor) -> Result<Tensor> {
        Tensor::build(kind, other.name(), &other.shape())
    }

    /// Wrap an existing dense block as an in-core tensor.
    ///
    /// # Examples
    ///
    /// ```
    /// use tensal_core::{DenseData, Tensor};
    ///
    /// let block = DenseData::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// let a = Tensor::from_dense("A", block);
    /// assert_eq!(a.shape().as_slice(), &[2, 2]);
    /// ```
    pub fn from_dense(name: impl Into<String>, data: DenseData) -> Tensor {
        let shape = Shape::from_slice(data.shape());
        Tensor {
            inner: Rc::new(RefCell::new(TensorData {
                name: name.into(),
                kind: BackendKind::Core,
                shape,
                storage: StorageRepr::Core(data),
            })),
        }
    }

    /// Diagnostic name.
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Storage policy of this handle.
    pub fn kind(&self) -> BackendKind {
        self.inner.borrow().kind
    }

    /// Ordered extents.
    pub fn shape(&self) -> Shape {
        self.inner.borrow().shape.clone()
    }

    /// Extent of one axis.
    pub fn dim(&self, axis: usize) -> usize {
        self.inner.borrow().shape[axis]
    }

    /// Number of dimensions; 0 is a scalar.
    pub fn rank(&self) -> usize {
        self.inner.borrow().shape.len()
    }

    /// Total element count (product of extents).
    pub fn numel(&self) -> usize {
        self.inner.borrow().shape.iter().product()
    }

    /// Whether two handles reference the same storage.
    pub fn same_storage(&self, other: &Tensor) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Borrow the in-core block.
    ///
    /// # Errors
    ///
    /// [`TensorError::BackendUnsupported`] for non-in-core storage.
    pub fn dense(&self) -> Result<Ref<'_, DenseData>> {
        let kind = self.kind();
        Ref::filter_map(self.inner.borrow(), |t| t.storage.as_core())
            .map_err(|_| TensorError::backend_unsupported("dense", kind.to_string()))
    }

    /// Borrow the in-core block mutably.
    pub fn dense_mut(&self) -> Result<RefMut<'_, DenseData>> {
        let kind = self.kind();
        RefMut::filter_map(self.inner.borrow_mut(), |t| t.storage.as_core_mut())
            .map_err(|_| TensorError::backend_unsupported("dense", kind.to_string()))
    }

    /// Raw row-major element buffer. In-core tensors only.
    ///
    /// The returned guard borrows the storage; mutating operations on any
    /// handle to the same storage must wait until it is dropped.
    pub fn data(&self) -> Result<Ref<'_, [f64]>> {
        let kind = self.kind();
        Ref::filter_map(self.inner.borrow(), |t| {
            t.storage.as_core().map(|d| d.data())
        })
        .map_err(|_| TensorError::backend_unsupported("data", kind.to_string()))
    }

    /// Raw row-major element buffer, mutable. In-core tensors only.
    pub fn data_mut(&self) -> Result<RefMut<'_, [f64]>> {
        let kind = self.kind();
        RefMut::filter_map(self.inner.borrow_mut(), |t| {
            t.storage.as_core_mut().map(|d| d.data_mut())
        })
        .map_err(|_| TensorError::backend_unsupported("data", kind.to_string()))
    }

    /// Set every element to zero.
    pub fn zero(&self) -> Result<()> {
        self.dense_mut().map(|mut d| d.zero())
    }

    /// Multiply every element by `alpha`.
    pub fn scale(&self, alpha: f64) -> Result<()> {
        self.dense_mut().map(|mut d| d.scale(alpha))
    }

    /// Overwrite with `alpha * other`.
    pub fn copy_from(&self, other: &Tensor, alpha: f64) -> Result<()> {
        if self.same_storage(other) {
            return self.scale(alpha);
        }
        let src = other.dense()?;
        self.dense_mut()?.copy_from(&src, alpha)
    }

    /// Accumulate `alpha * x`, i.e. `self += alpha * x`.
    pub fn scale_and_add(&self, alpha: f64, x: &Tensor) -> Result<()> {
        if self.same_storage(x) {
            return self.scale(1.0 + alpha);
        }
        let src = x.dense()?;
        self.dense_mut()?.scale_and_add(alpha, &src)
    }

    /// Elementwise multiply, i.e. `self *= x`.
    pub fn pointwise_multiply(&self, x: &Tensor) -> Result<()> {
        if self.same_storage(x) {
            let copy = self.dense()?.clone();
            return self.dense_mut()?.pointwise_multiply(&copy);
        }
        let src = x.dense()?;
        self.dense_mut()?.pointwise_multiply(&src)
    }

    /// Elementwise divide, i.e. `self /= x`.
    pub fn pointwise_divide(&self, x: &Tensor) -> Result<()> {
        if self.same_storage(x) {
            let copy = self.dense()?.clone();
            return self.dense_mut()?.pointwise_divide(&copy);
        }
        let src = x.dense()?;
        self.dense_mut()?.pointwise_divide(&src)
    }

    /// p-norm of the elements (see [`DenseData::norm`]).
    pub fn norm(&self, p: f64) -> Result<f64> {
        self.dense().map(|d| d.norm(p))
    }

    /// Inner product with `x`.
    pub fn dot(&self, x: &Tensor) -> Result<f64> {
        let a = self.dense()?;
        if self.same_storage(x) {
            return a.dot(&a);
        }
        let b = x.dense()?;
        a.dot(&b)
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Tensor) -> bool {
        self.same_storage(other)
    }
}

impl Eq for Tensor {}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.inner.borrow();
        f.debug_struct("Tensor")
            .field("name", &t.name)
            .field("kind", &t.kind)
            .field("shape", &t.shape)
            .finish()
    }
}
