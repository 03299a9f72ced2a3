//! # tensal-core
//!
//! Core tensor handle, dense storage, and label algebra for tensal.
//!
//! This crate provides the foundational building blocks of the stack:
//!
//! - **Dense in-core storage** ([`DenseData`]): contiguous row-major doubles
//!   of arbitrary rank, with elementwise operations, norms, and raw buffer
//!   access
//! - **Tensor handle** ([`Tensor`]): a reference-counted handle to
//!   backend-owned storage with a diagnostic name and a shape; equality is
//!   storage identity
//! - **Backend selection** ([`BackendKind`]): in-core, disk, distributed, or
//!   agnostic; only in-core carries data in this build, the others are
//!   pluggable implementations of the same contract
//! - **Label algebra** ([`labels`]): classification and validation of index
//!   labels for contractions and permutations
//! - **Errors** ([`TensorError`]): one structured variant per failure
//!   category, detected eagerly before any storage is written
//!
//! ## Quick Start
//!
//! ```
//! use tensal_core::{BackendKind, Tensor};
//!
//! let a = Tensor::build(BackendKind::Core, "A", &[2, 3]).unwrap();
//! assert_eq!(a.rank(), 2);
//!
//! // In-core tensors expose their raw row-major buffer.
//! a.data_mut().unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(a.norm(1.0).unwrap(), 21.0);
//! ```
//!
//! The index-labeled kernels (permute, contract, slice) live in
//! `tensal-kernels`; the expression algebra and its lowering live in
//! `tensal-exec`.

#![deny(warnings)]

pub mod dense;
pub mod error;
pub mod labels;
pub mod tensor;
pub mod types;


pub use dense::DenseData;
pub use error::{Result, TensorError};
pub use tensor::{StorageRepr, Tensor};
pub use types::{BackendKind, IndexRange, Indices, Label, Rank, Shape};
