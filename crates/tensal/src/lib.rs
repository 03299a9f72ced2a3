//! # tensal
//!
//! Multilinear algebra over dense, real-valued tensors of arbitrary rank,
//! written in near-mathematical notation. Labeled index expressions such as
//! `C("ij") += 0.5 * A("ik") * B("jk")` are captured as deferred trees,
//! rewritten into a minimal sequence of primitive kernels (contract,
//! permute, scale, slice), and executed against reference-counted storage.
//!
//! This is the meta crate re-exporting the tensal stack:
//!
//! - [`core`](tensal_core) - tensor handle, dense storage, label algebra,
//!   error types
//! - [`kernels`](tensal_kernels) - permute / contract / slice primitives
//!   with GEMM dispatch
//! - [`planner`](tensal_planner) - pairwise contraction ordering and
//!   primitive selection
//! - [`exec`](tensal_exec) - the expression algebra and assignment lowering
//!
//! ## Quick Start
//!
//! ```
//! use tensal::prelude::*;
//!
//! let a = Tensor::build(BackendKind::Core, "A", &[2, 2]).unwrap();
//! let b = Tensor::build(BackendKind::Core, "B", &[2, 2]).unwrap();
//! let c = Tensor::build(BackendKind::Core, "C", &[2, 2]).unwrap();
//! a.data_mut().unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
//! b.data_mut().unwrap().copy_from_slice(&[5.0, 6.0, 7.0, 8.0]);
//!
//! // C("ij") = A("ik") * B("kj")
//! c.ix("ij").assign(a.ix("ik") * b.ix("kj")).unwrap();
//! assert_eq!(&*c.data().unwrap(), &[19.0, 22.0, 43.0, 50.0]);
//!
//! // s() = A("ii")
//! let s = Tensor::build(BackendKind::Core, "s", &[]).unwrap();
//! s.ix("").assign(a.ix("ii")).unwrap();
//! assert_eq!(s.data().unwrap()[0], 5.0);
//! ```

#![deny(warnings)]

pub use tensal_core as core;
pub use tensal_exec as exec;
pub use tensal_kernels as kernels;
pub use tensal_planner as planner;

/// The common imports: tensor handle, backend kinds, errors, the expression
/// algebra surface, and the library lifecycle.
pub mod prelude {
    pub use tensal_core::{BackendKind, DenseData, Result, Tensor, TensorError};
    pub use tensal_exec::{
        finalize, initialize, Addition, Distributive, Expr, LabeledTensor, Product, SlicedTensor,
        SumOfProducts, TensorOps,
    };
    pub use tensal_planner::{plan_product, ContractionPlan, PairPrimitive, ProductTerm};
}
