//! # tensal-exec
//!
//! The user-facing expression algebra of tensal and its lowering to
//! primitive kernels.
//!
//! Labeled assignments read close to the mathematics they compute:
//!
//! ```
//! use tensal_core::{BackendKind, Tensor};
//! use tensal_exec::TensorOps;
//!
//! let a = Tensor::build(BackendKind::Core, "A", &[2, 2]).unwrap();
//! let b = Tensor::build(BackendKind::Core, "B", &[2, 2]).unwrap();
//! let c = Tensor::build(BackendKind::Core, "C", &[2, 2]).unwrap();
//! a.data_mut().unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
//! b.data_mut().unwrap().copy_from_slice(&[5.0, 6.0, 7.0, 8.0]);
//!
//! // C("ij") += 0.5 * A("ik") * B("kj")
//! c.ix("ij").add_assign(0.5 * a.ix("ik") * b.ix("kj")).unwrap();
//! assert_eq!(&*c.data().unwrap(), &[9.5, 11.0, 21.5, 25.0]);
//! ```
//!
//! An assignment builds a small deferred tree ([`LabeledTensor`],
//! [`Product`], [`Addition`], [`Distributive`], [`SumOfProducts`]), validates
//! it eagerly, plans N-way products through `tensal-planner`, and executes
//! pair-steps on the `tensal-kernels` primitives. Temporaries are named
//! after the bracketing that produced them and released as soon as their
//! consumer completes.

#![deny(warnings)]

pub mod expr;
mod lower;
pub mod ops;

pub use expr::{Addition, Distributive, Expr, LabeledTensor, Product, SumOfProducts};
pub use ops::{SlicedTensor, TensorOps};

use tensal_core::Result;

/// Initialize the library.
///
/// Present for backends that need process-wide setup (a cluster runtime
/// would consume the command-line arguments here). The in-core-only build
/// has no such state and always succeeds.
pub fn initialize(_args: &[String]) -> Result<()> {
    log::debug!("tensal initialized (in-core build)");
    Ok(())
}

/// Finalize the library, releasing any backend state.
///
/// A no-op in the in-core-only build.
pub fn finalize() {
    log::debug!("tensal finalized");
}
