//! # tensal-kernels
//!
//! In-core primitive kernels for tensal: the operations every labeled
//! expression ultimately lowers to.
//!
//! - [`permute`] - generalized transpose with accumulation,
//!   `C(Cinds) <- alpha * A(Ainds) + beta * C(Cinds)`
//! - [`contract`] - pairwise contraction for arbitrary labelings, reduced to
//!   an external GEMM after transposition (with Hadamard batching and
//!   trace/diagonal/unilateral-sum pre-steps)
//! - [`slice`] - hyper-rectangle assignment with accumulation
//! - [`reduce_repeated`] - the reduction pre-step, exposed for direct use
//!
//! All kernels share two conventions: validation happens before any element
//! of the target is written, and `beta == 0` means the target is never read
//! (a NaN-filled target is overwritten cleanly).

#![deny(warnings)]

mod error_util;
mod util;

pub mod contract;
pub mod permute;
pub mod reduce;
pub mod slice;

#[cfg(test)]
mod property_tests;

pub use contract::contract;
pub use permute::permute;
pub use reduce::reduce_repeated;
pub use slice::slice;
