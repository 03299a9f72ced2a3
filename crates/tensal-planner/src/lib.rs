//! # tensal-planner
//!
//! Contraction planning for tensal: given an N-way product of labeled
//! tensors and the labels its target must expose, choose
//!
//! 1. the **pairwise evaluation order** - a binary tree of pair-steps
//!    minimizing total arithmetic, then peak intermediate size, then the
//!    lexicographically smallest bracketing ([`plan_product`]), and
//! 2. the **primitive** for each pair - permute, scale-and-add, outer
//!    product, direct GEMM, or the batched general path
//!    ([`select_primitive`]).
//!
//! Products of up to [`MAX_EXHAUSTIVE_TERMS`] factors are planned by
//! exhaustive bracketing search; larger products fall back to a greedy
//! pairwise heuristic.

#![deny(warnings)]

pub mod cost;
pub mod order;
pub mod select;

pub use order::{
    plan_product, ContractionPlan, PairTree, ProductTerm, MAX_EXHAUSTIVE_TERMS,
};
pub use select::{select_primitive, PairPrimitive};
