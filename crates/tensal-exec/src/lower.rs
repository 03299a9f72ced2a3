//! Assignment lowering.
//!
//! An assignment `target op= expr` is lowered to a schedule of primitive
//! kernel calls. Validation is eager: every operand of the expression is
//! checked before the target is zeroed or written, so an assignment either
//! completes entirely or leaves the target unchanged.
//!
//! * `=` zeroes the target (after validation) and accumulates; single
//!   permutes and products write through `beta = 0` directly.
//! * `-=` negates the expression's scalar and accumulates.
//! * Products are planned by `tensal_planner`, executed pair-step by
//!   pair-step into bracketing-named temporaries, with the accumulated
//!   scalar folded into the final step.
//! * A target aliasing an operand is detected by handle identity; the
//!   result is computed into a temporary and swapped in, so
//!   `A("ij") = A("ji")` transposes safely.

use crate::expr::{Addition, Expr, LabeledTensor, Product, SumOfProducts};
use std::collections::HashMap;
use tensal_core::labels::{self, has_repeats, indices_to_string};
use tensal_core::{BackendKind, DenseData, Indices, Label, Result, Tensor, TensorError};
use tensal_kernels as kernels;
use tensal_planner::{plan_product, select_primitive, PairPrimitive, PairTree, ProductTerm};

/// The accumulation discipline of one assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AssignMode {
    /// `=`: overwrite
    Set,
    /// `+=`: accumulate
    Add,
    /// `-=`: accumulate negated
    Sub,
}

impl AssignMode {
    fn sign(self) -> f64 {
        match self {
            AssignMode::Sub => -1.0,
            _ => 1.0,
        }
    }

    fn beta(self) -> f64 {
        match self {
            AssignMode::Set => 0.0,
            _ => 1.0,
        }
    }
}

pub(crate) fn lower_assign(target: &LabeledTensor, expr: &Expr, mode: AssignMode) -> Result<()> {
    validate_target(target)?;
    match expr {
        Expr::Labeled(rhs) => {
            validate_labeled_rhs(target, rhs)?;
            apply_labeled(target, rhs, mode.sign(), mode.beta())
        }
        Expr::Product(product) => lower_product(target, product, mode),
        Expr::Addition(addition) => lower_addition(target, addition, mode),
        Expr::Distributive(dist) => lower_sop(target, &dist.expand(), mode),
        Expr::SumOfProducts(sop) => lower_sop(target, sop, mode),
    }
}

fn validate_target(target: &LabeledTensor) -> Result<()> {
    if target.indices().len() != target.tensor().rank() {
        return Err(TensorError::label_mismatch(
            "assign",
            format!(
                "target labels \"{}\" do not match rank {}",
                indices_to_string(target.indices()),
                target.tensor().rank()
            ),
        ));
    }
    if has_repeats(target.indices()) {
        return Err(TensorError::label_mismatch(
            "assign",
            format!(
                "target labels \"{}\" contain a repeat",
                indices_to_string(target.indices())
            ),
        ));
    }
    Ok(())
}

/// A labeled right-hand side must be a permutation of the target, up to
/// labels repeated on the source (trace or reduction to diagonal).
fn validate_labeled_rhs(target: &LabeledTensor, rhs: &LabeledTensor) -> Result<()> {
    let t_shape = target.tensor().shape();
    let r_shape = rhs.tensor().shape();
    labels::extent_map(
        "assign",
        &[
            (rhs.indices(), r_shape.as_slice()),
            (target.indices(), t_shape.as_slice()),
        ],
    )?;

    for &l in target.indices() {
        if !rhs.indices().contains(&l) {
            return Err(TensorError::label_mismatch(
                "assign",
                format!("target label '{}' does not occur on the right-hand side", l),
            ));
        }
    }
    for &l in rhs.indices() {
        let occurrences = rhs.indices().iter().filter(|&&x| x == l).count();
        if !target.indices().contains(&l) && occurrences < 2 {
            return Err(TensorError::label_mismatch(
                "assign",
                format!(
                    "\"{}\" is not a permutation of \"{}\"",
                    indices_to_string(rhs.indices()),
                    indices_to_string(target.indices())
                ),
            ));
        }
    }
    Ok(())
}

/// Execute `target <- alpha_sign * factor * rhs + beta * target` where `rhs`
/// is a single labeled tensor (permute, trace, or reduction to diagonal).
fn apply_labeled(target: &LabeledTensor, rhs: &LabeledTensor, sign: f64, beta: f64) -> Result<()> {
    let alpha = rhs.factor() * sign;
    let t_inds = target.indices();

    // A source sharing the target's storage is snapshotted first; the
    // borrow rules make an in-place permute unrepresentable anyway.
    let src_owned: Option<DenseData> = if target.tensor().same_storage(rhs.tensor()) {
        Some(rhs.tensor().dense()?.clone())
    } else {
        None
    };
    let src_guard;
    let src: &DenseData = match &src_owned {
        Some(data) => data,
        None => {
            src_guard = rhs.tensor().dense()?;
            &src_guard
        }
    };

    let mut dst = target.tensor().dense_mut()?;
    if has_repeats(rhs.indices()) {
        let reduced = kernels::reduce_repeated(src, rhs.indices(), t_inds)?;
        kernels::permute(&mut dst, &reduced, t_inds, t_inds, alpha, beta)
    } else {
        kernels::permute(&mut dst, src, t_inds, rhs.indices(), alpha, beta)
    }
}

fn lower_product(target: &LabeledTensor, product: &Product, mode: AssignMode) -> Result<()> {
    let terms = product.factors();
    if terms.is_empty() {
        return Err(TensorError::planning_failure("empty product"));
    }

    if terms.len() == 1 {
        let single = terms[0].clone().scaled(product.scalar());
        validate_labeled_rhs(target, &single)?;
        log::debug!(
            "unary product -> {:?}",
            select_primitive(single.indices(), None, target.indices())
        );
        return apply_labeled(target, &single, mode.sign(), mode.beta());
    }

    let plan_terms: Vec<ProductTerm> = terms
        .iter()
        .map(|t| ProductTerm {
            indices: t.indices().clone(),
            shape: t.tensor().shape(),
        })
        .collect();
    // Planning validates the product's label algebra and extents up front.
    let plan = plan_product(&plan_terms, target.indices())?;
    log::debug!(
        "lowering product as {} ({} flops, {} peak elements)",
        plan.root.bracket(),
        plan.flops,
        plan.peak_memory
    );

    let operands: Vec<(&[Label], &[usize])> = plan_terms
        .iter()
        .map(|t| (t.indices.as_slice(), t.shape.as_slice()))
        .collect();
    let extents = labels::extent_map("lower", &operands)?;

    let alpha = product.total_scalar() * mode.sign();
    execute_root(target, &plan.root, terms, &extents, alpha, mode.beta())
}

struct Operand {
    tensor: Tensor,
    indices: Indices,
    name: String,
}

/// Execute the root pair-step into the target, routing through a temporary
/// when the target aliases an operand.
fn execute_root(
    target: &LabeledTensor,
    root: &PairTree,
    leaves: &[LabeledTensor],
    extents: &HashMap<Label, usize>,
    alpha: f64,
    beta: f64,
) -> Result<()> {
    let (left, right) = match root {
        PairTree::Node { left, right, .. } => (left, right),
        PairTree::Leaf { .. } => {
            return Err(TensorError::planning_failure("degenerate plan for a product"));
        }
    };
    let l = eval_operand(left, leaves, extents)?;
    let r = eval_operand(right, leaves, extents)?;

    let aliased = l.tensor.same_storage(target.tensor()) || r.tensor.same_storage(target.tensor());
    if aliased {
        let name = format!("({}*{})", l.name, r.name);
        let temp = Tensor::build(BackendKind::Core, name.clone(), &target.tensor().shape())?;
        log::debug!("target aliases an operand, routing through {}", name);
        {
            let mut dst = temp.dense_mut()?;
            let lg = l.tensor.dense()?;
            let rg = r.tensor.dense()?;
            execute_pair(&mut dst, &lg, &l.indices, &rg, &r.indices, target.indices(), alpha, 0.0)?;
        }
        let src = temp.dense()?;
        let mut dst = target.tensor().dense_mut()?;
        kernels::permute(&mut dst, &src, target.indices(), target.indices(), 1.0, beta)
    } else {
        let lg = l.tensor.dense()?;
        let rg = r.tensor.dense()?;
        let mut dst = target.tensor().dense_mut()?;
        execute_pair(&mut dst, &lg, &l.indices, &rg, &r.indices, target.indices(), alpha, beta)
    }
}

/// Evaluate one subtree, allocating a bracketing-named temporary per
/// pair-step. Children drop as soon as their consumer has run.
fn eval_operand(
    node: &PairTree,
    leaves: &[LabeledTensor],
    extents: &HashMap<Label, usize>,
) -> Result<Operand> {
    match node {
        PairTree::Leaf { term } => {
            let leaf = &leaves[*term];
            Ok(Operand {
                tensor: leaf.tensor().clone(),
                indices: leaf.indices().clone(),
                name: leaf.tensor().name(),
            })
        }
        PairTree::Node {
            left,
            right,
            external,
            ..
        } => {
            let l = eval_operand(left, leaves, extents)?;
            let r = eval_operand(right, leaves, extents)?;
            let name = format!("({}*{})", l.name, r.name);
            let shape: Vec<usize> = external.iter().map(|lbl| extents[lbl]).collect();
            log::debug!("allocating temporary {} with shape {:?}", name, shape);
            let temp = Tensor::build(BackendKind::Core, name.clone(), &shape)?;
            {
                let mut dst = temp.dense_mut()?;
                let lg = l.tensor.dense()?;
                let rg = r.tensor.dense()?;
                execute_pair(&mut dst, &lg, &l.indices, &rg, &r.indices, external, 1.0, 0.0)?;
            }
            Ok(Operand {
                tensor: temp,
                indices: external.clone(),
                name,
            })
        }
    }
}

/// Dispatch one pair-step on the primitive the planner selects for it.
#[allow(clippy::too_many_arguments)]
fn execute_pair(
    dst: &mut DenseData,
    a: &DenseData,
    a_lab: &[Label],
    b: &DenseData,
    b_lab: &[Label],
    cinds: &[Label],
    alpha: f64,
    beta: f64,
) -> Result<()> {
    let primitive = select_primitive(a_lab, Some(b_lab), cinds);
    log::debug!(
        "pair-step \"{}\",\"{}\" -> \"{}\" via {:?}",
        indices_to_string(a_lab),
        indices_to_string(b_lab),
        indices_to_string(cinds),
        primitive
    );

    if primitive == PairPrimitive::ScaleAdd {
        let (scalar_side, other, other_lab) = if a_lab.is_empty() {
            (a, b, b_lab)
        } else {
            (b, a, a_lab)
        };
        let clean_permutation = !has_repeats(other_lab)
            && other_lab.len() == cinds.len()
            && cinds.iter().all(|l| other_lab.contains(l));
        if clean_permutation {
            let value = scalar_side.data()[0];
            return kernels::permute(dst, other, cinds, other_lab, alpha * value, beta);
        }
    }

    kernels::contract(dst, a, b, cinds, a_lab, b_lab, alpha, beta)
}

fn lower_addition(target: &LabeledTensor, addition: &Addition, mode: AssignMode) -> Result<()> {
    for term in addition.terms() {
        validate_labeled_rhs(target, term)?;
    }

    match mode {
        AssignMode::Set => {
            let terms = detach_aliases(target, addition.terms())?;
            target.tensor().zero()?;
            for term in &terms {
                apply_labeled(target, term, 1.0, 1.0)?;
            }
            Ok(())
        }
        AssignMode::Add | AssignMode::Sub => {
            for term in addition.terms() {
                apply_labeled(target, term, mode.sign(), 1.0)?;
            }
            Ok(())
        }
    }
}

fn lower_sop(target: &LabeledTensor, sop: &SumOfProducts, mode: AssignMode) -> Result<()> {
    // Validate every product before the first write.
    for product in sop.products() {
        let factors = product.factors();
        if factors.is_empty() {
            return Err(TensorError::planning_failure("empty product"));
        }
        if factors.len() == 1 {
            validate_labeled_rhs(target, &factors[0])?;
        } else {
            let plan_terms: Vec<ProductTerm> = factors
                .iter()
                .map(|t| ProductTerm {
                    indices: t.indices().clone(),
                    shape: t.tensor().shape(),
                })
                .collect();
            plan_product(&plan_terms, target.indices())?;
        }
    }

    match mode {
        AssignMode::Set => {
            let products: Vec<Product> = sop
                .products()
                .iter()
                .map(|p| {
                    detach_aliases(target, p.factors())
                        .map(|factors| Product::from_parts(factors, p.scalar()))
                })
                .collect::<Result<_>>()?;
            target.tensor().zero()?;
            for product in &products {
                lower_product(target, product, AssignMode::Add)?;
            }
            Ok(())
        }
        AssignMode::Add | AssignMode::Sub => {
            for product in sop.products() {
                lower_product(target, product, mode)?;
            }
            Ok(())
        }
    }
}

/// Replace operands sharing the target's storage with a snapshot, so that
/// `=` can zero the target before accumulating.
fn detach_aliases(target: &LabeledTensor, terms: &[LabeledTensor]) -> Result<Vec<LabeledTensor>> {
    let aliased = terms
        .iter()
        .any(|t| t.tensor().same_storage(target.tensor()));
    if !aliased {
        return Ok(terms.to_vec());
    }

    let snapshot = Tensor::from_dense(
        format!("{}'", target.tensor().name()),
        target.tensor().dense()?.clone(),
    );
    Ok(terms
        .iter()
        .map(|t| {
            if t.tensor().same_storage(target.tensor()) {
                LabeledTensor::from_parts(snapshot.clone(), t.indices().clone(), t.factor())
            } else {
                t.clone()
            }
        })
        .collect())
}
