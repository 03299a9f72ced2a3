//! Contraction order selection for N-way products.
//!
//! For a product of N labeled tensors, the planner chooses the binary tree
//! of pair-steps minimizing the two-part cost of `crate::cost`: total
//! arithmetic first, then peak intermediate size, then the lexicographically
//! smallest bracketing. Up to [`MAX_EXHAUSTIVE_TERMS`] factors every full
//! binary bracketing is examined via subset enumeration; beyond that the
//! planner falls back to the greedy pairwise heuristic.

use crate::cost::{external_size, pair_flops};
use std::collections::HashMap;
use tensal_core::labels::{has_repeats, unique_labels};
use tensal_core::{Indices, Label, Result, Shape, TensorError};

/// Largest factor count planned by exhaustive bracketing search.
///
/// The subset enumeration is O(3^N); six factors stay well under a
/// millisecond while covering every product the expression algebra
/// realistically produces.
pub const MAX_EXHAUSTIVE_TERMS: usize = 6;

/// One factor of an N-way product, as the planner sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProductTerm {
    /// Index labels of this factor (repeats allowed; traces are resolved at
    /// execution time and planned on the distinct labels)
    pub indices: Indices,
    /// Extents of this factor
    pub shape: Shape,
}

impl ProductTerm {
    /// Create a term from a label string and shape.
    pub fn new(indices: &str, shape: &[usize]) -> Self {
        Self {
            indices: indices.chars().collect(),
            shape: Shape::from_slice(shape),
        }
    }
}

/// Binary tree of pair-steps produced by the planner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PairTree {
    /// An original factor, by position in the planned product
    Leaf { term: usize },
    /// One pairwise contraction
    Node {
        left: Box<PairTree>,
        right: Box<PairTree>,
        /// Labels this step must expose to its parent
        external: Indices,
        /// Arithmetic cost of this step alone
        flops: f64,
        /// Elements in this step's intermediate
        memory: usize,
    },
}

impl PairTree {
    /// Bracketing string over factor positions, e.g. `"((0*1)*2)"`.
    pub fn bracket(&self) -> String {
        match self {
            PairTree::Leaf { term } => term.to_string(),
            PairTree::Node { left, right, .. } => {
                format!("({}*{})", left.bracket(), right.bracket())
            }
        }
    }

    /// Number of original factors under this tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            PairTree::Leaf { .. } => 1,
            PairTree::Node { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

/// A planned N-way product.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractionPlan {
    /// Root of the pair-step tree; its externals are the target labels
    pub root: PairTree,
    /// Total arithmetic cost over all pair-steps
    pub flops: f64,
    /// Peak intermediate size over all pair-steps, in elements
    pub peak_memory: usize,
}

struct Candidate {
    tree: PairTree,
    flops: f64,
    peak: usize,
    bracket: String,
}

impl Candidate {
    fn better_than(&self, other: &Candidate) -> bool {
        if self.flops != other.flops {
            return self.flops < other.flops;
        }
        if self.peak != other.peak {
            return self.peak < other.peak;
        }
        self.bracket < other.bracket
    }
}

/// Plan a pairwise evaluation order for an N-way product.
///
/// `target` holds the labels the product must expose (the assignment
/// target's labels); everything else shared between factors is contracted
/// away at the cheapest point.
///
/// # Errors
///
/// [`TensorError::PlanningFailure`] if the label algebra is inconsistent:
/// a label occurring in more than two factors, a repeated target label, or a
/// target label occurring in no factor. Extent disagreements surface as
/// [`TensorError::ShapeMismatch`].
///
/// # Examples
///
/// ```
/// use tensal_planner::{plan_product, ProductTerm};
///
/// let terms = vec![
///     ProductTerm::new("ij", &[2, 8]),
///     ProductTerm::new("jk", &[8, 2]),
///     ProductTerm::new("kl", &[2, 8]),
/// ];
/// let target: Vec<char> = "il".chars().collect();
/// let plan = plan_product(&terms, &target).unwrap();
/// assert_eq!(plan.root.leaf_count(), 3);
/// // The cheap order contracts the large j extent first.
/// assert_eq!(plan.root.bracket(), "((0*1)*2)");
/// ```
pub fn plan_product(terms: &[ProductTerm], target: &[Label]) -> Result<ContractionPlan> {
    if terms.is_empty() {
        return Err(TensorError::planning_failure("empty product"));
    }

    let operands: Vec<(&[Label], &[usize])> = terms
        .iter()
        .map(|t| (t.indices.as_slice(), t.shape.as_slice()))
        .collect();
    let extents = tensal_core::labels::extent_map("plan", &operands)?;

    let term_labels: Vec<Indices> = terms.iter().map(|t| unique_labels(&t.indices)).collect();

    // Per-label bitmask of the factors carrying it.
    let mut label_masks: HashMap<Label, usize> = HashMap::new();
    for (i, labels) in term_labels.iter().enumerate() {
        for &l in labels {
            *label_masks.entry(l).or_insert(0) |= 1 << i;
        }
    }
    for (&l, &mask) in &label_masks {
        let occurrences = mask.count_ones();
        if occurrences > 2 {
            return Err(TensorError::planning_failure(format!(
                "label '{}' appears in {} factors",
                l, occurrences
            )));
        }
    }

    if has_repeats(target) {
        return Err(TensorError::planning_failure(
            "target labels contain a repeat",
        ));
    }
    for &l in target {
        if !label_masks.contains_key(&l) {
            return Err(TensorError::planning_failure(format!(
                "target label '{}' does not appear in any factor",
                l
            )));
        }
    }

    // Deterministic label order: first appearance across the factors.
    let mut all_labels = Indices::new();
    for labels in &term_labels {
        for &l in labels {
            if !all_labels.contains(&l) {
                all_labels.push(l);
            }
        }
    }

    let n = terms.len();
    if n == 1 {
        return Ok(ContractionPlan {
            root: PairTree::Leaf { term: 0 },
            flops: 0.0,
            peak_memory: 0,
        });
    }

    let ctx = PlanContext {
        term_labels: &term_labels,
        all_labels: &all_labels,
        label_masks: &label_masks,
        target,
        extents: &extents,
    };

    if n <= MAX_EXHAUSTIVE_TERMS {
        exhaustive(&ctx, n)
    } else {
        log::warn!(
            "product of {} factors exceeds the exhaustive bound ({}), planning greedily",
            n,
            MAX_EXHAUSTIVE_TERMS
        );
        greedy(&ctx, n)
    }
}

struct PlanContext<'a> {
    term_labels: &'a [Indices],
    all_labels: &'a Indices,
    label_masks: &'a HashMap<Label, usize>,
    target: &'a [Label],
    extents: &'a HashMap<Label, usize>,
}

impl PlanContext<'_> {
    fn in_mask(&self, l: Label, mask: usize) -> bool {
        self.label_masks[&l] & mask != 0
    }

    /// Labels an evaluated subset must expose: present inside, and needed by
    /// the target or by a factor outside the subset.
    fn external_of(&self, mask: usize, full: usize) -> Indices {
        self.all_labels
            .iter()
            .copied()
            .filter(|&l| {
                self.in_mask(l, mask)
                    && (self.target.contains(&l) || self.in_mask(l, full & !mask))
            })
            .collect()
    }

    /// Labels carried by an evaluated subset: full labels for a single
    /// factor, externals once something has been contracted.
    fn effective_labels(&self, mask: usize, full: usize) -> Indices {
        if mask.count_ones() == 1 {
            let term = mask.trailing_zeros() as usize;
            self.term_labels[term].clone()
        } else {
            self.external_of(mask, full)
        }
    }
}

/// Exhaustive search over all full binary bracketings via subset DP.
///
/// Every subset's best subtree is computed bottom-up; ties propagate the
/// smaller bracketing so the result is deterministic.
fn exhaustive(ctx: &PlanContext<'_>, n: usize) -> Result<ContractionPlan> {
    let full = (1usize << n) - 1;
    let mut best: Vec<Option<Candidate>> = Vec::with_capacity(full + 1);
    best.resize_with(full + 1, || None);

    for (i, _) in ctx.term_labels.iter().enumerate() {
        best[1 << i] = Some(Candidate {
            tree: PairTree::Leaf { term: i },
            flops: 0.0,
            peak: 0,
            bracket: i.to_string(),
        });
    }

    for mask in 1..=full {
        if mask.count_ones() <= 1 {
            continue;
        }
        let external = ctx.external_of(mask, full);
        let memory = external_size(&external, ctx.extents)?;

        let mut winner: Option<Candidate> = None;
        let mut submask = (mask - 1) & mask;
        while submask > 0 {
            let comp = mask ^ submask;
            if let (Some(left), Some(right)) = (&best[submask], &best[comp]) {
                let left_labels = ctx.effective_labels(submask, full);
                let right_labels = ctx.effective_labels(comp, full);
                let step_flops = pair_flops(&left_labels, &right_labels, ctx.extents)?;

                let candidate = Candidate {
                    flops: left.flops + right.flops + step_flops,
                    peak: left.peak.max(right.peak).max(memory),
                    bracket: format!("({}*{})", left.bracket, right.bracket),
                    tree: PairTree::Node {
                        left: Box::new(left.tree.clone()),
                        right: Box::new(right.tree.clone()),
                        external: external.clone(),
                        flops: step_flops,
                        memory,
                    },
                };
                if winner.as_ref().map_or(true, |w| candidate.better_than(w)) {
                    winner = Some(candidate);
                }
            }
            submask = (submask - 1) & mask;
        }
        best[mask] = winner;
    }

    let root = best[full]
        .take()
        .ok_or_else(|| TensorError::planning_failure("no bracketing found"))?;
    log::debug!(
        "planned {} factors exhaustively: {} ({} flops, {} peak elements)",
        n,
        root.bracket,
        root.flops,
        root.peak
    );
    Ok(ContractionPlan {
        root: root.tree,
        flops: root.flops,
        peak_memory: root.peak,
    })
}

/// Greedy fallback: repeatedly contract the cheapest remaining pair.
fn greedy(ctx: &PlanContext<'_>, n: usize) -> Result<ContractionPlan> {
    struct Entry {
        tree: PairTree,
        labels: Indices,
    }

    let mut entries: Vec<Entry> = (0..n)
        .map(|i| Entry {
            tree: PairTree::Leaf { term: i },
            labels: ctx.term_labels[i].clone(),
        })
        .collect();

    let mut total_flops = 0.0;
    let mut peak_memory = 0usize;

    while entries.len() > 1 {
        let mut best_pair = (0, 1);
        let mut best_flops = f64::INFINITY;
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let flops = pair_flops(&entries[i].labels, &entries[j].labels, ctx.extents)?;
                if flops < best_flops {
                    best_flops = flops;
                    best_pair = (i, j);
                }
            }
        }

        let (i, j) = best_pair;
        // The merged intermediate keeps labels the target or a remaining
        // factor still needs.
        let external: Indices = ctx
            .all_labels
            .iter()
            .copied()
            .filter(|l| {
                (entries[i].labels.contains(l) || entries[j].labels.contains(l))
                    && (ctx.target.contains(l)
                        || entries
                            .iter()
                            .enumerate()
                            .any(|(k, e)| k != i && k != j && e.labels.contains(l)))
            })
            .collect();
        let memory = external_size(&external, ctx.extents)?;

        total_flops += best_flops;
        peak_memory = peak_memory.max(memory);

        let right = entries.remove(j);
        let left = entries.remove(i);
        entries.push(Entry {
            tree: PairTree::Node {
                left: Box::new(left.tree),
                right: Box::new(right.tree),
                external: external.clone(),
                flops: best_flops,
                memory,
            },
            labels: external,
        });
    }

    let root = entries.pop().expect("one entry remains");
    Ok(ContractionPlan {
        root: root.tree,
        flops: total_flops,
        peak_memory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(s: &str) -> Vec<Label> {
        s.chars().collect()
    }

    #[test]
    fn test_single_term_is_trivial() {
        let terms = vec![ProductTerm::new("ij", &[2, 3])];
        let plan = plan_product(&terms, &target("ij")).unwrap();
        assert_eq!(plan.root, PairTree::Leaf { term: 0 });
        assert_eq!(plan.flops, 0.0);
    }

    #[test]
    fn test_binary_product() {
        let terms = vec![
            ProductTerm::new("ik", &[2, 4]),
            ProductTerm::new("kj", &[4, 3]),
        ];
        let plan = plan_product(&terms, &target("ij")).unwrap();
        assert_eq!(plan.root.bracket(), "(0*1)");
        // distinct labels i, k, j
        assert_eq!(plan.flops, 24.0);
        assert_eq!(plan.peak_memory, 6);
        match &plan.root {
            PairTree::Node { external, .. } => {
                assert_eq!(external.as_slice(), &['i', 'j']);
            }
            _ => panic!("expected a pair-step"),
        }
    }

    #[test]
    fn test_chain_prefers_cheap_bracketing() {
        // (AB) costs 2*100*2 = 400 and leaves a 2x2; (BC) costs
        // 100*2*100 = 20000. The planner must contract AB first.
        let terms = vec![
            ProductTerm::new("ij", &[2, 100]),
            ProductTerm::new("jk", &[100, 2]),
            ProductTerm::new("kl", &[2, 100]),
        ];
        let plan = plan_product(&terms, &target("il")).unwrap();
        assert_eq!(plan.root.bracket(), "((0*1)*2)");
        assert_eq!(plan.flops, 400.0 + 400.0);
    }

    #[test]
    fn test_equal_cost_orders_tie_break_lexicographically() {
        // Three 3x3 factors: both bracketings cost 27 + 27.
        let terms = vec![
            ProductTerm::new("ij", &[3, 3]),
            ProductTerm::new("jk", &[3, 3]),
            ProductTerm::new("kl", &[3, 3]),
        ];
        let plan = plan_product(&terms, &target("il")).unwrap();
        assert_eq!(plan.flops, 54.0);
        assert_eq!(plan.root.bracket(), "((0*1)*2)");

        // Both orders really do cost the same.
        let extents: HashMap<Label, usize> =
            [('i', 3), ('j', 3), ('k', 3), ('l', 3)].into_iter().collect();
        let ab = pair_flops(&target("ij"), &target("jk"), &extents).unwrap();
        let bc = pair_flops(&target("jk"), &target("kl"), &extents).unwrap();
        assert_eq!(ab, bc);
    }

    #[test]
    fn test_contracted_labels_leave_intermediates() {
        // After (0*1), j must be gone: the second step's cost involves only
        // i, k, l.
        let terms = vec![
            ProductTerm::new("ij", &[2, 9]),
            ProductTerm::new("jk", &[9, 2]),
            ProductTerm::new("kl", &[2, 2]),
        ];
        let plan = plan_product(&terms, &target("il")).unwrap();
        // steps: i*j*k = 36, then i*k*l = 8
        assert_eq!(plan.flops, 44.0);
        assert_eq!(plan.peak_memory, 4);
    }

    #[test]
    fn test_hadamard_target_label_stays_external() {
        let terms = vec![
            ProductTerm::new("ij", &[2, 3]),
            ProductTerm::new("ij", &[2, 3]),
        ];
        let plan = plan_product(&terms, &target("ij")).unwrap();
        match &plan.root {
            PairTree::Node { external, .. } => assert_eq!(external.as_slice(), &['i', 'j']),
            _ => panic!("expected a pair-step"),
        }
    }

    #[test]
    fn test_four_way_product() {
        let terms = vec![
            ProductTerm::new("ij", &[2, 2]),
            ProductTerm::new("jk", &[2, 2]),
            ProductTerm::new("kl", &[2, 2]),
            ProductTerm::new("lm", &[2, 2]),
        ];
        let plan = plan_product(&terms, &target("im")).unwrap();
        assert_eq!(plan.root.leaf_count(), 4);
        assert!(plan.flops > 0.0);
    }

    #[test]
    fn test_greedy_fallback_above_bound() {
        // Seven chained 2x2 matrices exceed the exhaustive bound.
        let names = ["ab", "bc", "cd", "de", "ef", "fg", "gh"];
        let terms: Vec<ProductTerm> =
            names.iter().map(|n| ProductTerm::new(n, &[2, 2])).collect();
        let plan = plan_product(&terms, &target("ah")).unwrap();
        assert_eq!(plan.root.leaf_count(), 7);
        assert!(plan.flops > 0.0);
        assert!(plan.peak_memory >= 4);
    }

    #[test]
    fn test_rejects_label_in_three_factors() {
        let terms = vec![
            ProductTerm::new("ij", &[2, 2]),
            ProductTerm::new("jk", &[2, 2]),
            ProductTerm::new("jl", &[2, 2]),
        ];
        let err = plan_product(&terms, &target("ikl")).unwrap_err();
        assert!(matches!(err, TensorError::PlanningFailure { .. }));
    }

    #[test]
    fn test_rejects_orphan_target_label() {
        let terms = vec![
            ProductTerm::new("ij", &[2, 2]),
            ProductTerm::new("jk", &[2, 2]),
        ];
        let err = plan_product(&terms, &target("iz")).unwrap_err();
        assert!(matches!(err, TensorError::PlanningFailure { .. }));
    }

    #[test]
    fn test_rejects_repeated_target_label() {
        let terms = vec![
            ProductTerm::new("ij", &[2, 2]),
            ProductTerm::new("jk", &[2, 2]),
        ];
        let err = plan_product(&terms, &target("ii")).unwrap_err();
        assert!(matches!(err, TensorError::PlanningFailure { .. }));
    }

    #[test]
    fn test_rejects_extent_mismatch() {
        let terms = vec![
            ProductTerm::new("ij", &[2, 3]),
            ProductTerm::new("jk", &[4, 2]),
        ];
        let err = plan_product(&terms, &target("ik")).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_plan_serialization_roundtrip() {
        let terms = vec![
            ProductTerm::new("ij", &[2, 3]),
            ProductTerm::new("jk", &[3, 2]),
        ];
        let plan = plan_product(&terms, &target("ik")).unwrap();

        let json = serde_json::to_string(&plan).unwrap();
        let back: ContractionPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.root, plan.root);
        assert_eq!(back.flops, plan.flops);
        assert_eq!(back.peak_memory, plan.peak_memory);
    }
}
