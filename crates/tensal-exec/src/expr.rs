//! Deferred labeled-expression trees.
//!
//! The algebra `C("ij") += 0.5 * A("ik") * B("jk")` builds small value-type
//! nodes: a [`LabeledTensor`] per operand, a [`Product`] for `*` chains, an
//! [`Addition`] for `±` chains, a [`Distributive`] for `L * (t1 + t2)`, and a
//! [`SumOfProducts`] for sums of whole products. Nodes hold tensor handle
//! clones (cheap, reference-counted) plus labels and a scalar factor, and
//! copy freely.
//!
//! Construction never validates: an expression is normalized and checked
//! when it is assigned to a target, so building an ill-formed node is free
//! and the error surfaces at the assignment with full context.

use crate::lower::{lower_assign, AssignMode};
use std::ops::{Add, Mul, Neg, Sub};
use tensal_core::labels::parse_indices;
use tensal_core::{Indices, Result, Tensor};

/// A tensor paired with index labels and a scalar factor.
#[derive(Clone, Debug)]
pub struct LabeledTensor {
    tensor: Tensor,
    indices: Indices,
    factor: f64,
}

impl LabeledTensor {
    /// Label a tensor, e.g. `LabeledTensor::new(&a, "ik")`.
    pub fn new(tensor: &Tensor, indices: &str) -> Self {
        Self {
            tensor: tensor.clone(),
            indices: parse_indices(indices),
            factor: 1.0,
        }
    }

    /// The underlying tensor handle.
    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    /// The index labels.
    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    /// The accumulated scalar factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub(crate) fn scaled(mut self, scalar: f64) -> Self {
        self.factor *= scalar;
        self
    }

    pub(crate) fn from_parts(tensor: Tensor, indices: Indices, factor: f64) -> Self {
        Self {
            tensor,
            indices,
            factor,
        }
    }

    /// `target = expr`: validate, then overwrite the target.
    ///
    /// Validation happens before the target is touched; on error the target
    /// is unchanged.
    pub fn assign(&self, rhs: impl Into<Expr>) -> Result<()> {
        lower_assign(self, &rhs.into(), AssignMode::Set)
    }

    /// `target += expr`.
    pub fn add_assign(&self, rhs: impl Into<Expr>) -> Result<()> {
        lower_assign(self, &rhs.into(), AssignMode::Add)
    }

    /// `target -= expr`.
    pub fn sub_assign(&self, rhs: impl Into<Expr>) -> Result<()> {
        lower_assign(self, &rhs.into(), AssignMode::Sub)
    }
}

impl Neg for LabeledTensor {
    type Output = LabeledTensor;

    fn neg(self) -> LabeledTensor {
        self.scaled(-1.0)
    }
}

impl Mul<f64> for LabeledTensor {
    type Output = LabeledTensor;

    fn mul(self, scalar: f64) -> LabeledTensor {
        self.scaled(scalar)
    }
}

impl Mul<LabeledTensor> for f64 {
    type Output = LabeledTensor;

    fn mul(self, lt: LabeledTensor) -> LabeledTensor {
        lt.scaled(self)
    }
}

impl Mul<LabeledTensor> for LabeledTensor {
    type Output = Product;

    fn mul(self, rhs: LabeledTensor) -> Product {
        Product {
            factors: vec![self, rhs],
            scalar: 1.0,
        }
    }
}

impl Mul<Addition> for LabeledTensor {
    type Output = Distributive;

    fn mul(self, rhs: Addition) -> Distributive {
        Distributive { lhs: self, rhs }
    }
}

impl Add<LabeledTensor> for LabeledTensor {
    type Output = Addition;

    fn add(self, rhs: LabeledTensor) -> Addition {
        Addition {
            terms: vec![self, rhs],
        }
    }
}

impl Sub<LabeledTensor> for LabeledTensor {
    type Output = Addition;

    fn sub(self, rhs: LabeledTensor) -> Addition {
        Addition {
            terms: vec![self, -rhs],
        }
    }
}

/// An ordered product of labeled tensors with an accumulated scalar.
#[derive(Clone, Debug)]
pub struct Product {
    factors: Vec<LabeledTensor>,
    scalar: f64,
}

impl Product {
    /// The factors, in writing order.
    pub fn factors(&self) -> &[LabeledTensor] {
        &self.factors
    }

    /// The scalar applied to the whole product (on top of each factor's own).
    pub fn scalar(&self) -> f64 {
        self.scalar
    }

    /// The total scalar: `scalar * prod(factor of each operand)`.
    pub(crate) fn total_scalar(&self) -> f64 {
        self.scalar * self.factors.iter().map(|f| f.factor).product::<f64>()
    }

    pub(crate) fn from_parts(factors: Vec<LabeledTensor>, scalar: f64) -> Self {
        Self { factors, scalar }
    }
}

impl Mul<LabeledTensor> for Product {
    type Output = Product;

    fn mul(mut self, rhs: LabeledTensor) -> Product {
        self.factors.push(rhs);
        self
    }
}

impl Mul<f64> for Product {
    type Output = Product;

    fn mul(mut self, scalar: f64) -> Product {
        self.scalar *= scalar;
        self
    }
}

impl Mul<Product> for f64 {
    type Output = Product;

    fn mul(self, mut p: Product) -> Product {
        p.scalar *= self;
        p
    }
}

impl Neg for Product {
    type Output = Product;

    fn neg(mut self) -> Product {
        self.scalar = -self.scalar;
        self
    }
}

impl Add<Product> for Product {
    type Output = SumOfProducts;

    fn add(self, rhs: Product) -> SumOfProducts {
        SumOfProducts {
            products: vec![self, rhs],
        }
    }
}

impl Sub<Product> for Product {
    type Output = SumOfProducts;

    fn sub(self, rhs: Product) -> SumOfProducts {
        SumOfProducts {
            products: vec![self, -rhs],
        }
    }
}

/// An ordered sum of labeled tensors; subtraction carries its sign in the
/// appended term's factor.
#[derive(Clone, Debug)]
pub struct Addition {
    terms: Vec<LabeledTensor>,
}

impl Addition {
    /// The summands, signs folded into their factors.
    pub fn terms(&self) -> &[LabeledTensor] {
        &self.terms
    }
}

impl Add<LabeledTensor> for Addition {
    type Output = Addition;

    fn add(mut self, rhs: LabeledTensor) -> Addition {
        self.terms.push(rhs);
        self
    }
}

impl Sub<LabeledTensor> for Addition {
    type Output = Addition;

    fn sub(mut self, rhs: LabeledTensor) -> Addition {
        self.terms.push(-rhs);
        self
    }
}

impl Mul<f64> for Addition {
    type Output = Addition;

    fn mul(mut self, scalar: f64) -> Addition {
        for term in &mut self.terms {
            term.factor *= scalar;
        }
        self
    }
}

impl Mul<Addition> for f64 {
    type Output = Addition;

    fn mul(self, addition: Addition) -> Addition {
        addition * self
    }
}

impl Mul<LabeledTensor> for Addition {
    type Output = Distributive;

    fn mul(self, rhs: LabeledTensor) -> Distributive {
        Distributive {
            lhs: rhs,
            rhs: self,
        }
    }
}

impl Neg for Addition {
    type Output = Addition;

    fn neg(self) -> Addition {
        self * -1.0
    }
}

/// `L * (t1 + t2 + ...)`, lowered as `sum_i (L * t_i)`.
#[derive(Clone, Debug)]
pub struct Distributive {
    lhs: LabeledTensor,
    rhs: Addition,
}

impl Distributive {
    /// The distributed factor.
    pub fn lhs(&self) -> &LabeledTensor {
        &self.lhs
    }

    /// The sum it distributes over.
    pub fn rhs(&self) -> &Addition {
        &self.rhs
    }

    pub(crate) fn expand(&self) -> SumOfProducts {
        SumOfProducts {
            products: self
                .rhs
                .terms
                .iter()
                .map(|term| Product {
                    factors: vec![self.lhs.clone(), term.clone()],
                    scalar: 1.0,
                })
                .collect(),
        }
    }
}

/// A sum of whole products, lowered one product at a time so temporaries are
/// released between products.
#[derive(Clone, Debug)]
pub struct SumOfProducts {
    products: Vec<Product>,
}

impl SumOfProducts {
    /// The products, in writing order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

impl Add<Product> for SumOfProducts {
    type Output = SumOfProducts;

    fn add(mut self, rhs: Product) -> SumOfProducts {
        self.products.push(rhs);
        self
    }
}

impl Sub<Product> for SumOfProducts {
    type Output = SumOfProducts;

    fn sub(mut self, rhs: Product) -> SumOfProducts {
        self.products.push(-rhs);
        self
    }
}

/// Any right-hand side an assignment accepts.
#[derive(Clone, Debug)]
pub enum Expr {
    Labeled(LabeledTensor),
    Product(Product),
    Addition(Addition),
    Distributive(Distributive),
    SumOfProducts(SumOfProducts),
}

impl From<LabeledTensor> for Expr {
    fn from(v: LabeledTensor) -> Expr {
        Expr::Labeled(v)
    }
}

impl From<Product> for Expr {
    fn from(v: Product) -> Expr {
        Expr::Product(v)
    }
}

impl From<Addition> for Expr {
    fn from(v: Addition) -> Expr {
        Expr::Addition(v)
    }
}

impl From<Distributive> for Expr {
    fn from(v: Distributive) -> Expr {
        Expr::Distributive(v)
    }
}

impl From<SumOfProducts> for Expr {
    fn from(v: SumOfProducts) -> Expr {
        Expr::SumOfProducts(v)
    }
}
