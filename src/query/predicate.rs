//! # Selection Predicates
//!
//! A [`Predicate`] is a conjunction of [`Term`]s; each term compares two
//! [`Expression`]s (a field reference or a constant) with an [`Operator`].
//!
//! ```text
//! Predicate := Term AND Term AND ...
//! Term      := Expression Operator Expression
//! Operator  := = | <> | != | > | >= | < | <=
//! ```
//!
//! ## Planning Support
//!
//! Besides evaluating a row, a predicate answers the questions the planner
//! asks when it places selections and chooses join fields:
//!
//! | Method | Answers |
//! |--------|---------|
//! | `reduction_factor` | by how much a selection shrinks its input |
//! | `select_sub_pred` | terms that only mention one schema |
//! | `join_sub_pred` | terms that need both schemas |
//! | `equates_with_constant` | `F = c` for a given field |
//! | `equates_with_field` | `F = G` for a given field |
//!
//! Comparisons go through [`Constant::compare`], so a term comparing an Int
//! with a Str fails with `QueryError::TypeMismatch` instead of evaluating
//! to false.

use crate::config::RANGE_REDUCTION_FACTOR;
use crate::query::{Plan, Scan};
use crate::types::{Constant, Schema};
use eyre::{bail, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
        }
    }

    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::NotEq => ordering != Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
        }
    }
}

impl FromStr for Operator {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "=" => Operator::Eq,
            "<>" | "!=" => Operator::NotEq,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            other => bail!("unknown comparison operator '{}'", other),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Field(String),
    Constant(Constant),
}

impl Expression {
    pub fn field(name: impl Into<String>) -> Self {
        Expression::Field(name.into())
    }

    pub fn constant(value: impl Into<Constant>) -> Self {
        Expression::Constant(value.into())
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            Expression::Field(name) => Some(name),
            Expression::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Constant(c) => Some(c),
            Expression::Field(_) => None,
        }
    }

    pub fn evaluate<S: Scan + ?Sized>(&self, scan: &S) -> Result<Constant> {
        match self {
            Expression::Field(name) => scan.get_val(name),
            Expression::Constant(c) => Ok(c.clone()),
        }
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Field(name) => schema.has_field(name),
            Expression::Constant(_) => true,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Field(name) => write!(f, "{}", name),
            Expression::Constant(Constant::Str(s)) => write!(f, "'{}'", s),
            Expression::Constant(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    lhs: Expression,
    op: Operator,
    rhs: Expression,
}

impl Term {
    pub fn new(lhs: Expression, op: Operator, rhs: Expression) -> Self {
        Self { lhs, op, rhs }
    }

    pub fn equality(lhs: Expression, rhs: Expression) -> Self {
        Self::new(lhs, Operator::Eq, rhs)
    }

    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    pub fn rhs(&self) -> &Expression {
        &self.rhs
    }

    pub fn operator(&self) -> Operator {
        self.op
    }

    pub fn is_satisfied<S: Scan + ?Sized>(&self, scan: &S) -> Result<bool> {
        let lhs = self.lhs.evaluate(scan)?;
        let rhs = self.rhs.evaluate(scan)?;
        Ok(self.op.matches(lhs.compare(&rhs)?))
    }

    /// Factor by which this term divides the output of `plan`.
    ///
    /// Equalities use distinct-value counts; every other operator assumes
    /// `RANGE_REDUCTION_FACTOR`.
    pub fn reduction_factor(&self, plan: &dyn Plan) -> usize {
        if self.op != Operator::Eq {
            return RANGE_REDUCTION_FACTOR;
        }
        match (&self.lhs, &self.rhs) {
            (Expression::Field(l), Expression::Field(r)) => {
                plan.distinct_values(l).max(plan.distinct_values(r))
            }
            (Expression::Field(f), Expression::Constant(_))
            | (Expression::Constant(_), Expression::Field(f)) => plan.distinct_values(f),
            (Expression::Constant(a), Expression::Constant(b)) => {
                if a == b {
                    1
                } else {
                    usize::MAX
                }
            }
        }
    }

    /// The constant `c` when this term is `field = c` or `c = field`.
    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        if self.op != Operator::Eq {
            return None;
        }
        match (&self.lhs, &self.rhs) {
            (Expression::Field(f), Expression::Constant(c))
            | (Expression::Constant(c), Expression::Field(f))
                if f == field =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// The other field when this term is `field = other` or `other = field`.
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        if self.op != Operator::Eq {
            return None;
        }
        match (&self.lhs, &self.rhs) {
            (Expression::Field(l), Expression::Field(r)) if l == field => Some(r),
            (Expression::Field(l), Expression::Field(r)) if r == field => Some(l),
            _ => None,
        }
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.lhs, self.op.symbol(), self.rhs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_term(term: Term) -> Self {
        Self { terms: vec![term] }
    }

    pub fn with_term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_satisfied<S: Scan + ?Sized>(&self, scan: &S) -> Result<bool> {
        for term in &self.terms {
            if !term.is_satisfied(scan)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn reduction_factor(&self, plan: &dyn Plan) -> usize {
        self.terms
            .iter()
            .fold(1usize, |acc, t| acc.saturating_mul(t.reduction_factor(plan)))
    }

    /// Terms that can be evaluated against `schema` alone.
    pub fn select_sub_pred(&self, schema: &Schema) -> Option<Predicate> {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| t.applies_to(schema))
            .cloned()
            .collect();
        (!terms.is_empty()).then_some(Predicate { terms })
    }

    /// Terms that need fields from both schemas.
    pub fn join_sub_pred(&self, left: &Schema, right: &Schema) -> Option<Predicate> {
        let mut union = left.clone();
        union.add_all(right);
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| !t.applies_to(left) && !t.applies_to(right) && t.applies_to(&union))
            .cloned()
            .collect();
        (!terms.is_empty()).then_some(Predicate { terms })
    }

    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        self.terms
            .iter()
            .find_map(|t| t.equates_with_constant(field))
    }

    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        self.terms.iter().find_map(|t| t.equates_with_field(field))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}
