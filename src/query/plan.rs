//! # Plan Protocol
//!
//! A [`Plan`] is an immutable recipe for a [`Scan`]. Plans are built once per
//! query, share their children through `Arc`, and can be opened any number of
//! times. Each plan answers three estimates without touching data:
//!
//! | Estimate | Meaning |
//! |----------|---------|
//! | `blocks_accessed` | steady-state block reads of one pass over the output |
//! | `records_output` | expected number of output rows |
//! | `distinct_values(f)` | expected number of distinct values of field `f` |
//!
//! `blocks_accessed` never includes one-time materialization work performed
//! by `open()` (partitioning, run generation and merging). The planner
//! compares plans by these estimates only.

use crate::query::Scan;
use crate::types::Schema;
use eyre::Result;
use std::sync::Arc;

pub trait Plan {
    fn open(&self) -> Result<Box<dyn Scan>>;
    fn schema(&self) -> &Schema;
    fn blocks_accessed(&self) -> usize;
    fn records_output(&self) -> usize;
    fn distinct_values(&self, field: &str) -> usize;
}

pub type PlanRef = Arc<dyn Plan>;

/// Estimated output of an equijoin under the uniform-distribution
/// assumption: `R(l) * R(r) / max(V(l, f1), V(r, f2))`.
pub fn equijoin_records_output(left: &dyn Plan, right: &dyn Plan, f1: &str, f2: &str) -> usize {
    let max_values = left
        .distinct_values(f1)
        .max(right.distinct_values(f2))
        .max(1);
    left.records_output().saturating_mul(right.records_output()) / max_values
}

/// Distinct-value estimate of a two-input plan: taken from whichever child
/// defines the field.
pub fn joined_distinct_values(left: &dyn Plan, right: &dyn Plan, field: &str) -> usize {
    if left.schema().has_field(field) {
        left.distinct_values(field)
    } else {
        right.distinct_values(field)
    }
}
