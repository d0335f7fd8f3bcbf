//! # Materializing Operators
//!
//! Operators in this module read (part of) their input into temp tables
//! before producing rows. All of that work happens in `Plan::open()`; the
//! returned scans only read what was materialized. Block estimates exclude
//! the one-time materialization cost.
//!
//! ## Operators
//!
//! | Plan | Materializes | Output order |
//! |------|--------------|--------------|
//! | `MaterializePlan` | a copy of the input | input order |
//! | `SortPlan` | sorted runs (+ deduplicated run) | by `OrderData` |
//! | `NestedJoinPlan` | nothing | left-major |
//! | `HashJoinPlan` | one temp table per non-empty bucket per side | by bucket |
//! | `MergeJoinPlan` | both inputs, sorted on the join fields | by join key |
//! | `GroupByPlan` | input sorted on the group fields | by group key |
//!
//! ## Module Structure
//!
//! - `order`: `OrderData` and `RecordComparator`
//! - `materialized`: `MaterializePlan` and the block-count formula
//! - `sort`: external merge sort with optional distinct
//! - `nested_join`, `hash_join`, `merge_join`: equijoin algorithms
//! - `aggregate`: `AggregationFn`
//! - `group_by`: `GroupByPlan`

mod aggregate;
mod group_by;
mod hash_join;
mod materialized;
mod merge_join;
mod nested_join;
mod order;
mod sort;

pub use aggregate::AggregationFn;
pub use group_by::{GroupByPlan, GroupByScan};
pub use hash_join::{HashJoinPlan, HashJoinScan};
pub use materialized::{materialized_blocks, MaterializePlan};
pub use merge_join::{MergeJoinPlan, MergeJoinScan};
pub use nested_join::{NestedJoinPlan, NestedJoinScan};
pub use order::{OrderData, OrderKey, RecordComparator};
pub use sort::{SortPlan, SortPosition, SortScan};
