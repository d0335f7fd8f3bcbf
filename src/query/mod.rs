//! # Query Execution Core
//!
//! This module defines the plan/scan protocol every operator implements and
//! the pipelined (non-materializing) operators built on it.
//!
//! ## Execution Model
//!
//! ```text
//! Plan tree (Arc<dyn Plan>)           Scan tree (Box<dyn Scan>)
//!
//!     ProjectPlan          open()         ProjectScan
//!         │              ────────>           │
//!     SelectPlan                          SelectScan
//!         │                                  │
//!     TablePlan                           TableScan
//! ```
//!
//! `open()` recursively opens children and composes their scans. The
//! caller drives `next()` and reads fields of the current row; `close()`
//! releases the whole subtree. Operators that must see their whole input
//! first (sort, hash join, group-by) live in [`crate::materialize`].
//!
//! ## Module Structure
//!
//! - `scan`: `Scan` / `UpdateScan` traits and row-copy helpers
//! - `plan`: `Plan` trait and shared cost formulas
//! - `predicate`: `Predicate`, `Term`, `Expression`, `Operator`
//! - `table`: leaf plan over a base table
//! - `select`, `project`, `product`: pipelined relational operators

mod plan;
mod predicate;
mod product;
mod project;
mod scan;
mod select;
mod table;

pub use plan::{equijoin_records_output, joined_distinct_values, Plan, PlanRef};
pub use predicate::{Expression, Operator, Predicate, Term};
pub use product::{ProductPlan, ProductScan};
pub use project::{ProjectPlan, ProjectScan};
pub use scan::{collect_rows, copy_record, Scan, UpdateScan};
pub use select::{SelectPlan, SelectScan};
pub use table::TablePlan;
