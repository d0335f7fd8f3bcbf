//! # relq - Relational Query Execution
//!
//! relq evaluates single-block `select` queries over in-memory record files
//! using the pipelined plan/scan (Volcano) model. Every relational operator
//! comes in two halves: a [`Plan`](query::Plan) that estimates its cost
//! without touching data, and a [`Scan`](query::Scan) cursor that produces
//! rows on demand.
//!
//! ## Quick Start
//!
//! ```ignore
//! use relq::planner::{HeuristicQueryPlanner, QueryData};
//! use relq::storage::{Catalog, Transaction};
//!
//! let tx = Transaction::default();
//! let catalog = Catalog::new();
//! catalog.create_table(&tx, "student", student_schema)?;
//!
//! let data = QueryData::new(["sname"], ["student", "enroll"])
//!     .with_predicate(pred);
//! let planned = HeuristicQueryPlanner::new(&catalog).create_plan(&data, &tx)?;
//! let mut scan = planned.plan.open()?;
//! while scan.next()? {
//!     println!("{}", scan.get_string("sname")?);
//! }
//! scan.close();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Planner (QueryData, heuristics)   │
//! ├─────────────────────────────────────┤
//! │ Materializing operators (sort, hash │
//! │ join, merge join, group by)         │
//! ├─────────────────────────────────────┤
//! │ Pipelined operators (select,        │
//! │ project, product)                   │
//! ├─────────────────────────────────────┤
//! │ Storage (catalog, record files,     │
//! │ temp tables, transactions)          │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: tuning constants and `EngineConfig`
//! - [`error`]: the `QueryError` taxonomy
//! - [`types`]: constants, schemas and record ids
//! - [`storage`]: catalog, record files, table scans and temp tables
//! - [`query`]: the plan/scan protocol, predicates and pipelined operators
//! - [`materialize`]: sort, joins and aggregation
//! - [`planner`]: query descriptors and the greedy join-order planner

pub mod config;
pub mod error;
pub mod materialize;
pub mod planner;
pub mod query;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_util;

pub use error::{query_error, QueryError};
