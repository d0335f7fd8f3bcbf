//! # Query Planning
//!
//! Turns a parsed [`QueryData`] into an executable plan.
//!
//! ## Pipeline
//!
//! ```text
//! QueryData ──validate──> TablePlanner per table ──greedy──> join tree
//!           ──> GroupBy? ──> Project ──> Sort(distinct?)
//! ```
//!
//! [`TablePlanner`] knows one table and the query predicate. It offers three
//! candidates for extending the current plan: the table alone (with its
//! selection terms pushed down), a join on a connecting predicate term, and
//! a cross product. [`HeuristicQueryPlanner`] picks among the candidates by
//! estimated output size. The equijoin operator used for a join is chosen
//! by [`EngineConfig::join_strategy`](crate::config::EngineConfig::join_strategy).
//!
//! ## Module Structure
//!
//! - `query_data`: the query descriptor and its validation
//! - `table_planner`: per-table candidate plans
//! - `heuristic`: greedy join ordering and the final plan shape

mod heuristic;
mod query_data;
mod table_planner;

pub use heuristic::{HeuristicQueryPlanner, PlannedQuery};
pub use query_data::QueryData;
pub use table_planner::TablePlanner;
