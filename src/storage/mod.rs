//! # Storage Module
//!
//! This module provides the record storage the query operators run on: a
//! catalog of named base tables, transaction-scoped temp tables, and the
//! [`TableScan`] cursor that reads and writes both.
//!
//! ## Architecture Overview
//!
//! ```text
//! Catalog ──name──> (Schema, RecordFile) ──open──> TableScan
//! Transaction ──new_temp_table──> TempTable ──open──> TableScan
//! ```
//!
//! Storage is in memory. Records are grouped into blocks whose capacity is
//! `block_size / slot_size`, so block counts track what a paged file would
//! hold and the planner's cost estimates stay meaningful.
//!
//! ## Record Addresses
//!
//! Every stored record has a [`Rid`](crate::types::Rid) of `(block, slot)`.
//! Rids remain valid until the record is deleted, which is what lets the
//! hash join remember build-side rows by address and revisit them with
//! `move_to_rid`.
//!
//! ## Temp Tables
//!
//! Temp tables are named `temp1`, `temp2`, ... by the owning
//! [`Transaction`] and vanish with their last handle. Sort runs, hash join
//! partitions and materialized inputs all live in temp tables.
//!
//! ## Module Structure
//!
//! - `record_file`: slotted in-memory storage for one table
//! - `table_scan`: the update cursor over a record file
//! - `temp_table`: handle for intermediate results
//! - `transaction`: configuration and temp table naming
//! - `catalog`: base tables and their statistics

mod catalog;
mod record_file;
mod table_scan;
mod temp_table;
mod transaction;

pub use catalog::{Catalog, StatInfo};
pub use record_file::RecordFile;
pub use table_scan::{SharedFile, TableScan};
pub use temp_table::TempTable;
pub use transaction::Transaction;
