//! # Query Error Taxonomy
//!
//! Every fallible operation in relq returns `eyre::Result`. The failures
//! that callers may want to tell apart are raised as [`QueryError`] values
//! converted into an `eyre::Report`, so they remain recoverable with
//! `report.downcast_ref::<QueryError>()`.
//!
//! ## Kinds
//!
//! | Variant          | Raised when                                              |
//! |------------------|----------------------------------------------------------|
//! | FieldNotFound    | a scan or plan is asked for a field outside its schema   |
//! | TypeMismatch     | an Int constant meets a Str constant in a comparison     |
//! | IntegerOverflow  | Sum/Avg accumulation leaves the i64 range                |
//! | TableNotFound    | the catalog has no table with the requested name         |
//! | ValueTooLong     | a string exceeds its field's declared maximum length     |
//! | InvalidRid       | `move_to_rid` targets a slot that holds no record        |
//! | NoCurrentRecord  | a cursor is read before `next()` or after exhaustion     |
//! | MalformedQuery   | a query descriptor fails validation before planning      |
//!
//! ## Propagation
//!
//! None of these are retried or downgraded. Operators forward child errors
//! unchanged with `?`; the caller owns the transaction and decides what to
//! do with it.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    FieldNotFound { field: String },
    TypeMismatch { left: &'static str, right: &'static str },
    IntegerOverflow { field: String },
    TableNotFound { table: String },
    ValueTooLong { field: String, max_len: usize, len: usize },
    InvalidRid { block: u64, slot: u32 },
    NoCurrentRecord,
    MalformedQuery(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::FieldNotFound { field } => write!(f, "field '{}' not found", field),
            QueryError::TypeMismatch { left, right } => {
                write!(f, "type mismatch: cannot compare {} with {}", left, right)
            }
            QueryError::IntegerOverflow { field } => {
                write!(f, "integer overflow while aggregating '{}'", field)
            }
            QueryError::TableNotFound { table } => write!(f, "table '{}' does not exist", table),
            QueryError::ValueTooLong { field, max_len, len } => write!(
                f,
                "value for '{}' has length {} but the field allows at most {}",
                field, len, max_len
            ),
            QueryError::InvalidRid { block, slot } => {
                write!(f, "no record at block {} slot {}", block, slot)
            }
            QueryError::NoCurrentRecord => write!(f, "cursor is not positioned on a record"),
            QueryError::MalformedQuery(msg) => write!(f, "malformed query: {}", msg),
        }
    }
}

impl std::error::Error for QueryError {}

/// Returns the [`QueryError`] carried by `report`, if any.
pub fn query_error(report: &eyre::Report) -> Option<&QueryError> {
    report.downcast_ref::<QueryError>()
}
