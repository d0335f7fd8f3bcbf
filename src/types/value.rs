//! # Runtime Value Representation
//!
//! This module provides [`Constant`], the scalar every operator compares,
//! hashes and copies. The data model has no NULL, so a constant is always
//! either an integer or a string.
//!
//! ## Comparison Semantics
//!
//! - Int vs Int and Str vs Str compare by value
//! - Int vs Str is an error (`QueryError::TypeMismatch`), never an
//!   arbitrary cross-kind order
//!
//! `Constant` does not implement `Ord`; ordering goes through the fallible
//! [`Constant::compare`].
//! `Eq`/`Hash` are derived from the held value, which is what the hash join
//! build table relies on.

use crate::error::QueryError;
use eyre::Result;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i64),
    Str(String),
}

impl Constant {
    pub fn kind(&self) -> &'static str {
        match self {
            Constant::Int(_) => "int",
            Constant::Str(_) => "varchar",
        }
    }

    pub fn compare(&self, other: &Constant) -> Result<Ordering> {
        match (self, other) {
            (Constant::Int(a), Constant::Int(b)) => Ok(a.cmp(b)),
            (Constant::Str(a), Constant::Str(b)) => Ok(a.cmp(b)),
            _ => Err(QueryError::TypeMismatch {
                left: self.kind(),
                right: other.kind(),
            }
            .into()),
        }
    }

    /// Equality through the ordering, so mixed kinds fail instead of
    /// comparing unequal.
    pub fn equals(&self, other: &Constant) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Equal)
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Constant::Int(i) => Ok(*i),
            Constant::Str(_) => Err(QueryError::TypeMismatch {
                left: "int",
                right: self.kind(),
            }
            .into()),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Constant::Str(s) => Ok(s),
            Constant::Int(_) => Err(QueryError::TypeMismatch {
                left: "varchar",
                right: self.kind(),
            }
            .into()),
        }
    }

    /// Bucket in `[0, buckets)` for this value. The hash is reduced with a
    /// Euclidean remainder so negative hashes cannot index out of range.
    pub fn bucket(&self, buckets: usize) -> usize {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        let hash = hasher.finish() as i64;
        hash.rem_euclid(buckets.max(1) as i64) as usize
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Constant {
    fn from(v: i64) -> Self {
        Constant::Int(v)
    }
}

impl From<i32> for Constant {
    fn from(v: i32) -> Self {
        Constant::Int(v as i64)
    }
}

impl From<&str> for Constant {
    fn from(v: &str) -> Self {
        Constant::Str(v.to_string())
    }
}

impl From<String> for Constant {
    fn from(v: String) -> Self {
        Constant::Str(v)
    }
}
