//! # Aggregation Functions
//!
//! [`AggregationFn`] is the closed set of aggregates a group-by computes.
//! Each variant carries its source field and running state:
//!
//! | Variant | Output field | Output type | Value |
//! |---------|--------------|-------------|-------|
//! | `Count` | `countof<f>` | Int | rows in the group |
//! | `Sum` | `sumof<f>` | Int | sum of an Int field |
//! | `Avg` | `avgof<f>` | Int | sum / count, rounded half away from zero |
//! | `Min` | `minof<f>` | type of `f` | smallest value |
//! | `Max` | `maxof<f>` | type of `f` | largest value |
//!
//! `process_first` resets the state from the first row of a group and
//! `process_next` folds in each following row. Sums are accumulated with
//! checked arithmetic; leaving the `i64` range fails with
//! `QueryError::IntegerOverflow`.

use crate::error::QueryError;
use crate::query::Scan;
use crate::types::{Constant, FieldType, Schema};
use eyre::Result;
use std::cmp::Ordering;

const COUNT_PREFIX: &str = "countof";
const SUM_PREFIX: &str = "sumof";
const AVG_PREFIX: &str = "avgof";
const MIN_PREFIX: &str = "minof";
const MAX_PREFIX: &str = "maxof";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationFn {
    Count { field: String, count: i64 },
    Sum { field: String, sum: i64 },
    Avg { field: String, sum: i64, count: i64 },
    Min { field: String, value: Option<Constant> },
    Max { field: String, value: Option<Constant> },
}

impl AggregationFn {
    pub fn count(field: impl Into<String>) -> Self {
        AggregationFn::Count {
            field: field.into(),
            count: 0,
        }
    }

    pub fn sum(field: impl Into<String>) -> Self {
        AggregationFn::Sum {
            field: field.into(),
            sum: 0,
        }
    }

    pub fn avg(field: impl Into<String>) -> Self {
        AggregationFn::Avg {
            field: field.into(),
            sum: 0,
            count: 0,
        }
    }

    pub fn min(field: impl Into<String>) -> Self {
        AggregationFn::Min {
            field: field.into(),
            value: None,
        }
    }

    pub fn max(field: impl Into<String>) -> Self {
        AggregationFn::Max {
            field: field.into(),
            value: None,
        }
    }

    /// Recognizes an aggregate output name such as `sumofgradyear`.
    /// Returns `None` for plain field names and bare prefixes.
    pub fn parse(name: &str) -> Option<Self> {
        let candidates: [(&str, fn(&str) -> Self); 5] = [
            (COUNT_PREFIX, |f| Self::count(f)),
            (SUM_PREFIX, |f| Self::sum(f)),
            (AVG_PREFIX, |f| Self::avg(f)),
            (MIN_PREFIX, |f| Self::min(f)),
            (MAX_PREFIX, |f| Self::max(f)),
        ];
        candidates.iter().find_map(|(prefix, make)| {
            name.strip_prefix(prefix)
                .filter(|rest| !rest.is_empty())
                .map(*make)
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AggregationFn::Count { .. } => "count",
            AggregationFn::Sum { .. } => "sum",
            AggregationFn::Avg { .. } => "avg",
            AggregationFn::Min { .. } => "min",
            AggregationFn::Max { .. } => "max",
        }
    }

    pub fn source_field(&self) -> &str {
        match self {
            AggregationFn::Count { field, .. }
            | AggregationFn::Sum { field, .. }
            | AggregationFn::Avg { field, .. }
            | AggregationFn::Min { field, .. }
            | AggregationFn::Max { field, .. } => field,
        }
    }

    pub fn field_name(&self) -> String {
        format!("{}of{}", self.kind(), self.source_field())
    }

    /// Type of the output field given the input schema. Sum and Avg
    /// require an Int source.
    pub fn output_type(&self, input: &Schema) -> Result<FieldType> {
        let source = input.field_type(self.source_field())?;
        match self {
            AggregationFn::Count { .. } => Ok(FieldType::Int),
            AggregationFn::Sum { .. } | AggregationFn::Avg { .. } => match source {
                FieldType::Int => Ok(FieldType::Int),
                other => Err(QueryError::TypeMismatch {
                    left: FieldType::Int.kind(),
                    right: other.kind(),
                }
                .into()),
            },
            AggregationFn::Min { .. } | AggregationFn::Max { .. } => Ok(source),
        }
    }

    pub fn process_first<S: Scan + ?Sized>(&mut self, scan: &S) -> Result<()> {
        match self {
            AggregationFn::Count { count, .. } => *count = 1,
            AggregationFn::Sum { field, sum } => *sum = scan.get_int(field)?,
            AggregationFn::Avg { field, sum, count } => {
                *sum = scan.get_int(field)?;
                *count = 1;
            }
            AggregationFn::Min { field, value } | AggregationFn::Max { field, value } => {
                *value = Some(scan.get_val(field)?);
            }
        }
        Ok(())
    }

    pub fn process_next<S: Scan + ?Sized>(&mut self, scan: &S) -> Result<()> {
        match self {
            AggregationFn::Count { count, .. } => *count += 1,
            AggregationFn::Sum { field, sum } => {
                *sum = checked_add(*sum, scan.get_int(field)?, field)?;
            }
            AggregationFn::Avg { field, sum, count } => {
                *sum = checked_add(*sum, scan.get_int(field)?, field)?;
                *count += 1;
            }
            AggregationFn::Min { field, value } => {
                let candidate = scan.get_val(field)?;
                if replaces(value, &candidate, Ordering::Less)? {
                    *value = Some(candidate);
                }
            }
            AggregationFn::Max { field, value } => {
                let candidate = scan.get_val(field)?;
                if replaces(value, &candidate, Ordering::Greater)? {
                    *value = Some(candidate);
                }
            }
        }
        Ok(())
    }

    pub fn value(&self) -> Result<Constant> {
        match self {
            AggregationFn::Count { count, .. } => Ok(Constant::Int(*count)),
            AggregationFn::Sum { sum, .. } => Ok(Constant::Int(*sum)),
            AggregationFn::Avg { sum, count, .. } => Ok(Constant::Int(rounded_mean(*sum, *count))),
            AggregationFn::Min { value, .. } | AggregationFn::Max { value, .. } => {
                value.clone().ok_or_else(|| QueryError::NoCurrentRecord.into())
            }
        }
    }
}

fn checked_add(acc: i64, v: i64, field: &str) -> Result<i64> {
    acc.checked_add(v).ok_or_else(|| {
        QueryError::IntegerOverflow {
            field: field.to_string(),
        }
        .into()
    })
}

fn replaces(current: &Option<Constant>, candidate: &Constant, wins_when: Ordering) -> Result<bool> {
    match current {
        Some(v) => Ok(candidate.compare(v)? == wins_when),
        None => Ok(true),
    }
}

fn rounded_mean(sum: i64, count: i64) -> i64 {
    if count == 0 {
        return 0;
    }
    let (sum, count) = (sum as i128, count as i128);
    let quotient = sum / count;
    let remainder = sum % count;
    let rounded = if 2 * remainder.abs() >= count {
        quotient + sum.signum()
    } else {
        quotient
    };
    rounded as i64
}
