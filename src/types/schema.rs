//! # Record Schema
//!
//! A [`Schema`] is the ordered list of typed fields a plan produces. Lookups
//! are by name; the order is what projections and copies iterate over.
//! Field names are unique: adding a name that is already present keeps the
//! first definition, which gives join schemas union semantics.
//!
//! The schema also knows its slot size, which the cost model uses to convert
//! record counts into block counts:
//!
//! ```text
//! slot = RECORD_FLAG_SIZE + Σ field_size
//! field_size(Int)    = INT_FIELD_SIZE
//! field_size(Str(n)) = STR_LENGTH_PREFIX + n
//! ```

use crate::config::{INT_FIELD_SIZE, RECORD_FLAG_SIZE, STR_LENGTH_PREFIX};
use crate::error::QueryError;
use crate::types::Constant;
use eyre::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int,
    Str(usize),
}

impl FieldType {
    pub fn byte_size(&self) -> usize {
        match self {
            FieldType::Int => INT_FIELD_SIZE,
            FieldType::Str(max_len) => STR_LENGTH_PREFIX + max_len,
        }
    }

    pub fn same_kind(&self, other: &FieldType) -> bool {
        matches!(
            (self, other),
            (FieldType::Int, FieldType::Int) | (FieldType::Str(_), FieldType::Str(_))
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Str(_) => "varchar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<(String, FieldType)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_int(mut self, name: impl Into<String>) -> Self {
        self.add_field(name, FieldType::Int);
        self
    }

    pub fn with_string(mut self, name: impl Into<String>, max_len: usize) -> Self {
        self.add_field(name, FieldType::Str(max_len));
        self
    }

    pub fn add_field(&mut self, name: impl Into<String>, field_type: FieldType) {
        let name = name.into();
        if !self.has_field(&name) {
            self.fields.push((name, field_type));
        }
    }

    /// Copies one field definition from `other`.
    pub fn add(&mut self, name: &str, other: &Schema) -> Result<()> {
        let field_type = other.field_type(name)?;
        self.add_field(name, field_type);
        Ok(())
    }

    pub fn add_all(&mut self, other: &Schema) {
        for (name, field_type) in &other.fields {
            self.add_field(name.clone(), *field_type);
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn field_type(&self, name: &str) -> Result<FieldType> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
            .ok_or_else(|| {
                QueryError::FieldNotFound {
                    field: name.to_string(),
                }
                .into()
            })
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn slot_size(&self) -> usize {
        RECORD_FLAG_SIZE
            + self
                .fields
                .iter()
                .map(|(_, t)| t.byte_size())
                .sum::<usize>()
    }

    /// Verifies that `value` may be stored in `field`.
    pub fn check_value(&self, field: &str, value: &Constant) -> Result<()> {
        match (self.field_type(field)?, value) {
            (FieldType::Int, Constant::Int(_)) => Ok(()),
            (FieldType::Str(max_len), Constant::Str(s)) => {
                let len = s.chars().count();
                if len > max_len {
                    return Err(QueryError::ValueTooLong {
                        field: field.to_string(),
                        max_len,
                        len,
                    }
                    .into());
                }
                Ok(())
            }
            (field_type, value) => Err(QueryError::TypeMismatch {
                left: field_type.kind(),
                right: value.kind(),
            }
            .into()),
        }
    }
}
