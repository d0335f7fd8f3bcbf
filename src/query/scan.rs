//! # Scan Protocol - Volcano Model Cursors
//!
//! A [`Scan`] is the live, pull-based cursor a plan produces when opened:
//!
//! - `before_first()`: rewind to the position before the first row
//! - `next()`: advance; `false` means exhausted
//! - `get_val()` / `get_int()` / `get_string()`: read a field of the current row
//! - `close()`: release child scans and temp-table cursors
//!
//! [`UpdateScan`] adds mutation and direct addressing. Only scans over
//! stored records (base tables and temp tables) implement it; the hash join
//! depends on `move_to_rid` to revisit rows it has only remembered by
//! address.
//!
//! Reading a field that is not part of the current row's schema fails with
//! `QueryError::FieldNotFound`. Reading after `next()` returned `false` is
//! undefined; implementations report `QueryError::NoCurrentRecord`.

use crate::error::QueryError;
use crate::types::{Constant, Rid, Schema};
use eyre::Result;

pub trait Scan {
    fn before_first(&mut self) -> Result<()>;
    fn next(&mut self) -> Result<bool>;
    fn get_val(&self, field: &str) -> Result<Constant>;
    fn has_field(&self, field: &str) -> bool;
    fn close(&mut self) -> Result<()>;

    fn get_int(&self, field: &str) -> Result<i64> {
        self.get_val(field)?.as_int()
    }

    fn get_string(&self, field: &str) -> Result<String> {
        match self.get_val(field)? {
            Constant::Str(s) => Ok(s),
            other => Err(QueryError::TypeMismatch {
                left: "varchar",
                right: other.kind(),
            }
            .into()),
        }
    }
}

pub trait UpdateScan: Scan {
    fn set_val(&mut self, field: &str, value: Constant) -> Result<()>;
    /// Appends an empty record and positions the cursor on it.
    fn insert(&mut self) -> Result<()>;
    fn delete(&mut self) -> Result<()>;
    fn get_rid(&self) -> Result<Rid>;
    fn move_to_rid(&mut self, rid: Rid) -> Result<()>;

    fn set_int(&mut self, field: &str, value: i64) -> Result<()> {
        self.set_val(field, Constant::Int(value))
    }

    fn set_string(&mut self, field: &str, value: &str) -> Result<()> {
        self.set_val(field, Constant::Str(value.to_string()))
    }
}

impl<S: Scan + ?Sized> Scan for Box<S> {
    fn before_first(&mut self) -> Result<()> {
        (**self).before_first()
    }

    fn next(&mut self) -> Result<bool> {
        (**self).next()
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        (**self).get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        (**self).has_field(field)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Inserts a new record into `dest` holding the current row of `src`,
/// restricted to the fields of `schema`.
pub fn copy_record<S, D>(src: &S, dest: &mut D, schema: &Schema) -> Result<()>
where
    S: Scan + ?Sized,
    D: UpdateScan + ?Sized,
{
    dest.insert()?;
    for field in schema.fields() {
        dest.set_val(field, src.get_val(field)?)?;
    }
    Ok(())
}

/// Drains `scan` into a vector of rows, one `Vec<Constant>` per row in
/// `fields` order. Closes the scan afterwards.
pub fn collect_rows<S: Scan + ?Sized>(scan: &mut S, fields: &[&str]) -> Result<Vec<Vec<Constant>>> {
    let mut rows = Vec::new();
    while scan.next()? {
        let mut row = Vec::with_capacity(fields.len());
        for field in fields {
            row.push(scan.get_val(field)?);
        }
        rows.push(row);
    }
    scan.close()?;
    Ok(rows)
}
