//! # Table Scan
//!
//! [`TableScan`] is the [`UpdateScan`] over one [`RecordFile`]. Base tables
//! and temp tables use the same cursor; only the file behind it differs.
//!
//! ## Cursor States
//!
//! ```text
//! BeforeFirst ──next()──> At(rid) ──next()──> ... ──next()──> AfterLast
//!      ^                                                         │
//!      └──────────────────────── before_first() ─────────────────┘
//! ```
//!
//! `insert()` and `move_to_rid()` jump straight to `At(rid)`. Reads require
//! `At(rid)` and a slot that is still occupied; anything else reports
//! `QueryError::NoCurrentRecord`.
//!
//! The file is shared behind a `parking_lot::RwLock`, so several cursors
//! can be open over the same table at once (the sort reads a temp table
//! with two cursors while removing duplicates). Locks are taken per call and
//! never held across calls.

use crate::error::QueryError;
use crate::query::{Scan, UpdateScan};
use crate::types::{Constant, Rid, Schema};
use eyre::Result;
use parking_lot::RwLock;
use std::sync::Arc;

use super::RecordFile;

pub type SharedFile = Arc<RwLock<RecordFile>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    At(Rid),
    AfterLast,
}

pub struct TableScan {
    file: SharedFile,
    schema: Schema,
    position: Position,
}

impl TableScan {
    pub fn new(file: SharedFile) -> Self {
        let schema = file.read().schema().clone();
        Self {
            file,
            schema,
            position: Position::BeforeFirst,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn current(&self) -> Result<Rid> {
        match self.position {
            Position::At(rid) => Ok(rid),
            _ => Err(QueryError::NoCurrentRecord.into()),
        }
    }

    fn cursor(&self) -> Option<Rid> {
        match self.position {
            Position::At(rid) => Some(rid),
            _ => None,
        }
    }
}

impl Scan for TableScan {
    fn before_first(&mut self) -> Result<()> {
        self.position = Position::BeforeFirst;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let next = match self.position {
            Position::AfterLast => None,
            Position::BeforeFirst => self.file.read().next_used(None),
            Position::At(rid) => self.file.read().next_used(Some(rid)),
        };
        self.position = match next {
            Some(rid) => Position::At(rid),
            None => Position::AfterLast,
        };
        Ok(next.is_some())
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        let idx = self
            .schema
            .index_of(field)
            .ok_or_else(|| QueryError::FieldNotFound {
                field: field.to_string(),
            })?;
        let rid = self.current()?;
        let file = self.file.read();
        let record = file.record(rid).ok_or(QueryError::NoCurrentRecord)?;
        Ok(record[idx].clone())
    }

    fn has_field(&self, field: &str) -> bool {
        self.schema.has_field(field)
    }

    fn close(&mut self) -> Result<()> {
        self.position = Position::AfterLast;
        Ok(())
    }
}

impl UpdateScan for TableScan {
    fn set_val(&mut self, field: &str, value: Constant) -> Result<()> {
        let rid = self.current()?;
        self.file.write().set(rid, field, value)
    }

    fn insert(&mut self) -> Result<()> {
        let rid = self.file.write().insert_after(self.cursor());
        self.position = Position::At(rid);
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        let rid = self.current()?;
        self.file.write().delete(rid)
    }

    fn get_rid(&self) -> Result<Rid> {
        self.current()
    }

    fn move_to_rid(&mut self, rid: Rid) -> Result<()> {
        if self.file.read().record(rid).is_none() {
            return Err(QueryError::InvalidRid {
                block: rid.block,
                slot: rid.slot,
            }
            .into());
        }
        self.position = Position::At(rid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::query_error;

    fn scan_with(values: &[i64]) -> TableScan {
        let schema = Schema::new().with_int("a").with_string("b", 5);
        let file = Arc::new(RwLock::new(RecordFile::new(schema, 400)));
        let mut scan = TableScan::new(file);
        for v in values {
            scan.insert().unwrap();
            scan.set_int("a", *v).unwrap();
            scan.set_string("b", &format!("r{}", v)).unwrap();
        }
        scan.before_first().unwrap();
        scan
    }

    #[test]
    fn iterates_inserted_rows_in_order() {
        let mut scan = scan_with(&[3, 1, 2]);
        let mut seen = Vec::new();
        while scan.next().unwrap() {
            seen.push(scan.get_int("a").unwrap());
        }
        assert_eq!(seen, vec![3, 1, 2]);
        assert!(!scan.next().unwrap());
    }

    #[test]
    fn reads_outside_a_row_fail() {
        let mut scan = scan_with(&[1]);
        let err = scan.get_val("a").unwrap_err();
        assert_eq!(query_error(&err), Some(&QueryError::NoCurrentRecord));

        scan.next().unwrap();
        let err = scan.get_val("zz").unwrap_err();
        assert_eq!(
            query_error(&err),
            Some(&QueryError::FieldNotFound { field: "zz".into() })
        );
    }

    #[test]
    fn move_to_rid_revisits_a_row() {
        let mut scan = scan_with(&[10, 20, 30]);
        scan.next().unwrap();
        scan.next().unwrap();
        let rid = scan.get_rid().unwrap();
        while scan.next().unwrap() {}

        scan.move_to_rid(rid).unwrap();
        assert_eq!(scan.get_int("a").unwrap(), 20);
        assert_eq!(scan.get_string("b").unwrap(), "r20");
    }

    #[test]
    fn move_to_deleted_rid_is_invalid() {
        let mut scan = scan_with(&[1, 2]);
        scan.next().unwrap();
        let rid = scan.get_rid().unwrap();
        scan.delete().unwrap();

        let err = scan.move_to_rid(rid).unwrap_err();
        assert_eq!(
            query_error(&err),
            Some(&QueryError::InvalidRid {
                block: rid.block,
                slot: rid.slot
            })
        );
        scan.before_first().unwrap();
        assert!(scan.next().unwrap());
        assert_eq!(scan.get_int("a").unwrap(), 2);
        assert!(!scan.next().unwrap());
    }

    #[test]
    fn two_cursors_share_one_file() {
        let mut first = scan_with(&[1, 2]);
        let mut second = TableScan::new(Arc::clone(&first.file));
        first.next().unwrap();
        second.next().unwrap();
        second.next().unwrap();
        assert_eq!(first.get_int("a").unwrap(), 1);
        assert_eq!(second.get_int("a").unwrap(), 2);
    }
}
