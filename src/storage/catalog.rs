//! # Catalog and Statistics
//!
//! The [`Catalog`] maps table names to their schema and record file and
//! derives the statistics the cost model reads:
//!
//! | Statistic | Source |
//! |-----------|--------|
//! | `blocks` | blocks allocated by the record file |
//! | `records` | live records |
//! | `distinct_values(f)` | exact count of distinct values of `f` |
//!
//! Statistics are recomputed on request by scanning the table. Fields
//! without a computed count fall back to `1 + records / 3`.

use super::{RecordFile, SharedFile, TableScan, Transaction};
use crate::error::QueryError;
use crate::query::{Scan, UpdateScan};
use crate::types::{Constant, Rid, Schema};
use eyre::{ensure, Result};
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatInfo {
    blocks: usize,
    records: usize,
    distinct: HashMap<String, usize>,
}

impl StatInfo {
    pub fn new(blocks: usize, records: usize) -> Self {
        Self {
            blocks,
            records,
            distinct: HashMap::new(),
        }
    }

    pub fn with_distinct(mut self, field: impl Into<String>, count: usize) -> Self {
        self.distinct.insert(field.into(), count);
        self
    }

    pub fn blocks_accessed(&self) -> usize {
        self.blocks
    }

    pub fn records_output(&self) -> usize {
        self.records
    }

    pub fn distinct_values(&self, field: &str) -> usize {
        self.distinct
            .get(field)
            .copied()
            .unwrap_or(1 + self.records / 3)
    }
}

#[derive(Clone)]
struct TableEntry {
    schema: Schema,
    file: SharedFile,
}

#[derive(Clone, Default)]
pub struct Catalog {
    tables: Arc<RwLock<HashMap<String, TableEntry>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&self, tx: &Transaction, name: &str, schema: Schema) -> Result<()> {
        let mut tables = self.tables.write();
        ensure!(!tables.contains_key(name), "table '{}' already exists", name);
        let file = Arc::new(RwLock::new(RecordFile::new(
            schema.clone(),
            tx.block_size(),
        )));
        tables.insert(name.to_string(), TableEntry { schema, file });
        debug!(table = name, "created table");
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<TableEntry> {
        self.tables.read().get(name).cloned().ok_or_else(|| {
            QueryError::TableNotFound {
                table: name.to_string(),
            }
            .into()
        })
    }

    pub fn schema(&self, name: &str) -> Result<Schema> {
        Ok(self.entry(name)?.schema)
    }

    pub fn open_table(&self, name: &str) -> Result<TableScan> {
        let entry = self.entry(name)?;
        Ok(TableScan::new(entry.file))
    }

    /// Appends one row, values given in schema order.
    pub fn insert_row(&self, name: &str, values: &[Constant]) -> Result<Rid> {
        let entry = self.entry(name)?;
        ensure!(
            values.len() == entry.schema.len(),
            "table '{}' has {} fields, got {} values",
            name,
            entry.schema.len(),
            values.len()
        );
        for (field, value) in entry.schema.fields().zip(values) {
            entry.schema.check_value(field, value)?;
        }
        let mut scan = TableScan::new(entry.file);
        scan.insert()?;
        for (field, value) in entry.schema.fields().zip(values) {
            scan.set_val(field, value.clone())?;
        }
        scan.get_rid()
    }

    pub fn stat_info(&self, name: &str) -> Result<StatInfo> {
        let entry = self.entry(name)?;
        let blocks = entry.file.read().block_count();

        let mut seen: Vec<HashSet<Constant>> = vec![HashSet::new(); entry.schema.len()];
        let mut records = 0;
        let mut scan = TableScan::new(entry.file);
        while scan.next()? {
            records += 1;
            for (set, field) in seen.iter_mut().zip(entry.schema.fields()) {
                set.insert(scan.get_val(field)?);
            }
        }
        scan.close()?;

        let mut stats = StatInfo::new(blocks, records);
        for (set, field) in seen.into_iter().zip(entry.schema.fields()) {
            stats = stats.with_distinct(field, set.len());
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::query_error;

    fn catalog_with_rows() -> Catalog {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        catalog
            .create_table(&tx, "t", Schema::new().with_int("a").with_string("b", 4))
            .unwrap();
        for (a, b) in [(1, "x"), (2, "x"), (2, "y"), (3, "x")] {
            catalog
                .insert_row("t", &[Constant::Int(a), Constant::from(b)])
                .unwrap();
        }
        catalog
    }

    #[test]
    fn stat_info_counts_distinct_values() {
        let stats = catalog_with_rows().stat_info("t").unwrap();
        assert_eq!(stats.records_output(), 4);
        assert_eq!(stats.blocks_accessed(), 1);
        assert_eq!(stats.distinct_values("a"), 3);
        assert_eq!(stats.distinct_values("b"), 2);
    }

    #[test]
    fn unknown_field_uses_fallback_estimate() {
        let stats = StatInfo::new(2, 9);
        assert_eq!(stats.distinct_values("q"), 4);
    }

    #[test]
    fn missing_table_is_reported() {
        let err = Catalog::new().open_table("nope").err().unwrap();
        assert_eq!(
            query_error(&err),
            Some(&QueryError::TableNotFound {
                table: "nope".into()
            })
        );
    }

    #[test]
    fn insert_row_checks_arity_and_types() {
        let catalog = catalog_with_rows();
        assert!(catalog.insert_row("t", &[Constant::Int(1)]).is_err());
        assert!(catalog
            .insert_row("t", &[Constant::from("x"), Constant::from("y")])
            .is_err());
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        catalog.create_table(&tx, "t", Schema::new().with_int("a")).unwrap();
        assert!(catalog.create_table(&tx, "t", Schema::new()).is_err());
    }
}
