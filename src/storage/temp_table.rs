use super::{RecordFile, SharedFile, TableScan};
use crate::types::Schema;
use parking_lot::RwLock;
use std::sync::Arc;

/// A transaction-scoped table used to hold intermediate results
/// (materialized inputs, hash join partitions, sorted runs).
///
/// Cloning a `TempTable` shares the underlying records; the rows are
/// dropped with the last handle.
#[derive(Clone)]
pub struct TempTable {
    name: String,
    schema: Schema,
    file: SharedFile,
}

impl TempTable {
    pub(crate) fn new(name: String, schema: Schema, block_size: usize) -> Self {
        let file = Arc::new(RwLock::new(RecordFile::new(schema.clone(), block_size)));
        Self { name, schema, file }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn open(&self) -> TableScan {
        TableScan::new(Arc::clone(&self.file))
    }

    pub fn record_count(&self) -> usize {
        self.file.read().record_count()
    }

    pub fn block_count(&self) -> usize {
        self.file.read().block_count()
    }
}

impl std::fmt::Debug for TempTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempTable")
            .field("name", &self.name)
            .field("records", &self.record_count())
            .finish()
    }
}
