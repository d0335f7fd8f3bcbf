//! # Transaction Handle
//!
//! A [`Transaction`] carries the engine configuration and names the temp
//! tables created on its behalf. It is a cheap `Arc` handle: every plan that
//! materializes holds a clone, and all clones see the same temp counter.
//!
//! Temp table names are `temp1`, `temp2`, ... in creation order and are
//! unique for the lifetime of the transaction.

use super::TempTable;
use crate::config::{EngineConfig, TEMP_TABLE_PREFIX};
use crate::types::Schema;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct TxState {
    config: EngineConfig,
    temp_count: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct Transaction {
    state: Arc<TxState>,
}

impl Transaction {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: Arc::new(TxState {
                config,
                temp_count: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    pub fn block_size(&self) -> usize {
        self.state.config.block_size()
    }

    pub fn new_temp_table(&self, schema: &Schema) -> TempTable {
        let id = self.state.temp_count.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!("{}{}", TEMP_TABLE_PREFIX, id);
        TempTable::new(name, schema.clone(), self.block_size())
    }

    /// Number of temp tables created so far.
    pub fn temp_tables_created(&self) -> usize {
        self.state.temp_count.load(Ordering::Relaxed)
    }
}
