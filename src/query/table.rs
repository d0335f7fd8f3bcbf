use crate::query::{Plan, Scan};
use crate::storage::{Catalog, StatInfo};
use crate::types::Schema;
use eyre::Result;

/// Leaf plan reading one base table from the catalog. Estimates come
/// straight from the table's statistics, captured when the plan is built.
pub struct TablePlan {
    catalog: Catalog,
    table: String,
    schema: Schema,
    stats: StatInfo,
}

impl TablePlan {
    pub fn new(catalog: &Catalog, table: &str) -> Result<Self> {
        let schema = catalog.schema(table)?;
        let stats = catalog.stat_info(table)?;
        Ok(Self {
            catalog: catalog.clone(),
            table: table.to_string(),
            schema,
            stats,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }
}

impl Plan for TablePlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        Ok(Box::new(self.catalog.open_table(&self.table)?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.stats.blocks_accessed()
    }

    fn records_output(&self) -> usize {
        self.stats.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.stats.distinct_values(field)
    }
}
