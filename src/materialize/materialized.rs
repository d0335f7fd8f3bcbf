use crate::query::{copy_record, Plan, PlanRef, Scan};
use crate::storage::{TempTable, Transaction};
use crate::types::Schema;
use eyre::Result;
use tracing::debug;

/// Number of blocks `records` rows of `schema` occupy in a temp table.
pub fn materialized_blocks(records: usize, schema: &Schema, block_size: usize) -> usize {
    let per_block = (block_size / schema.slot_size()).max(1);
    records.div_ceil(per_block)
}

/// Copies its input into a temp table when opened and scans the copy.
pub struct MaterializePlan {
    tx: Transaction,
    plan: PlanRef,
}

impl MaterializePlan {
    pub fn new(tx: &Transaction, plan: PlanRef) -> Self {
        Self {
            tx: tx.clone(),
            plan,
        }
    }

    pub fn materialize(&self) -> Result<TempTable> {
        let schema = self.plan.schema();
        let table = self.tx.new_temp_table(schema);
        let mut src = self.plan.open()?;
        let mut dest = table.open();
        while src.next()? {
            copy_record(src.as_ref(), &mut dest, schema)?;
        }
        src.close()?;
        dest.close()?;
        debug!(
            table = table.name(),
            records = table.record_count(),
            "materialized input"
        );
        Ok(table)
    }
}

impl Plan for MaterializePlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        Ok(Box::new(self.materialize()?.open()))
    }

    fn schema(&self) -> &Schema {
        self.plan.schema()
    }

    fn blocks_accessed(&self) -> usize {
        materialized_blocks(
            self.plan.records_output(),
            self.plan.schema(),
            self.tx.block_size(),
        )
    }

    fn records_output(&self) -> usize {
        self.plan.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.plan.distinct_values(field)
    }
}
