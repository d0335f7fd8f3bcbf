use crate::query::{PlanRef, TablePlan};
use crate::storage::{Catalog, Transaction};
use crate::types::{Constant, Schema};
use std::sync::Arc;

/// Creates an all-Int table and returns a plan over it.
pub fn int_table(
    catalog: &Catalog,
    tx: &Transaction,
    name: &str,
    fields: &[&str],
    rows: &[&[i64]],
) -> PlanRef {
    let schema = fields
        .iter()
        .fold(Schema::new(), |schema, f| schema.with_int(*f));
    catalog.create_table(tx, name, schema).unwrap();
    for row in rows {
        let values: Vec<Constant> = row.iter().map(|v| Constant::Int(*v)).collect();
        catalog.insert_row(name, &values).unwrap();
    }
    Arc::new(TablePlan::new(catalog, name).unwrap())
}

pub fn ints(rows: Vec<Vec<Constant>>) -> Vec<Vec<i64>> {
    rows.into_iter()
        .map(|row| row.iter().map(|c| c.as_int().unwrap()).collect())
        .collect()
}
