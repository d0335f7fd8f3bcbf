//! # External Merge Sort
//!
//! [`SortPlan`] sorts its input by an [`OrderData`] using temp tables as
//! run storage, optionally removing duplicate rows.
//!
//! ## Phases (all in `open()`)
//!
//! ```text
//! input ──split──> run1 run2 run3 run4 run5      maximal ascending runs
//!       ──merge──> run12 run34 run5              pairwise, front to back
//!       ──merge──> run1234 run5
//!       ──merge──> run12345                      until one run remains
//!       ──dedup──> (distinct only) one row per duplicate group
//! ```
//!
//! A new run starts whenever the next input row compares less than the
//! row just written, so already-sorted input produces a single run and is
//! never merged. An unpaired trailing run passes through a merge pass
//! unchanged.
//!
//! [`SortScan`] reads the final run (none for empty input). It can save and
//! restore its position, which the merge join uses to rescan a group of
//! equal keys.
//!
//! ## Distinct
//!
//! With `distinct` the comparator is extended by every remaining field of
//! the schema (ascending), so rows that are equal in all fields end up
//! adjacent. Duplicate removal then walks the sorted run with two cursors
//! one row apart and keeps the first row of each group.

use super::{materialized_blocks, OrderData, RecordComparator};
use crate::error::QueryError;
use crate::query::{copy_record, Plan, PlanRef, Scan, UpdateScan};
use crate::storage::{TableScan, TempTable, Transaction};
use crate::types::{Constant, Rid, Schema};
use eyre::Result;
use std::cmp::Ordering;
use tracing::debug;

pub struct SortPlan {
    tx: Transaction,
    plan: PlanRef,
    comparator: RecordComparator,
    distinct: bool,
}

impl SortPlan {
    /// Fails with `FieldNotFound` if an order key names a field the input
    /// does not produce.
    pub fn new(tx: &Transaction, plan: PlanRef, order: OrderData) -> Result<Self> {
        Self::with_distinct(tx, plan, order, false)
    }

    pub fn with_distinct(
        tx: &Transaction,
        plan: PlanRef,
        order: OrderData,
        distinct: bool,
    ) -> Result<Self> {
        for key in order.keys() {
            plan.schema().field_type(key.field())?;
        }
        let order = if distinct {
            order.covering(plan.schema())
        } else {
            order
        };
        Ok(Self {
            tx: tx.clone(),
            plan,
            comparator: RecordComparator::new(order),
            distinct,
        })
    }

    pub fn open_sorted(&self) -> Result<SortScan> {
        let mut src = self.plan.open()?;
        let mut runs = self.split_into_runs(src.as_mut())?;
        src.close()?;
        debug!(runs = runs.len(), "sort: generated runs");

        let mut pass = 0;
        while runs.len() > 1 {
            runs = self.merge_pass(runs)?;
            pass += 1;
            debug!(pass, runs = runs.len(), "sort: merge pass");
        }
        let mut run = runs.pop();
        if self.distinct {
            run = match run {
                Some(sorted) => Some(self.remove_duplicates(&sorted)?),
                None => None,
            };
        }

        Ok(SortScan::new(
            run.as_ref().map(TempTable::open),
            self.plan.schema().clone(),
        ))
    }

    fn split_into_runs(&self, src: &mut dyn Scan) -> Result<Vec<TempTable>> {
        let schema = self.plan.schema();
        let mut runs = Vec::new();
        src.before_first()?;
        if !src.next()? {
            return Ok(runs);
        }
        let mut run = self.tx.new_temp_table(schema);
        let mut dest = run.open();
        loop {
            copy_record(&*src, &mut dest, schema)?;
            if !src.next()? {
                break;
            }
            if self.comparator.compare(&*src, &dest)? == Ordering::Less {
                dest.close()?;
                runs.push(run);
                run = self.tx.new_temp_table(schema);
                dest = run.open();
            }
        }
        dest.close()?;
        runs.push(run);
        Ok(runs)
    }

    fn merge_pass(&self, runs: Vec<TempTable>) -> Result<Vec<TempTable>> {
        let mut merged = Vec::with_capacity(runs.len().div_ceil(2));
        let mut iter = runs.into_iter();
        while let Some(first) = iter.next() {
            match iter.next() {
                Some(second) => merged.push(self.merge_two(&first, &second)?),
                None => merged.push(first),
            }
        }
        Ok(merged)
    }

    fn merge_two(&self, first: &TempTable, second: &TempTable) -> Result<TempTable> {
        let schema = self.plan.schema();
        let result = self.tx.new_temp_table(schema);
        let mut src1 = first.open();
        let mut src2 = second.open();
        let mut dest = result.open();

        let mut more1 = src1.next()?;
        let mut more2 = src2.next()?;
        while more1 && more2 {
            if self.comparator.compare(&src1, &src2)? != Ordering::Greater {
                copy_record(&src1, &mut dest, schema)?;
                more1 = src1.next()?;
            } else {
                copy_record(&src2, &mut dest, schema)?;
                more2 = src2.next()?;
            }
        }
        while more1 {
            copy_record(&src1, &mut dest, schema)?;
            more1 = src1.next()?;
        }
        while more2 {
            copy_record(&src2, &mut dest, schema)?;
            more2 = src2.next()?;
        }
        src1.close()?;
        src2.close()?;
        dest.close()?;
        Ok(result)
    }

    fn remove_duplicates(&self, sorted: &TempTable) -> Result<TempTable> {
        let schema = self.plan.schema();
        let result = self.tx.new_temp_table(schema);
        let mut dest = result.open();
        let mut prev = sorted.open();
        let mut cur = sorted.open();

        if cur.next()? {
            copy_record(&cur, &mut dest, schema)?;
            prev.next()?;
            while cur.next()? {
                if !same_row(&prev, &cur, schema)? {
                    copy_record(&cur, &mut dest, schema)?;
                }
                prev.next()?;
            }
        }
        prev.close()?;
        cur.close()?;
        dest.close()?;
        debug!(
            before = sorted.record_count(),
            after = result.record_count(),
            "sort: removed duplicates"
        );
        Ok(result)
    }
}

fn same_row(a: &TableScan, b: &TableScan, schema: &Schema) -> Result<bool> {
    for field in schema.fields() {
        if a.get_val(field)?.compare(&b.get_val(field)?)? != Ordering::Equal {
            return Ok(false);
        }
    }
    Ok(true)
}

impl Plan for SortPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        Ok(Box::new(self.open_sorted()?))
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

/// Saved cursor of a [`SortScan`]; `None` when it was not on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortPosition(Option<Rid>);

pub struct SortScan {
    run: Option<TableScan>,
    on_row: bool,
    schema: Schema,
}

impl SortScan {
    fn new(run: Option<TableScan>, schema: Schema) -> Self {
        Self {
            run,
            on_row: false,
            schema,
        }
    }

    /// Number of sorted runs behind this scan: 0 for empty input, else 1.
    pub fn run_count(&self) -> usize {
        usize::from(self.run.is_some())
    }

    pub fn save_position(&self) -> Result<SortPosition> {
        match (&self.run, self.on_row) {
            (Some(run), true) => Ok(SortPosition(Some(run.get_rid()?))),
            _ => Ok(SortPosition(None)),
        }
    }

    /// Returns to a saved position. Restoring a position that was not on a
    /// row leaves the scan exhausted.
    pub fn restore_position(&mut self, pos: &SortPosition) -> Result<()> {
        let Some(run) = self.run.as_mut() else {
            self.on_row = false;
            return Ok(());
        };
        match pos.0 {
            Some(rid) => {
                run.move_to_rid(rid)?;
                self.on_row = true;
            }
            None => {
                run.close()?;
                self.on_row = false;
            }
        }
        Ok(())
    }
}

impl Scan for SortScan {
    fn before_first(&mut self) -> Result<()> {
        self.on_row = false;
        match self.run.as_mut() {
            Some(run) => run.before_first(),
            None => Ok(()),
        }
    }

    fn next(&mut self) -> Result<bool> {
        self.on_row = match self.run.as_mut() {
            Some(run) => run.next()?,
            None => false,
        };
        Ok(self.on_row)
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        if !self.schema.has_field(field) {
            return Err(QueryError::FieldNotFound {
                field: field.to_string(),
            }
            .into());
        }
        match (&self.run, self.on_row) {
            (Some(run), true) => run.get_val(field),
            _ => Err(QueryError::NoCurrentRecord.into()),
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.schema.has_field(field)
    }

    fn close(&mut self) -> Result<()> {
        self.on_row = false;
        match self.run.as_mut() {
            Some(run) => run.close(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::collect_rows;
    use crate::storage::Catalog;
    use crate::test_util::{int_table, ints};

    fn table(values: &[i64]) -> (Transaction, PlanRef) {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let rows: Vec<Vec<i64>> = values.iter().map(|v| vec![*v]).collect();
        let refs: Vec<&[i64]> = rows.iter().map(|r| r.as_slice()).collect();
        let plan = int_table(&catalog, &tx, "t", &["a"], &refs);
        (tx, plan)
    }

    #[test]
    fn sorts_ascending_and_descending() {
        let (tx, input) = table(&[5, 3, 8, 1, 9, 2]);
        let plan = SortPlan::new(&tx, input.clone(), OrderData::ascending(["a"])).unwrap();
        let rows = collect_rows(&mut plan.open().unwrap(), &["a"]).unwrap();
        assert_eq!(ints(rows), vec![vec![1], vec![2], vec![3], vec![5], vec![8], vec![9]]);

        let plan = SortPlan::new(&tx, input, OrderData::new().desc("a")).unwrap();
        let rows = collect_rows(&mut plan.open().unwrap(), &["a"]).unwrap();
        assert_eq!(ints(rows), vec![vec![9], vec![8], vec![5], vec![3], vec![2], vec![1]]);
    }

    #[test]
    fn sorted_input_forms_a_single_run() {
        let (tx, input) = table(&[1, 2, 2, 3]);
        let plan = SortPlan::new(&tx, input, OrderData::ascending(["a"])).unwrap();
        let scan = plan.open_sorted().unwrap();
        assert_eq!(scan.run_count(), 1);
        assert_eq!(tx.temp_tables_created(), 1);
    }

    #[test]
    fn descending_input_is_merged_down_to_one_run() {
        let (tx, input) = table(&[6, 5, 4, 3, 2, 1]);
        let plan = SortPlan::new(&tx, input, OrderData::ascending(["a"])).unwrap();
        let mut scan = plan.open_sorted().unwrap();
        assert_eq!(scan.run_count(), 1);
        let rows = collect_rows(&mut scan, &["a"]).unwrap();
        assert_eq!(ints(rows), vec![vec![1], vec![2], vec![3], vec![4], vec![5], vec![6]]);
    }

    #[test]
    fn distinct_keeps_one_row_per_value() {
        let (tx, input) = table(&[3, 1, 3, 2, 1, 3]);
        let plan = SortPlan::with_distinct(&tx, input, OrderData::ascending(["a"]), true).unwrap();
        let rows = collect_rows(&mut plan.open().unwrap(), &["a"]).unwrap();
        assert_eq!(ints(rows), vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn empty_input_gives_empty_scan() {
        let (tx, input) = table(&[]);
        let plan = SortPlan::with_distinct(&tx, input, OrderData::ascending(["a"]), true).unwrap();
        let mut scan = plan.open().unwrap();
        assert!(!scan.next().unwrap());
        assert!(scan.get_val("a").is_err());
    }

    #[test]
    fn unknown_order_field_is_rejected() {
        let (tx, input) = table(&[1]);
        assert!(SortPlan::new(&tx, input, OrderData::ascending(["zz"])).is_err());
    }

    #[test]
    fn restore_position_rewinds_to_saved_row() {
        let (tx, input) = table(&[4, 2, 3, 1]);
        let plan = SortPlan::new(&tx, input, OrderData::ascending(["a"])).unwrap();
        let mut scan = plan.open_sorted().unwrap();
        scan.next().unwrap();
        scan.next().unwrap();
        let pos = scan.save_position().unwrap();
        assert_eq!(scan.get_int("a").unwrap(), 2);
        while scan.next().unwrap() {}

        scan.restore_position(&pos).unwrap();
        assert_eq!(scan.get_int("a").unwrap(), 2);
        assert!(scan.next().unwrap());
        assert_eq!(scan.get_int("a").unwrap(), 3);
    }
}
