use crate::query::{equijoin_records_output, joined_distinct_values, Plan, PlanRef, Scan};
use crate::types::{Constant, Schema};
use eyre::Result;
use std::cmp::Ordering;

/// Equijoin by rescanning the right input once per left row. Nothing is
/// materialized.
///
/// `blocks_accessed` is `B(left) + B(right)`; rescans of the right input
/// are not counted.
pub struct NestedJoinPlan {
    left: PlanRef,
    right: PlanRef,
    left_field: String,
    right_field: String,
    schema: Schema,
}

impl NestedJoinPlan {
    pub fn new(left: PlanRef, right: PlanRef, left_field: &str, right_field: &str) -> Result<Self> {
        left.schema().field_type(left_field)?;
        right.schema().field_type(right_field)?;
        let mut schema = left.schema().clone();
        schema.add_all(right.schema());
        Ok(Self {
            left,
            right,
            left_field: left_field.to_string(),
            right_field: right_field.to_string(),
            schema,
        })
    }
}

impl Plan for NestedJoinPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let left = self.left.open()?;
        let right = self.right.open()?;
        Ok(Box::new(NestedJoinScan::new(
            left,
            right,
            &self.left_field,
            &self.right_field,
        )?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.left
            .blocks_accessed()
            .saturating_add(self.right.blocks_accessed())
    }

    fn records_output(&self) -> usize {
        equijoin_records_output(
            self.left.as_ref(),
            self.right.as_ref(),
            &self.left_field,
            &self.right_field,
        )
    }

    fn distinct_values(&self, field: &str) -> usize {
        joined_distinct_values(self.left.as_ref(), self.right.as_ref(), field)
    }
}

pub struct NestedJoinScan {
    left: Box<dyn Scan>,
    right: Box<dyn Scan>,
    left_field: String,
    right_field: String,
    left_has_row: bool,
}

impl NestedJoinScan {
    pub fn new(
        left: Box<dyn Scan>,
        right: Box<dyn Scan>,
        left_field: &str,
        right_field: &str,
    ) -> Result<Self> {
        let mut scan = Self {
            left,
            right,
            left_field: left_field.to_string(),
            right_field: right_field.to_string(),
            left_has_row: false,
        };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for NestedJoinScan {
    fn before_first(&mut self) -> Result<()> {
        self.left.before_first()?;
        self.right.before_first()?;
        self.left_has_row = self.left.next()?;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        while self.left_has_row {
            let key = self.left.get_val(&self.left_field)?;
            while self.right.next()? {
                let probe = self.right.get_val(&self.right_field)?;
                if key.compare(&probe)? == Ordering::Equal {
                    return Ok(true);
                }
            }
            self.right.before_first()?;
            self.left_has_row = self.left.next()?;
        }
        Ok(false)
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        if self.right.has_field(field) {
            self.right.get_val(field)
        } else {
            self.left.get_val(field)
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.right.has_field(field) || self.left.has_field(field)
    }

    fn close(&mut self) -> Result<()> {
        self.left_has_row = false;
        self.left.close()?;
        self.right.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::collect_rows;
    use crate::storage::{Catalog, Transaction};
    use crate::test_util::{int_table, ints};

    #[test]
    fn joins_on_equal_keys_in_left_then_right_order() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let left = int_table(&catalog, &tx, "l", &["a", "k"], &[&[1, 7], &[2, 8], &[3, 7]]);
        let right = int_table(&catalog, &tx, "r", &["k2", "b"], &[&[7, 10], &[9, 20], &[7, 30]]);
        let plan = NestedJoinPlan::new(left, right, "k", "k2").unwrap();

        let rows = collect_rows(&mut plan.open().unwrap(), &["a", "b"]).unwrap();
        assert_eq!(
            ints(rows),
            vec![vec![1, 10], vec![1, 30], vec![3, 10], vec![3, 30]]
        );
    }

    #[test]
    fn estimates_follow_uniform_distribution() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let left = int_table(&catalog, &tx, "l", &["k"], &[&[1], &[2], &[2], &[3]]);
        let right = int_table(&catalog, &tx, "r", &["k2"], &[&[1], &[2]]);
        let plan = NestedJoinPlan::new(left.clone(), right.clone(), "k", "k2").unwrap();

        assert_eq!(plan.records_output(), 4 * 2 / 3);
        assert_eq!(
            plan.blocks_accessed(),
            left.blocks_accessed() + right.blocks_accessed()
        );
    }

    #[test]
    fn empty_left_input_yields_nothing() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let left = int_table(&catalog, &tx, "l", &["k"], &[]);
        let right = int_table(&catalog, &tx, "r", &["k2"], &[&[1]]);
        let mut scan = NestedJoinPlan::new(left, right, "k", "k2").unwrap().open().unwrap();
        assert!(!scan.next().unwrap());
    }

    #[test]
    fn shared_field_resolves_from_the_right() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let left = int_table(&catalog, &tx, "l", &["k", "v"], &[&[1, 100]]);
        let right = int_table(&catalog, &tx, "r", &["k2", "v"], &[&[1, 200]]);
        let mut scan = NestedJoinPlan::new(left, right, "k", "k2").unwrap().open().unwrap();
        assert!(scan.next().unwrap());
        assert_eq!(scan.get_int("v").unwrap(), 200);
    }
}
