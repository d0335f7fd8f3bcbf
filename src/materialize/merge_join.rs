use super::{OrderData, SortPlan, SortPosition, SortScan};
use crate::query::{equijoin_records_output, joined_distinct_values, Plan, PlanRef, Scan};
use crate::storage::Transaction;
use crate::types::{Constant, Schema};
use eyre::Result;
use std::cmp::Ordering;
use std::sync::Arc;

/// Sort-merge equijoin. Both inputs are sorted on their join field; the
/// scan then advances whichever side holds the smaller key. When several
/// left rows share a key, the right side is rewound to the start of its
/// matching group for each of them.
pub struct MergeJoinPlan {
    left: PlanRef,
    right: PlanRef,
    left_sort: SortPlan,
    right_sort: SortPlan,
    left_field: String,
    right_field: String,
    schema: Schema,
}

impl MergeJoinPlan {
    pub fn new(
        tx: &Transaction,
        left: PlanRef,
        right: PlanRef,
        left_field: &str,
        right_field: &str,
    ) -> Result<Self> {
        let left_sort = SortPlan::new(tx, Arc::clone(&left), OrderData::ascending([left_field]))?;
        let right_sort =
            SortPlan::new(tx, Arc::clone(&right), OrderData::ascending([right_field]))?;
        let mut schema = left.schema().clone();
        schema.add_all(right.schema());
        Ok(Self {
            left,
            right,
            left_sort,
            right_sort,
            left_field: left_field.to_string(),
            right_field: right_field.to_string(),
            schema,
        })
    }
}

impl Plan for MergeJoinPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let left = self.left_sort.open_sorted()?;
        let right = self.right_sort.open_sorted()?;
        Ok(Box::new(MergeJoinScan::new(
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
        self.left_sort
            .blocks_accessed()
            .saturating_add(self.right_sort.blocks_accessed())
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

pub struct MergeJoinScan {
    left: SortScan,
    right: SortScan,
    left_field: String,
    right_field: String,
    join_value: Option<Constant>,
    group_start: Option<SortPosition>,
}

impl MergeJoinScan {
    fn new(left: SortScan, right: SortScan, left_field: &str, right_field: &str) -> Result<Self> {
        let mut scan = Self {
            left,
            right,
            left_field: left_field.to_string(),
            right_field: right_field.to_string(),
            join_value: None,
            group_start: None,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn matches_join_value(&self, value: &Constant) -> Result<bool> {
        match &self.join_value {
            Some(current) => Ok(value.compare(current)? == Ordering::Equal),
            None => Ok(false),
        }
    }
}

impl Scan for MergeJoinScan {
    fn before_first(&mut self) -> Result<()> {
        self.join_value = None;
        self.group_start = None;
        self.left.before_first()?;
        self.right.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        let mut more_right = self.right.next()?;
        if more_right && self.matches_join_value(&self.right.get_val(&self.right_field)?)? {
            return Ok(true);
        }

        let mut more_left = self.left.next()?;
        if more_left && self.matches_join_value(&self.left.get_val(&self.left_field)?)? {
            if let Some(pos) = &self.group_start {
                self.right.restore_position(pos)?;
            }
            return Ok(true);
        }

        while more_left && more_right {
            let l = self.left.get_val(&self.left_field)?;
            let r = self.right.get_val(&self.right_field)?;
            match l.compare(&r)? {
                Ordering::Less => more_left = self.left.next()?,
                Ordering::Greater => more_right = self.right.next()?,
                Ordering::Equal => {
                    self.group_start = Some(self.right.save_position()?);
                    self.join_value = Some(r);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        if self.left.has_field(field) {
            self.left.get_val(field)
        } else {
            self.right.get_val(field)
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.left.has_field(field) || self.right.has_field(field)
    }

    fn close(&mut self) -> Result<()> {
        self.left.close()?;
        self.right.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::NestedJoinPlan;
    use crate::query::collect_rows;
    use crate::storage::Catalog;
    use crate::test_util::{int_table, ints};

    fn sorted(mut rows: Vec<Vec<i64>>) -> Vec<Vec<i64>> {
        rows.sort();
        rows
    }

    #[test]
    fn duplicate_keys_on_both_sides_produce_all_pairs() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let left = int_table(&catalog, &tx, "l", &["a", "k"], &[&[1, 7], &[2, 5], &[3, 7]]);
        let right = int_table(
            &catalog,
            &tx,
            "r",
            &["k2", "b"],
            &[&[7, 10], &[9, 20], &[7, 30], &[5, 40]],
        );
        let plan = MergeJoinPlan::new(&tx, left, right, "k", "k2").unwrap();

        let rows = collect_rows(&mut plan.open().unwrap(), &["a", "b"]).unwrap();
        assert_eq!(
            sorted(ints(rows)),
            vec![vec![1, 10], vec![1, 30], vec![2, 40], vec![3, 10], vec![3, 30]]
        );
    }

    #[test]
    fn agrees_with_nested_loop_join() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let left_rows: Vec<Vec<i64>> = (0..40).map(|i| vec![i, (i * 7) % 11]).collect();
        let right_rows: Vec<Vec<i64>> = (0..25).map(|i| vec![(i * 3) % 13, i]).collect();
        let left_refs: Vec<&[i64]> = left_rows.iter().map(|r| r.as_slice()).collect();
        let right_refs: Vec<&[i64]> = right_rows.iter().map(|r| r.as_slice()).collect();
        let left = int_table(&catalog, &tx, "l", &["a", "k"], &left_refs);
        let right = int_table(&catalog, &tx, "r", &["k2", "b"], &right_refs);

        let fields = ["a", "k", "k2", "b"];
        let merge = MergeJoinPlan::new(&tx, left.clone(), right.clone(), "k", "k2").unwrap();
        let nested = NestedJoinPlan::new(left, right, "k", "k2").unwrap();
        let merged = collect_rows(&mut merge.open().unwrap(), &fields).unwrap();
        let expected = collect_rows(&mut nested.open().unwrap(), &fields).unwrap();
        assert!(!expected.is_empty());
        assert_eq!(sorted(ints(merged)), sorted(ints(expected)));
    }
}
