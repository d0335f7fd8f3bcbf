//! # Heuristic Query Planner
//!
//! Builds a left-deep plan for a [`QueryData`] with two greedy rules:
//!
//! 1. Start with the table whose selection plan outputs the fewest records.
//! 2. Repeatedly add the table whose join with the current plan outputs the
//!    fewest records. When no remaining table joins with the current plan,
//!    add the one whose cross product outputs the fewest records.
//!
//! Ties go to the table listed first. The joined plan is then grouped and
//! projected, and finally sorted:
//!
//! ```text
//! Sort(order or every projected field ascending, distinct)
//!   └─ Project(select fields)
//!        └─ GroupBy(group fields, aggregates)     only with aggregates
//!             └─ left-deep join tree
//! ```
//!
//! Only estimates are compared; nothing is opened while planning.

use super::{QueryData, TablePlanner};
use crate::materialize::{GroupByPlan, OrderData, SortPlan};
use crate::query::{PlanRef, ProjectPlan};
use crate::storage::{Catalog, Transaction};
use eyre::{eyre, Result, WrapErr};
use std::sync::Arc;
use tracing::debug;

/// A finished plan together with the order in which tables were joined.
pub struct PlannedQuery {
    pub plan: PlanRef,
    pub join_order: Vec<String>,
}

pub struct HeuristicQueryPlanner {
    catalog: Catalog,
}

impl HeuristicQueryPlanner {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            catalog: catalog.clone(),
        }
    }

    pub fn create_plan(&self, data: &QueryData, tx: &Transaction) -> Result<PlannedQuery> {
        data.validate()?;

        let mut planners = data
            .tables()
            .iter()
            .map(|t| TablePlanner::new(&self.catalog, tx, t, data.predicate()))
            .collect::<Result<Vec<_>>>()?;

        let mut join_order = Vec::with_capacity(planners.len());
        let (first, mut current) = lowest_select_plan(&planners)?;
        join_order.push(planners.remove(first).table_name().to_string());
        debug!(table = %join_order[0], records = current.records_output(), "planner: first table");

        while !planners.is_empty() {
            let (index, plan, how) = match lowest_join_plan(&planners, &current)? {
                Some((index, plan)) => (index, plan, "join"),
                None => {
                    let (index, plan) = lowest_product_plan(&planners, &current)?;
                    (index, plan, "product")
                }
            };
            let table = planners.remove(index).table_name().to_string();
            debug!(%table, how, records = plan.records_output(), "planner: added table");
            join_order.push(table);
            current = plan;
        }

        let aggregates = data.aggregates();
        if !data.group_fields().is_empty() || !aggregates.is_empty() {
            current = Arc::new(GroupByPlan::new(
                tx,
                current,
                data.group_fields().to_vec(),
                aggregates,
            )?);
        }
        let projected: PlanRef = Arc::new(
            ProjectPlan::new(current, data.fields()).wrap_err_with(|| format!("planning {}", data))?,
        );

        let order = match data.order() {
            Some(order) => order.clone(),
            None => OrderData::ascending(data.fields().iter().cloned()),
        };
        let plan: PlanRef = Arc::new(SortPlan::with_distinct(
            tx,
            projected,
            order,
            data.is_distinct(),
        )?);

        Ok(PlannedQuery { plan, join_order })
    }
}

/// Index of the smallest candidate; the earliest wins ties.
fn lowest(candidates: impl Iterator<Item = (usize, PlanRef)>) -> Option<(usize, PlanRef)> {
    let mut best: Option<(usize, PlanRef)> = None;
    for (i, plan) in candidates {
        let better = match &best {
            Some((_, b)) => plan.records_output() < b.records_output(),
            None => true,
        };
        if better {
            best = Some((i, plan));
        }
    }
    best
}

fn lowest_select_plan(planners: &[TablePlanner]) -> Result<(usize, PlanRef)> {
    let candidates = planners
        .iter()
        .enumerate()
        .map(|(i, tp)| (i, tp.make_select_plan()));
    lowest(candidates).ok_or_else(|| eyre!("no tables to plan"))
}

fn lowest_join_plan(
    planners: &[TablePlanner],
    current: &PlanRef,
) -> Result<Option<(usize, PlanRef)>> {
    let mut candidates = Vec::new();
    for (i, tp) in planners.iter().enumerate() {
        if let Some(plan) = tp.make_join_plan(current)? {
            candidates.push((i, plan));
        }
    }
    Ok(lowest(candidates.into_iter()))
}

fn lowest_product_plan(planners: &[TablePlanner], current: &PlanRef) -> Result<(usize, PlanRef)> {
    let candidates = planners
        .iter()
        .enumerate()
        .map(|(i, tp)| (i, tp.make_product_plan(current)));
    lowest(candidates).ok_or_else(|| eyre!("no tables left to join"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{collect_rows, Expression, Predicate, Term};
    use crate::test_util::{int_table, ints};

    #[test]
    fn smallest_table_is_chosen_first() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let a: Vec<Vec<i64>> = (0..10).map(|i| vec![i]).collect();
        let b: Vec<Vec<i64>> = (0..100).map(|i| vec![i % 10, i]).collect();
        let a_refs: Vec<&[i64]> = a.iter().map(|r| r.as_slice()).collect();
        let b_refs: Vec<&[i64]> = b.iter().map(|r| r.as_slice()).collect();
        int_table(&catalog, &tx, "a", &["ak"], &a_refs);
        int_table(&catalog, &tx, "b", &["bk", "bv"], &b_refs);
        int_table(&catalog, &tx, "c", &["ck"], &[&[3]]);

        let pred = Predicate::from_term(Term::equality(Expression::field("ak"), Expression::field("bk")))
            .with_term(Term::equality(Expression::field("ak"), Expression::field("ck")));
        let data = QueryData::new(["bv"], ["a", "b", "c"]).with_predicate(pred);
        let planned = HeuristicQueryPlanner::new(&catalog).create_plan(&data, &tx).unwrap();

        assert_eq!(planned.join_order, vec!["c", "a", "b"]);
        let rows = collect_rows(&mut planned.plan.open().unwrap(), &["bv"]).unwrap();
        let expected: Vec<Vec<i64>> = (0..10).map(|i| vec![3 + 10 * i]).collect();
        assert_eq!(ints(rows), expected);
    }

    #[test]
    fn unknown_table_is_reported() {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let data = QueryData::new(["x"], ["ghost"]);
        assert!(HeuristicQueryPlanner::new(&catalog).create_plan(&data, &tx).is_err());
    }
}
