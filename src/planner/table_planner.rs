use crate::config::JoinStrategy;
use crate::materialize::{HashJoinPlan, MergeJoinPlan, NestedJoinPlan};
use crate::query::{
    Operator, Plan, PlanRef, Predicate, ProductPlan, SelectPlan, TablePlan, Term,
};
use crate::storage::{Catalog, Transaction};
use crate::types::Schema;
use eyre::Result;
use std::sync::Arc;

/// Builds the candidate plans for adding one table to a join order.
pub struct TablePlanner {
    tx: Transaction,
    table: String,
    plan: PlanRef,
    pred: Predicate,
}

impl TablePlanner {
    pub fn new(catalog: &Catalog, tx: &Transaction, table: &str, pred: &Predicate) -> Result<Self> {
        let plan: PlanRef = Arc::new(TablePlan::new(catalog, table)?);
        Ok(Self {
            tx: tx.clone(),
            table: table.to_string(),
            plan,
            pred: pred.clone(),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    fn schema(&self) -> &Schema {
        self.plan.schema()
    }

    /// The table filtered by every term that only mentions it.
    pub fn make_select_plan(&self) -> PlanRef {
        self.add_select_pred(Arc::clone(&self.plan))
    }

    /// Joins this table onto `current`, or `None` if no term of the
    /// predicate connects them.
    pub fn make_join_plan(&self, current: &PlanRef) -> Result<Option<PlanRef>> {
        let Some(join_pred) = self.pred.join_sub_pred(self.schema(), current.schema()) else {
            return Ok(None);
        };
        let Some((outer_field, inner_field, term)) = self.equijoin_term(&join_pred, current) else {
            let product = self.make_product_plan(current);
            return Ok(Some(Arc::new(SelectPlan::new(product, join_pred))));
        };

        let inner = self.make_select_plan();
        let outer = Arc::clone(current);
        let join: PlanRef = match self.tx.config().join_strategy() {
            JoinStrategy::Hash => Arc::new(HashJoinPlan::new(
                &self.tx,
                outer,
                inner,
                &outer_field,
                &inner_field,
            )?),
            JoinStrategy::NestedLoop => {
                Arc::new(NestedJoinPlan::new(outer, inner, &outer_field, &inner_field)?)
            }
            JoinStrategy::Merge => Arc::new(MergeJoinPlan::new(
                &self.tx,
                outer,
                inner,
                &outer_field,
                &inner_field,
            )?),
        };

        let rest = join_pred
            .terms()
            .iter()
            .filter(|t| **t != term)
            .cloned()
            .fold(Predicate::new(), Predicate::with_term);
        if rest.is_empty() {
            Ok(Some(join))
        } else {
            Ok(Some(Arc::new(SelectPlan::new(join, rest))))
        }
    }

    /// Cross product of `current` with this table's selection plan.
    pub fn make_product_plan(&self, current: &PlanRef) -> PlanRef {
        Arc::new(ProductPlan::new(
            Arc::clone(current),
            self.make_select_plan(),
        ))
    }

    fn add_select_pred(&self, plan: PlanRef) -> PlanRef {
        match self.pred.select_sub_pred(self.schema()) {
            Some(pred) => Arc::new(SelectPlan::new(plan, pred)),
            None => plan,
        }
    }

    /// First `current.f = this.g` term of `join_pred`, as `(f, g, term)`.
    fn equijoin_term(&self, join_pred: &Predicate, current: &PlanRef) -> Option<(String, String, Term)> {
        join_pred.terms().iter().find_map(|term| {
            if term.operator() != Operator::Eq {
                return None;
            }
            let lhs = term.lhs().as_field()?;
            let rhs = term.rhs().as_field()?;
            if current.schema().has_field(lhs) && self.schema().has_field(rhs) {
                Some((lhs.to_string(), rhs.to_string(), term.clone()))
            } else if current.schema().has_field(rhs) && self.schema().has_field(lhs) {
                Some((rhs.to_string(), lhs.to_string(), term.clone()))
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::query::{collect_rows, Expression};
    use crate::test_util::{int_table, ints};

    fn setup(strategy: JoinStrategy) -> (Catalog, Transaction, PlanRef) {
        let tx = Transaction::new(EngineConfig::default().with_join_strategy(strategy));
        let catalog = Catalog::new();
        let current = int_table(&catalog, &tx, "a", &["x"], &[&[1], &[2], &[3]]);
        int_table(&catalog, &tx, "b", &["y", "z"], &[&[1, 10], &[3, 30], &[3, 31]]);
        (catalog, tx, current)
    }

    fn join_pred() -> Predicate {
        Predicate::from_term(Term::equality(Expression::field("x"), Expression::field("y")))
    }

    #[test]
    fn every_strategy_produces_the_same_join() {
        for strategy in [JoinStrategy::Hash, JoinStrategy::NestedLoop, JoinStrategy::Merge] {
            let (catalog, tx, current) = setup(strategy);
            let planner = TablePlanner::new(&catalog, &tx, "b", &join_pred()).unwrap();
            let plan = planner.make_join_plan(&current).unwrap().unwrap();

            let mut rows = ints(collect_rows(&mut plan.open().unwrap(), &["x", "z"]).unwrap());
            rows.sort();
            assert_eq!(rows, vec![vec![1, 10], vec![3, 30], vec![3, 31]], "{}", strategy.name());
        }
    }

    #[test]
    fn unrelated_table_has_no_join_plan() {
        let (catalog, tx, current) = setup(JoinStrategy::Hash);
        let pred = Predicate::from_term(Term::new(
            Expression::field("z"),
            Operator::Gt,
            Expression::constant(10),
        ));
        let planner = TablePlanner::new(&catalog, &tx, "b", &pred).unwrap();
        assert!(planner.make_join_plan(&current).unwrap().is_none());
        assert_eq!(planner.make_select_plan().records_output(), 1);
    }

    #[test]
    fn non_equality_join_falls_back_to_filtered_product() {
        let (catalog, tx, current) = setup(JoinStrategy::Hash);
        let pred = Predicate::from_term(Term::new(
            Expression::field("x"),
            Operator::Lt,
            Expression::field("y"),
        ));
        let planner = TablePlanner::new(&catalog, &tx, "b", &pred).unwrap();
        let plan = planner.make_join_plan(&current).unwrap().unwrap();
        let rows = collect_rows(&mut plan.open().unwrap(), &["x", "y"]).unwrap();
        assert_eq!(rows.len(), 4);
    }
}
