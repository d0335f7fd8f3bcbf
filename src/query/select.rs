use crate::query::{Plan, PlanRef, Predicate, Scan};
use crate::types::{Constant, Schema};
use eyre::Result;

/// Filters its input by a predicate.
pub struct SelectPlan {
    plan: PlanRef,
    pred: Predicate,
}

impl SelectPlan {
    pub fn new(plan: PlanRef, pred: Predicate) -> Self {
        Self { plan, pred }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.pred
    }
}

impl Plan for SelectPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let scan = self.plan.open()?;
        Ok(Box::new(SelectScan::new(scan, self.pred.clone())))
    }

    fn schema(&self) -> &Schema {
        self.plan.schema()
    }

    fn blocks_accessed(&self) -> usize {
        self.plan.blocks_accessed()
    }

    fn records_output(&self) -> usize {
        self.plan.records_output() / self.pred.reduction_factor(self.plan.as_ref()).max(1)
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.pred.equates_with_constant(field).is_some() {
            return 1;
        }
        match self.pred.equates_with_field(field) {
            Some(other) => self
                .plan
                .distinct_values(field)
                .min(self.plan.distinct_values(other)),
            None => self.plan.distinct_values(field),
        }
    }
}

pub struct SelectScan {
    scan: Box<dyn Scan>,
    pred: Predicate,
}

impl SelectScan {
    pub fn new(scan: Box<dyn Scan>, pred: Predicate) -> Self {
        Self { scan, pred }
    }
}

impl Scan for SelectScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        while self.scan.next()? {
            if self.pred.is_satisfied(self.scan.as_ref())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        self.scan.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.scan.has_field(field)
    }

    fn close(&mut self) -> Result<()> {
        self.scan.close()
    }
}
