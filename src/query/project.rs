use crate::error::QueryError;
use crate::query::{Plan, PlanRef, Scan};
use crate::types::{Constant, Schema};
use eyre::Result;

/// Restricts its input to a list of fields, in list order.
pub struct ProjectPlan {
    plan: PlanRef,
    schema: Schema,
}

impl ProjectPlan {
    /// Fails with `FieldNotFound` if a field is missing from the input.
    pub fn new<S: AsRef<str>>(plan: PlanRef, fields: &[S]) -> Result<Self> {
        let mut schema = Schema::new();
        for field in fields {
            schema.add(field.as_ref(), plan.schema())?;
        }
        Ok(Self { plan, schema })
    }
}

impl Plan for ProjectPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let scan = self.plan.open()?;
        Ok(Box::new(ProjectScan::new(scan, self.schema.clone())))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.plan.blocks_accessed()
    }

    fn records_output(&self) -> usize {
        self.plan.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.plan.distinct_values(field)
    }
}

pub struct ProjectScan {
    scan: Box<dyn Scan>,
    schema: Schema,
}

impl ProjectScan {
    pub fn new(scan: Box<dyn Scan>, schema: Schema) -> Self {
        Self { scan, schema }
    }
}

impl Scan for ProjectScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        self.scan.next()
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        if !self.schema.has_field(field) {
            return Err(QueryError::FieldNotFound {
                field: field.to_string(),
            }
            .into());
        }
        self.scan.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.schema.has_field(field)
    }

    fn close(&mut self) -> Result<()> {
        self.scan.close()
    }
}
