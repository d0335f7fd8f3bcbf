use crate::query::{joined_distinct_values, Plan, PlanRef, Scan};
use crate::types::{Constant, Schema};
use eyre::Result;

/// Cross product of two inputs. The right input is rescanned once per left
/// row.
pub struct ProductPlan {
    left: PlanRef,
    right: PlanRef,
    schema: Schema,
}

impl ProductPlan {
    pub fn new(left: PlanRef, right: PlanRef) -> Self {
        let mut schema = left.schema().clone();
        schema.add_all(right.schema());
        Self {
            left,
            right,
            schema,
        }
    }
}

impl Plan for ProductPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let left = self.left.open()?;
        let right = self.right.open()?;
        Ok(Box::new(ProductScan::new(left, right)?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.left.blocks_accessed().saturating_add(
            self.left
                .records_output()
                .saturating_mul(self.right.blocks_accessed()),
        )
    }

    fn records_output(&self) -> usize {
        self.left
            .records_output()
            .saturating_mul(self.right.records_output())
    }

    fn distinct_values(&self, field: &str) -> usize {
        joined_distinct_values(self.left.as_ref(), self.right.as_ref(), field)
    }
}

pub struct ProductScan {
    left: Box<dyn Scan>,
    right: Box<dyn Scan>,
    left_has_row: bool,
}

impl ProductScan {
    pub fn new(left: Box<dyn Scan>, right: Box<dyn Scan>) -> Result<Self> {
        let mut scan = Self {
            left,
            right,
            left_has_row: false,
        };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for ProductScan {
    fn before_first(&mut self) -> Result<()> {
        self.left.before_first()?;
        self.left_has_row = self.left.next()?;
        self.right.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        while self.left_has_row {
            if self.right.next()? {
                return Ok(true);
            }
            self.right.before_first()?;
            self.left_has_row = self.left.next()?;
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
