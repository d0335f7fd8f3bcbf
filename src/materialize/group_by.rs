use super::{AggregationFn, OrderData, SortPlan, SortScan};
use crate::error::QueryError;
use crate::query::{Plan, PlanRef, Scan};
use crate::storage::Transaction;
use crate::types::{Constant, Schema};
use eyre::Result;
use smallvec::SmallVec;
use std::sync::Arc;

type GroupValue = SmallVec<[Constant; 4]>;

/// Groups its input on a list of fields and computes aggregates per group.
///
/// The input is sorted on the group fields first, so each group is a run
/// of adjacent rows. The output has one row per group: the group fields
/// followed by one field per aggregate, named by
/// [`AggregationFn::field_name`]. With no group fields the whole input is
/// a single group; an empty input yields no rows either way.
pub struct GroupByPlan {
    sort: SortPlan,
    input: PlanRef,
    group_fields: Vec<String>,
    aggregates: Vec<AggregationFn>,
    schema: Schema,
}

impl GroupByPlan {
    pub fn new(
        tx: &Transaction,
        input: PlanRef,
        group_fields: Vec<String>,
        aggregates: Vec<AggregationFn>,
    ) -> Result<Self> {
        let mut schema = Schema::new();
        for field in &group_fields {
            schema.add(field, input.schema())?;
        }
        for agg in &aggregates {
            schema.add_field(agg.field_name(), agg.output_type(input.schema())?);
        }
        let sort = SortPlan::new(
            tx,
            Arc::clone(&input),
            OrderData::ascending(group_fields.iter().cloned()),
        )?;
        Ok(Self {
            sort,
            input,
            group_fields,
            aggregates,
            schema,
        })
    }
}

impl Plan for GroupByPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let sorted = self.sort.open_sorted()?;
        Ok(Box::new(GroupByScan::new(
            sorted,
            self.group_fields.clone(),
            self.aggregates.clone(),
        )?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.sort.blocks_accessed()
    }

    fn records_output(&self) -> usize {
        self.group_fields
            .iter()
            .fold(1usize, |acc, f| acc.saturating_mul(self.input.distinct_values(f)))
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.input.schema().has_field(field) && self.group_fields.iter().any(|g| g == field) {
            self.input.distinct_values(field)
        } else {
            self.records_output()
        }
    }
}

pub struct GroupByScan {
    input: SortScan,
    group_fields: Vec<String>,
    aggregates: Vec<AggregationFn>,
    current: Option<GroupValue>,
    more_groups: bool,
}

impl GroupByScan {
    fn new(
        input: SortScan,
        group_fields: Vec<String>,
        aggregates: Vec<AggregationFn>,
    ) -> Result<Self> {
        let mut scan = Self {
            input,
            group_fields,
            aggregates,
            current: None,
            more_groups: false,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn group_value(&self) -> Result<GroupValue> {
        self.group_fields
            .iter()
            .map(|f| self.input.get_val(f))
            .collect()
    }
}

impl Scan for GroupByScan {
    fn before_first(&mut self) -> Result<()> {
        self.current = None;
        self.input.before_first()?;
        self.more_groups = self.input.next()?;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if !self.more_groups {
            self.current = None;
            return Ok(false);
        }
        for agg in self.aggregates.iter_mut() {
            agg.process_first(&self.input)?;
        }
        let group = self.group_value()?;
        loop {
            self.more_groups = self.input.next()?;
            if !self.more_groups || self.group_value()? != group {
                break;
            }
            for agg in self.aggregates.iter_mut() {
                agg.process_next(&self.input)?;
            }
        }
        self.current = Some(group);
        Ok(true)
    }

    fn get_val(&self, field: &str) -> Result<Constant> {
        let group = self.current.as_ref().ok_or(QueryError::NoCurrentRecord)?;
        if let Some(i) = self.group_fields.iter().position(|g| g == field) {
            return Ok(group[i].clone());
        }
        match self.aggregates.iter().find(|a| a.field_name() == field) {
            Some(agg) => agg.value(),
            None => Err(QueryError::FieldNotFound {
                field: field.to_string(),
            }
            .into()),
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.group_fields.iter().any(|g| g == field)
            || self.aggregates.iter().any(|a| a.field_name() == field)
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        self.more_groups = false;
        self.input.close()
    }
}
