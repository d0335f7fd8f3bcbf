use crate::error::QueryError;
use crate::materialize::{AggregationFn, OrderData};
use crate::query::Predicate;
use eyre::Result;
use hashbrown::HashSet;
use std::fmt;

/// Parsed form of a `select` statement, as handed to the planner.
///
/// Aggregates are not listed separately: a select field whose name starts
/// with `countof`, `sumof`, `avgof`, `minof` or `maxof` denotes that
/// aggregate over the rest of the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryData {
    fields: Vec<String>,
    tables: Vec<String>,
    pred: Predicate,
    group_fields: Vec<String>,
    order: Option<OrderData>,
    distinct: bool,
}

impl QueryData {
    pub fn new<F, T>(fields: F, tables: T) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            tables: tables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_predicate(mut self, pred: Predicate) -> Self {
        self.pred = pred;
        self
    }

    pub fn with_group_by<G>(mut self, fields: G) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
    {
        self.group_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order(mut self, order: OrderData) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn predicate(&self) -> &Predicate {
        &self.pred
    }

    pub fn group_fields(&self) -> &[String] {
        &self.group_fields
    }

    pub fn order(&self) -> Option<&OrderData> {
        self.order.as_ref()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn aggregates(&self) -> Vec<AggregationFn> {
        self.fields
            .iter()
            .filter_map(|f| AggregationFn::parse(f))
            .collect()
    }

    /// Rejects descriptors no plan can answer: empty field or table lists,
    /// repeated tables, a group-by without aggregates, and plain fields
    /// next to aggregates that are not grouped on.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(malformed("no fields selected"));
        }
        if self.tables.is_empty() {
            return Err(malformed("no tables listed"));
        }
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.as_str()) {
                return Err(malformed(format!("table '{}' listed twice", table)));
            }
        }

        let has_aggregates = self.fields.iter().any(|f| AggregationFn::parse(f).is_some());
        if !self.group_fields.is_empty() && !has_aggregates {
            return Err(malformed("group by requires at least one aggregate"));
        }
        if has_aggregates {
            for field in &self.fields {
                if AggregationFn::parse(field).is_none() && !self.group_fields.contains(field) {
                    return Err(malformed(format!(
                        "field '{}' must appear in the group by list",
                        field
                    )));
                }
            }
        }
        Ok(())
    }
}

fn malformed(msg: impl Into<String>) -> eyre::Report {
    QueryError::MalformedQuery(msg.into()).into()
}

impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "select ")?;
        if self.distinct {
            write!(f, "distinct ")?;
        }
        write!(f, "{} from {}", self.fields.join(", "), self.tables.join(", "))?;
        if !self.pred.is_empty() {
            write!(f, " where {}", self.pred)?;
        }
        if !self.group_fields.is_empty() {
            write!(f, " group by {}", self.group_fields.join(", "))?;
        }
        if let Some(order) = &self.order {
            let keys: Vec<String> = order
                .keys()
                .iter()
                .map(|k| {
                    if k.is_ascending() {
                        k.field().to_string()
                    } else {
                        format!("{} desc", k.field())
                    }
                })
                .collect();
            write!(f, " order by {}", keys.join(", "))?;
        }
        Ok(())
    }
}
