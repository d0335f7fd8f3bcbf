//! # Sort Order and Record Comparison
//!
//! [`OrderData`] is an ordered list of `(field, ascending)` keys. Rows are
//! compared lexicographically: the first key whose values differ decides,
//! and a descending key flips that result. With no keys every pair of rows
//! compares equal.
//!
//! [`RecordComparator`] applies an `OrderData` to the current rows of two
//! scans. Values are compared with [`Constant::compare`](crate::types::Constant::compare), so a key whose
//! rows hold different kinds fails with `QueryError::TypeMismatch`.

use crate::query::Scan;
use crate::types::Schema;
use eyre::Result;
use smallvec::SmallVec;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    field: String,
    ascending: bool,
}

impl OrderKey {
    pub fn new(field: impl Into<String>, ascending: bool) -> Self {
        Self {
            field: field.into(),
            ascending,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderData {
    keys: SmallVec<[OrderKey; 4]>,
}

impl OrderData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ascending on each of `fields`, in order.
    pub fn ascending<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: fields.into_iter().map(|f| OrderKey::new(f, true)).collect(),
        }
    }

    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.keys.push(OrderKey::new(field, true));
        self
    }

    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.keys.push(OrderKey::new(field, false));
        self
    }

    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.keys.iter().any(|k| k.field == field)
    }

    /// This order followed by every remaining field of `schema`, ascending.
    /// Rows that are equal under the result are equal in every field.
    pub fn covering(&self, schema: &Schema) -> OrderData {
        let mut order = self.clone();
        for field in schema.fields() {
            if !order.contains(field) {
                order.keys.push(OrderKey::new(field, true));
            }
        }
        order
    }
}

#[derive(Debug, Clone)]
pub struct RecordComparator {
    order: OrderData,
}

impl RecordComparator {
    pub fn new(order: OrderData) -> Self {
        Self { order }
    }

    pub fn compare<A, B>(&self, a: &A, b: &B) -> Result<Ordering>
    where
        A: Scan + ?Sized,
        B: Scan + ?Sized,
    {
        for key in self.order.keys() {
            let ord = a.get_val(&key.field)?.compare(&b.get_val(&key.field)?)?;
            if ord != Ordering::Equal {
                return Ok(if key.ascending { ord } else { ord.reverse() });
            }
        }
        Ok(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::UpdateScan;
    use crate::storage::{TableScan, Transaction};

    fn row(tx: &Transaction, a: i64, b: i64) -> TableScan {
        let table = tx.new_temp_table(&Schema::new().with_int("a").with_int("b"));
        let mut scan = table.open();
        scan.insert().unwrap();
        scan.set_int("a", a).unwrap();
        scan.set_int("b", b).unwrap();
        scan
    }

    #[test]
    fn descending_key_flips_the_result() {
        let tx = Transaction::default();
        let cmp = RecordComparator::new(OrderData::new().asc("a").desc("b"));
        let x = row(&tx, 1, 5);
        let y = row(&tx, 1, 7);
        assert_eq!(cmp.compare(&x, &y).unwrap(), Ordering::Greater);

        let z = row(&tx, 0, 0);
        assert_eq!(cmp.compare(&z, &x).unwrap(), Ordering::Less);
    }

    #[test]
    fn empty_order_treats_all_rows_as_equal() {
        let tx = Transaction::default();
        let cmp = RecordComparator::new(OrderData::new());
        assert_eq!(
            cmp.compare(&row(&tx, 1, 1), &row(&tx, 2, 2)).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn covering_appends_missing_fields() {
        let schema = Schema::new().with_int("a").with_int("b").with_int("c");
        let order = OrderData::new().desc("b").covering(&schema);
        let fields: Vec<(&str, bool)> = order
            .keys()
            .iter()
            .map(|k| (k.field(), k.is_ascending()))
            .collect();
        assert_eq!(fields, vec![("b", false), ("a", true), ("c", true)]);
    }
}
