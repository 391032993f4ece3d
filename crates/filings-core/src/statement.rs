//! Per-filing and consolidated statement tables.
//!
//! A [`StatementTable`] is what one rendered statement parses into: ordered
//! period columns and ordered rows whose values line up with those columns.
//! Keys may repeat within a table.
//!
//! A [`ConsolidatedStatement`] accumulates many tables for one
//! (symbol, statement kind, frequency). Its periods are always ascending and a
//! missing value is an absent entry, never zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{FilingError, Result};

/// One line item of a parsed statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTableRow {
    /// Line-item key: the fact identifier, or its label once resolved.
    pub key: String,
    /// Values aligned with the table's period columns; `None` is missing.
    pub values: Vec<Option<f64>>,
}

impl RawTableRow {
    /// Creates a row.
    #[must_use]
    pub fn new(key: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }
}

/// A statement parsed from one filing.
///
/// Every row has exactly one value per period column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    columns: Vec<NaiveDate>,
    rows: Vec<RawTableRow>,
}

impl StatementTable {
    /// Creates an empty table with the given period columns.
    #[must_use]
    pub const fn new(columns: Vec<NaiveDate>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a table from columns and rows, rejecting misaligned rows.
    pub fn from_rows(columns: Vec<NaiveDate>, rows: Vec<RawTableRow>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push(row)?;
        }
        Ok(table)
    }

    /// Appends a row.
    ///
    /// Returns [`FilingError::InvalidParameter`] when the row does not carry one
    /// value per column.
    pub fn push(&mut self, row: RawTableRow) -> Result<()> {
        if row.values.len() != self.columns.len() {
            return Err(FilingError::InvalidParameter(format!(
                "row '{}' has {} values for {} columns",
                row.key,
                row.values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the period columns in table order.
    #[must_use]
    pub fn columns(&self) -> &[NaiveDate] {
        &self.columns
    }

    /// Returns the rows in table order.
    #[must_use]
    pub fn rows(&self) -> &[RawTableRow] {
        &self.rows
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if any key occurs more than once.
    #[must_use]
    pub fn has_duplicate_keys(&self) -> bool {
        let mut seen = BTreeSet::new();
        !self.rows.iter().all(|row| seen.insert(row.key.as_str()))
    }

    /// Rewrites every row key, keeping values and order.
    #[must_use]
    pub fn map_keys(mut self, mut f: impl FnMut(&str) -> String) -> Self {
        for row in &mut self.rows {
            row.key = f(&row.key);
        }
        self
    }

    /// Builds a table holding only the given columns, in the given order.
    ///
    /// Indices past the last column are ignored.
    #[must_use]
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        let indices: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.columns.len())
            .collect();
        Self {
            columns: indices.iter().map(|&i| self.columns[i]).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| RawTableRow {
                    key: row.key.clone(),
                    values: indices.iter().map(|&i| row.values[i]).collect(),
                })
                .collect(),
        }
    }

    /// Splits the table into its columns and rows.
    #[must_use]
    pub fn into_parts(self) -> (Vec<NaiveDate>, Vec<RawTableRow>) {
        (self.columns, self.rows)
    }
}

/// One line item of a consolidated statement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    /// Line-item label.
    pub label: String,
    /// Known values by period end. Missing periods are absent.
    pub values: BTreeMap<NaiveDate, f64>,
}

/// A multi-period statement accumulated across filings.
///
/// Periods are kept ascending. Rows keep the order they were first seen in.
/// Values are write-once: [`insert_value`](Self::insert_value) never replaces
/// an accepted value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConsolidatedStatement {
    periods: BTreeSet<NaiveDate>,
    rows: Vec<StatementRow>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl PartialEq for ConsolidatedStatement {
    fn eq(&self, other: &Self) -> bool {
        self.periods == other.periods && self.rows == other.rows
    }
}

impl ConsolidatedStatement {
    /// Creates an empty statement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the statement has no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Returns the period ends in ascending order.
    pub fn periods(&self) -> impl DoubleEndedIterator<Item = NaiveDate> + '_ {
        self.periods.iter().copied()
    }

    /// Returns the number of periods.
    #[must_use]
    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    /// Returns the most recent period end.
    #[must_use]
    pub fn latest_period(&self) -> Option<NaiveDate> {
        self.periods.last().copied()
    }

    /// Returns true if the period is present.
    #[must_use]
    pub fn contains_period(&self, period: NaiveDate) -> bool {
        self.periods.contains(&period)
    }

    /// Returns the rows in first-seen order.
    #[must_use]
    pub fn rows(&self) -> &[StatementRow] {
        &self.rows
    }

    /// Returns the row for a label.
    #[must_use]
    pub fn row(&self, label: &str) -> Option<&StatementRow> {
        self.position(label).map(|i| &self.rows[i])
    }

    /// Returns the value for a label and period, `None` when missing.
    #[must_use]
    pub fn value(&self, label: &str, period: NaiveDate) -> Option<f64> {
        self.row(label)
            .and_then(|row| row.values.get(&period).copied())
    }

    /// Returns a label's values aligned with [`periods`](Self::periods).
    #[must_use]
    pub fn values(&self, label: &str) -> Vec<Option<f64>> {
        let row = self.row(label);
        self.periods
            .iter()
            .map(|p| row.and_then(|r| r.values.get(p).copied()))
            .collect()
    }

    /// Adds a period column. Returns false if it was already present.
    pub fn add_period(&mut self, period: NaiveDate) -> bool {
        self.periods.insert(period)
    }

    /// Ensures a row exists for the label and returns its position.
    pub fn ensure_row(&mut self, label: &str) -> usize {
        if let Some(i) = self.position(label) {
            return i;
        }
        self.rows.push(StatementRow {
            label: label.to_string(),
            values: BTreeMap::new(),
        });
        let i = self.rows.len() - 1;
        self.index.insert(label.to_string(), i);
        i
    }

    /// Records a value, adding the period and row when needed.
    ///
    /// A `None` value only registers the row and period. Returns false and
    /// leaves the statement unchanged when a value is already accepted for
    /// this label and period.
    pub fn insert_value(&mut self, label: &str, period: NaiveDate, value: Option<f64>) -> bool {
        self.periods.insert(period);
        let i = self.ensure_row(label);
        let values = &mut self.rows[i].values;
        if values.contains_key(&period) {
            return false;
        }
        if let Some(v) = value {
            values.insert(period, v);
        }
        true
    }

    fn position(&self, label: &str) -> Option<usize> {
        // The index is not serialized; fall back to a scan after deserialization.
        self.index
            .get(label)
            .copied()
            .or_else(|| self.rows.iter().position(|row| row.label == label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_table_rejects_misaligned_row() {
        let mut table = StatementTable::new(vec![date(2023, 12, 31), date(2022, 12, 31)]);
        assert!(table.push(RawTableRow::new("Revenue", vec![Some(1.0)])).is_err());
        assert!(
            table
                .push(RawTableRow::new("Revenue", vec![Some(1.0), None]))
                .is_ok()
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_keys() {
        let columns = vec![date(2023, 12, 31)];
        let table = StatementTable::from_rows(
            columns,
            vec![
                RawTableRow::new("Revenue", vec![Some(1.0)]),
                RawTableRow::new("Revenue", vec![Some(2.0)]),
            ],
        )
        .unwrap();
        assert!(table.has_duplicate_keys());
        assert!(!table.map_keys(|k| format!("{k}x")).rows().is_empty());
    }

    #[test]
    fn test_periods_sorted_and_values_write_once() {
        let mut statement = ConsolidatedStatement::new();
        assert!(statement.insert_value("Revenue", date(2023, 12, 31), Some(10.0)));
        assert!(statement.insert_value("Revenue", date(2022, 12, 31), Some(8.0)));
        assert!(!statement.insert_value("Revenue", date(2023, 12, 31), Some(99.0)));

        let periods: Vec<_> = statement.periods().collect();
        assert_eq!(periods, vec![date(2022, 12, 31), date(2023, 12, 31)]);
        assert_eq!(statement.value("Revenue", date(2023, 12, 31)), Some(10.0));
        assert_eq!(statement.latest_period(), Some(date(2023, 12, 31)));
    }

    #[test]
    fn test_missing_value_is_not_zero() {
        let mut statement = ConsolidatedStatement::new();
        statement.insert_value("Revenue", date(2023, 12, 31), Some(10.0));
        statement.insert_value("Other income", date(2023, 12, 31), None);
        statement.insert_value("Revenue", date(2022, 12, 31), Some(8.0));

        assert_eq!(statement.values("Other income"), vec![None, None]);
        assert_eq!(statement.values("Revenue"), vec![Some(8.0), Some(10.0)]);
        assert_eq!(statement.rows().len(), 2);
    }

    #[test]
    fn test_lookup_after_deserialize() {
        let mut statement = ConsolidatedStatement::new();
        statement.insert_value("Revenue", date(2023, 12, 31), Some(10.0));
        let json = serde_json::to_string(&statement).unwrap();
        let restored: ConsolidatedStatement = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.value("Revenue", date(2023, 12, 31)), Some(10.0));
    }
}
