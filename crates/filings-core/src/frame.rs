//! Tabular export of consolidated statements.
//!
//! The wide layout has a `line_item` string column followed by one nullable
//! `Float64` column per period, named `YYYY-MM-DD`, ascending.

use chrono::NaiveDate;
use polars::prelude::*;

use crate::{
    error::{FilingError, Result},
    statement::ConsolidatedStatement,
};

/// Name of the label column in exported frames.
pub const LINE_ITEM_COLUMN: &str = "line_item";

/// Canonical text form of a period column.
pub const PERIOD_FORMAT: &str = "%Y-%m-%d";

impl ConsolidatedStatement {
    /// Exports the statement as a wide DataFrame.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let labels: Vec<&str> = self.rows().iter().map(|r| r.label.as_str()).collect();
        let mut columns = vec![Column::new(LINE_ITEM_COLUMN.into(), labels)];
        for period in self.periods() {
            let values: Vec<Option<f64>> = self
                .rows()
                .iter()
                .map(|row| row.values.get(&period).copied())
                .collect();
            let name = period.format(PERIOD_FORMAT).to_string();
            columns.push(Column::new(name.into(), values));
        }
        DataFrame::new(columns).map_err(|e| FilingError::Other(e.to_string()))
    }

    /// Rebuilds a statement from a wide DataFrame produced by
    /// [`to_frame`](Self::to_frame).
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let labels = df
            .column(LINE_ITEM_COLUMN)
            .map_err(|e| FilingError::Parse(e.to_string()))?
            .str()
            .map_err(|e| FilingError::Parse(e.to_string()))?;

        let mut statement = Self::new();
        for label in labels.into_iter().flatten() {
            statement.ensure_row(label);
        }

        for name in df.get_column_names() {
            if name.as_str() == LINE_ITEM_COLUMN {
                continue;
            }
            let period = NaiveDate::parse_from_str(name.as_str(), PERIOD_FORMAT)
                .map_err(|e| FilingError::Parse(format!("period column '{name}': {e}")))?;
            let values = df
                .column(name.as_str())
                .map_err(|e| FilingError::Parse(e.to_string()))?
                .cast(&DataType::Float64)
                .map_err(|e| FilingError::Parse(e.to_string()))?;
            let values = values
                .f64()
                .map_err(|e| FilingError::Parse(e.to_string()))?;

            statement.add_period(period);
            for (label, value) in labels.into_iter().zip(values.into_iter()) {
                if let Some(label) = label {
                    statement.insert_value(label, period, value);
                }
            }
        }
        Ok(statement)
    }
}
