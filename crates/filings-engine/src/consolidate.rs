//! Merging per-filing tables into a consolidated statement.
//!
//! Filings arrive most recent first. Each merge only adds periods the
//! statement does not have yet, so values accepted from a newer filing are
//! never replaced by an older one, and merging the same filing twice is a
//! no-op.

use filings_core::{ConsolidatedStatement, Frequency, RawTableRow, StatementTable};
use tracing::debug;

use crate::periods::normalize_periods;

/// Most recent columns a quarterly filing contributes once the statement
/// already holds data. Older columns repeat earlier filings.
pub const QUARTERLY_COLUMN_CAP: usize = 2;

/// How rows of an incoming table are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergePath {
    /// Every key occurs once; rows are inserted as they are.
    Disjoint,
    /// Some key occurs more than once; its rows are summed per column first.
    DuplicateSummation,
}

impl MergePath {
    /// Picks the path from the table's key multiplicity.
    #[must_use]
    pub fn for_table(table: &StatementTable) -> Self {
        if table.has_duplicate_keys() {
            Self::DuplicateSummation
        } else {
            Self::Disjoint
        }
    }
}

/// Adds two optional values. A missing side contributes nothing; two missing
/// sides stay missing.
#[must_use]
pub fn sum_present(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Collapses rows sharing a key by summing them column by column.
/// Keys keep the order they were first seen in.
fn sum_duplicate_rows(rows: &[RawTableRow]) -> Vec<RawTableRow> {
    let mut merged: Vec<RawTableRow> = Vec::new();
    for row in rows {
        match merged.iter_mut().find(|m| m.key == row.key) {
            Some(existing) => {
                for (acc, value) in existing.values.iter_mut().zip(&row.values) {
                    *acc = sum_present(*acc, *value);
                }
            }
            None => merged.push(row.clone()),
        }
    }
    merged
}

/// Merges one filing's table into a consolidated statement.
///
/// Columns are compared on canonical dates. Only periods missing from
/// `existing` are inserted. Once `existing` holds data, a quarterly table
/// contributes at most its [`QUARTERLY_COLUMN_CAP`] most recent periods.
/// A table without rows leaves `existing` untouched.
#[must_use]
pub fn consolidate(
    existing: ConsolidatedStatement,
    table: &StatementTable,
    frequency: Frequency,
) -> ConsolidatedStatement {
    if table.is_empty() {
        debug!(columns = table.columns().len(), "Skipping table without rows");
        return existing;
    }
    let mut table = normalize_periods(table);
    if frequency == Frequency::Quarterly && !existing.is_empty() {
        let width = table.columns().len();
        let recent: Vec<usize> = (width.saturating_sub(QUARTERLY_COLUMN_CAP)..width).collect();
        table = table.select_columns(&recent);
    }

    let candidates: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, period)| !existing.contains_period(**period))
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        debug!(columns = table.columns().len(), "No new periods to merge");
        return existing;
    }

    let path = MergePath::for_table(&table);
    debug!(
        new_periods = candidates.len(),
        rows = table.len(),
        ?path,
        "Merging statement table"
    );

    let rows = match path {
        MergePath::Disjoint => table.rows().to_vec(),
        MergePath::DuplicateSummation => sum_duplicate_rows(table.rows()),
    };

    let mut merged = existing;
    for &i in &candidates {
        merged.add_period(table.columns()[i]);
    }
    for row in &rows {
        for &i in &candidates {
            merged.insert_value(&row.key, table.columns()[i], row.values[i]);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(columns: Vec<NaiveDate>, rows: Vec<(&str, Vec<Option<f64>>)>) -> StatementTable {
        StatementTable::from_rows(
            columns,
            rows.into_iter()
                .map(|(k, v)| RawTableRow::new(k, v))
                .collect(),
        )
        .unwrap()
    }

    fn annual_2023() -> StatementTable {
        table(
            vec![date(2023, 12, 31), date(2022, 12, 31)],
            vec![
                ("Revenue", vec![Some(120.0), Some(100.0)]),
                ("Net income", vec![Some(12.0), Some(9.0)]),
            ],
        )
    }

    fn annual_2021() -> StatementTable {
        table(
            vec![date(2022, 12, 31), date(2021, 12, 31)],
            vec![
                ("Revenue", vec![Some(101.0), Some(80.0)]),
                ("Legacy item", vec![Some(3.0), Some(4.0)]),
            ],
        )
    }

    #[test]
    fn test_empty_statement_takes_normalized_table() {
        let merged = consolidate(ConsolidatedStatement::new(), &annual_2023(), Frequency::Annual);
        let periods: Vec<_> = merged.periods().collect();
        assert_eq!(periods, vec![date(2022, 12, 31), date(2023, 12, 31)]);
        assert_eq!(merged.values("Revenue"), vec![Some(100.0), Some(120.0)]);
    }

    #[test]
    fn test_only_new_periods_inserted() {
        let merged = consolidate(ConsolidatedStatement::new(), &annual_2023(), Frequency::Annual);
        let merged = consolidate(merged, &annual_2021(), Frequency::Annual);

        let periods: Vec<_> = merged.periods().collect();
        assert_eq!(
            periods,
            vec![date(2021, 12, 31), date(2022, 12, 31), date(2023, 12, 31)]
        );
        // 2022 value from the newer filing is kept
        assert_eq!(
            merged.values("Revenue"),
            vec![Some(80.0), Some(100.0), Some(120.0)]
        );
        assert_eq!(merged.values("Legacy item"), vec![Some(4.0), None, None]);
        assert_eq!(merged.values("Net income"), vec![None, Some(9.0), Some(12.0)]);
    }

    #[test]
    fn test_idempotent() {
        let once = consolidate(ConsolidatedStatement::new(), &annual_2023(), Frequency::Annual);
        let once = consolidate(once, &annual_2021(), Frequency::Annual);
        let twice = consolidate(once.clone(), &annual_2021(), Frequency::Annual);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_duplicate_rows_summed() {
        let incoming = table(
            vec![date(2023, 12, 31), date(2022, 12, 31)],
            vec![
                ("Revenue", vec![Some(100.0), None]),
                ("Revenue", vec![Some(50.0), Some(20.0)]),
                ("Other", vec![None, None]),
            ],
        );
        assert_eq!(MergePath::for_table(&incoming), MergePath::DuplicateSummation);

        let merged = consolidate(ConsolidatedStatement::new(), &incoming, Frequency::Annual);
        assert_eq!(merged.rows().len(), 2);
        assert_eq!(merged.values("Revenue"), vec![Some(20.0), Some(150.0)]);
        assert_eq!(merged.values("Other"), vec![None, None]);
    }

    #[test]
    fn test_table_without_rows_claims_no_periods() {
        let hollow = table(vec![date(2023, 12, 31), date(2022, 12, 31)], vec![]);
        let merged = consolidate(ConsolidatedStatement::new(), &hollow, Frequency::Annual);
        assert!(merged.is_empty());
        assert_eq!(merged.period_count(), 0);

        // the older filing still supplies 2022
        let merged = consolidate(merged, &annual_2021(), Frequency::Annual);
        assert_eq!(merged.values("Revenue"), vec![Some(80.0), Some(101.0)]);

        let before = merged.clone();
        assert_eq!(consolidate(merged, &hollow, Frequency::Annual), before);
    }

    #[test]
    fn test_identical_duplicate_rows_still_summed() {
        let incoming = table(
            vec![date(2023, 12, 31)],
            vec![
                ("Revenue", vec![Some(40.0)]),
                ("Revenue", vec![Some(40.0)]),
            ],
        );
        let merged = consolidate(ConsolidatedStatement::new(), &incoming, Frequency::Annual);
        assert_eq!(merged.values("Revenue"), vec![Some(80.0)]);
    }

    #[test]
    fn test_sum_present() {
        assert_eq!(sum_present(Some(1.0), Some(2.0)), Some(3.0));
        assert_eq!(sum_present(None, Some(2.0)), Some(2.0));
        assert_eq!(sum_present(Some(1.0), None), Some(1.0));
        assert_eq!(sum_present(None, None), None);
    }

    #[test]
    fn test_quarterly_cap_applies_after_first_filing() {
        let latest = table(
            vec![date(2023, 9, 30), date(2022, 9, 30)],
            vec![("Revenue", vec![Some(30.0), Some(25.0)])],
        );
        let merged = consolidate(ConsolidatedStatement::new(), &latest, Frequency::Quarterly);

        let older = table(
            vec![date(2023, 6, 30), date(2023, 3, 31), date(2022, 6, 30)],
            vec![("Revenue", vec![Some(29.0), Some(28.0), Some(24.0)])],
        );
        let merged = consolidate(merged, &older, Frequency::Quarterly);

        // 2022-06-30 is the oldest of three columns and is dropped by the cap
        let periods: Vec<_> = merged.periods().collect();
        assert_eq!(
            periods,
            vec![
                date(2022, 9, 30),
                date(2023, 3, 31),
                date(2023, 6, 30),
                date(2023, 9, 30)
            ]
        );
    }

    #[test]
    fn test_periods_never_shrink() {
        let mut statement = ConsolidatedStatement::new();
        let mut seen = 0;
        for incoming in [annual_2023(), annual_2021(), annual_2023()] {
            statement = consolidate(statement, &incoming, Frequency::Annual);
            assert!(statement.period_count() >= seen);
            seen = statement.period_count();
            let periods: Vec<_> = statement.periods().collect();
            assert!(periods.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
