//! Fiscal period inference and fourth-quarter derivation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use filings_core::{
    ConsolidatedStatement, FilingError, FiscalPeriodMap, FiscalQuarter, MonthDay, Result,
    StatementKind,
};
use tracing::debug;

/// Quarterly anchors needed before the fourth quarter can be placed.
pub const REQUIRED_QUARTERS: usize = 3;

/// Widest gap, in days, between a fiscal year end and the end of that year's
/// first quarter. Older quarter ends belong to the previous fiscal year.
const FISCAL_YEAR_SPAN_DAYS: i64 = 330;

/// Infers a company's quarter anchors.
///
/// The three most recent quarterly period ends strictly before
/// `annual_anchor` become Q3, Q2 and Q1; the anchor itself is Q4.
///
/// Returns [`FilingError::InsufficientData`] with fewer than three such dates.
pub fn infer_fiscal_periods(
    annual_anchor: NaiveDate,
    quarterly_dates: &[NaiveDate],
) -> Result<FiscalPeriodMap> {
    let earlier: BTreeSet<NaiveDate> = quarterly_dates
        .iter()
        .copied()
        .filter(|date| *date < annual_anchor)
        .collect();
    let recent: Vec<NaiveDate> = earlier.into_iter().rev().take(REQUIRED_QUARTERS).collect();

    let &[q3, q2, q1] = recent.as_slice() else {
        return Err(FilingError::InsufficientData {
            required: REQUIRED_QUARTERS,
            found: recent.len(),
        });
    };

    Ok(FiscalPeriodMap::new(
        MonthDay::of(q1),
        MonthDay::of(q2),
        MonthDay::of(q3),
        MonthDay::of(annual_anchor),
    ))
}

/// Finds the Q1-Q3 period ends of the fiscal year ending at `year_end`.
fn quarters_of_year(
    quarterly: &ConsolidatedStatement,
    fiscal: &FiscalPeriodMap,
    year_end: NaiveDate,
) -> BTreeMap<FiscalQuarter, NaiveDate> {
    let mut quarters = BTreeMap::new();
    for period in quarterly.periods() {
        let gap = (year_end - period).num_days();
        if gap <= 0 || gap > FISCAL_YEAR_SPAN_DAYS {
            continue;
        }
        match fiscal.quarter_of(period) {
            Some(FiscalQuarter::Q4) | None => {}
            Some(quarter) => {
                quarters.entry(quarter).or_insert(period);
            }
        }
    }
    quarters
}

/// Adds the unreported fourth quarter to a quarterly statement.
///
/// For every annual period missing from `quarterly` whose Q1, Q2 and Q3 are
/// present, a fourth-quarter column is added at the annual period end. Flow
/// statements take annual minus the three quarters, and only where all four
/// values exist. The balance sheet takes the annual value as is.
#[must_use]
pub fn derive_fourth_quarter(
    quarterly: &ConsolidatedStatement,
    annual: &ConsolidatedStatement,
    fiscal: &FiscalPeriodMap,
    kind: StatementKind,
) -> ConsolidatedStatement {
    let mut result = quarterly.clone();

    for year_end in annual.periods() {
        if quarterly.contains_period(year_end) {
            continue;
        }
        let quarters = quarters_of_year(quarterly, fiscal, year_end);
        if quarters.len() < REQUIRED_QUARTERS {
            debug!(
                %year_end,
                found = quarters.len(),
                "Skipping fourth quarter without three reported quarters"
            );
            continue;
        }

        result.add_period(year_end);
        for row in annual.rows() {
            let annual_value = row.values.get(&year_end).copied();
            let value = if kind.is_flow() {
                annual_value.and_then(|total| {
                    quarters
                        .values()
                        .map(|period| quarterly.value(&row.label, *period))
                        .sum::<Option<f64>>()
                        .map(|reported| total - reported)
                })
            } else {
                annual_value
            };
            result.insert_value(&row.label, year_end, value);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar_year() -> FiscalPeriodMap {
        infer_fiscal_periods(
            date(2023, 12, 31),
            &[date(2023, 3, 31), date(2023, 6, 30), date(2023, 9, 30)],
        )
        .unwrap()
    }

    #[test]
    fn test_infer_calendar_year() {
        let map = infer_fiscal_periods(
            date(2023, 12, 31),
            &[
                date(2023, 3, 31),
                date(2023, 6, 30),
                date(2023, 9, 30),
                date(2022, 12, 31),
            ],
        )
        .unwrap();
        assert_eq!(map.q1.to_string(), "03-31");
        assert_eq!(map.q2.to_string(), "06-30");
        assert_eq!(map.q3.to_string(), "09-30");
        assert_eq!(map.q4.to_string(), "12-31");
    }

    #[test]
    fn test_infer_ignores_later_and_duplicate_dates() {
        // fiscal year ending late September, with a 10-Q filed after the 10-K
        let map = infer_fiscal_periods(
            date(2023, 9, 30),
            &[
                date(2023, 12, 30),
                date(2023, 7, 1),
                date(2023, 7, 1),
                date(2023, 4, 1),
                date(2022, 12, 31),
                date(2022, 6, 25),
            ],
        )
        .unwrap();
        assert_eq!(map.q1.to_string(), "12-31");
        assert_eq!(map.q2.to_string(), "04-01");
        assert_eq!(map.q3.to_string(), "07-01");
        assert_eq!(map.q4.to_string(), "09-30");
    }

    #[test]
    fn test_infer_insufficient_data() {
        let err = infer_fiscal_periods(
            date(2023, 12, 31),
            &[date(2023, 6, 30), date(2023, 9, 30), date(2024, 3, 31)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FilingError::InsufficientData {
                required: 3,
                found: 2
            }
        ));
    }

    fn quarterly_income() -> ConsolidatedStatement {
        let mut q = ConsolidatedStatement::new();
        for (period, revenue) in [
            (date(2023, 3, 31), Some(20.0)),
            (date(2023, 6, 30), Some(25.0)),
            (date(2023, 9, 30), Some(30.0)),
        ] {
            q.insert_value("Revenue", period, revenue);
        }
        q.insert_value("Net income", date(2023, 3, 31), Some(2.0));
        q.insert_value("Net income", date(2023, 6, 30), None);
        q.insert_value("Net income", date(2023, 9, 30), Some(3.0));
        q
    }

    fn annual_income() -> ConsolidatedStatement {
        let mut a = ConsolidatedStatement::new();
        a.insert_value("Revenue", date(2023, 12, 31), Some(110.0));
        a.insert_value("Net income", date(2023, 12, 31), Some(10.0));
        a.insert_value("Revenue", date(2022, 12, 31), Some(90.0));
        a
    }

    #[test]
    fn test_fourth_quarter_for_flow_statement() {
        let result = derive_fourth_quarter(
            &quarterly_income(),
            &annual_income(),
            &calendar_year(),
            StatementKind::IncomeStatement,
        );

        assert!(result.contains_period(date(2023, 12, 31)));
        assert_relative_eq!(result.value("Revenue", date(2023, 12, 31)).unwrap(), 35.0);
        // a missing quarter leaves the fourth quarter missing
        assert_eq!(result.value("Net income", date(2023, 12, 31)), None);
        // 2022 has no reported quarters
        assert!(!result.contains_period(date(2022, 12, 31)));
    }

    #[test]
    fn test_fourth_quarter_for_balance_sheet() {
        let mut quarterly = ConsolidatedStatement::new();
        for period in [date(2023, 4, 1), date(2023, 7, 1), date(2023, 9, 30)] {
            quarterly.insert_value("Total assets", period, Some(500.0));
        }
        let mut annual = ConsolidatedStatement::new();
        annual.insert_value("Total assets", date(2023, 12, 30), Some(520.0));

        // 52/53-week calendar: anchors drift by a day or two
        let result = derive_fourth_quarter(
            &quarterly,
            &annual,
            &calendar_year(),
            StatementKind::BalanceSheet,
        );
        assert_eq!(result.value("Total assets", date(2023, 12, 30)), Some(520.0));
        assert_eq!(result.period_count(), 4);
    }
}
