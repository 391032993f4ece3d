//! Period labels and column normalization.

use chrono::NaiveDate;
use filings_core::{FilingError, Result, StatementTable};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Canonical text form of a period end.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// Expands an abbreviated month token (`Sep`, `Sept`, `SEP`) to its full name.
fn full_month_name(token: &str) -> Option<&'static str> {
    let token = token.to_lowercase();
    if token == "sept" {
        return Some("September");
    }
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .into_iter()
        .find(|month| month.to_lowercase().starts_with(&token))
}

/// Parses a rendered period header such as `Sep. 30, 2023` or `June 30, 2023`.
///
/// Anything that does not read as `<month> <day>, <year>` is a
/// [`FilingError::MalformedDocument`].
pub fn parse_period_label(text: &str) -> Result<NaiveDate> {
    let malformed = || FilingError::MalformedDocument(format!("unparseable period '{text}'"));

    let cleaned = text.replace('.', "");
    let mut tokens = cleaned.split_whitespace();
    let month = tokens
        .next()
        .and_then(full_month_name)
        .ok_or_else(malformed)?;
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        return Err(malformed());
    }

    NaiveDate::parse_from_str(&format!("{month} {}", rest.join(" ")), "%B %d, %Y")
        .map_err(|_| malformed())
}

/// Formats a period end as `YYYY-MM-DD`.
#[must_use]
pub fn canonical_label(date: NaiveDate) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

/// Reorders a table so its period columns are strictly ascending.
///
/// When a date repeats (a 10-Q shows the same end date for its three- and
/// nine-month columns) the first occurrence in document order is kept.
#[must_use]
pub fn normalize_periods(table: &StatementTable) -> StatementTable {
    let columns = table.columns();
    let mut keep: Vec<usize> = Vec::with_capacity(columns.len());
    for (i, date) in columns.iter().enumerate() {
        if !keep.iter().any(|&k| columns[k] == *date) {
            keep.push(i);
        }
    }
    keep.sort_by_key(|&i| columns[i]);
    table.select_columns(&keep)
}
