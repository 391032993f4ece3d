//! Core identifiers for filings and statements.
//!
//! - [`Symbol`] - Ticker symbol
//! - [`Filing`] - One periodic report listed by a registry
//! - [`StatementKind`] - Which financial statement is meant
//! - [`StatementDocument`] - A rendered statement fetched from a filing

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::frequency::FormType;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// One periodic report as listed by a filing registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    /// Unique accession number, e.g. `0000320193-23-000106`.
    pub accession_number: String,
    /// Form of the report.
    pub form_type: FormType,
    /// Company the report belongs to.
    pub symbol: Symbol,
    /// Period end the report covers, when the registry provides it.
    pub report_date: Option<NaiveDate>,
}

impl Filing {
    /// Creates a filing listing without a report date.
    #[must_use]
    pub fn new(accession_number: impl Into<String>, form_type: FormType, symbol: Symbol) -> Self {
        Self {
            accession_number: accession_number.into(),
            form_type,
            symbol,
            report_date: None,
        }
    }

    /// Sets the report date.
    #[must_use]
    pub const fn with_report_date(mut self, report_date: NaiveDate) -> Self {
        self.report_date = Some(report_date);
        self
    }
}

/// The three primary financial statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Income statement (flow).
    IncomeStatement,
    /// Balance sheet (instant).
    BalanceSheet,
    /// Cash flow statement (flow).
    CashFlowStatement,
}

impl StatementKind {
    /// All statement kinds in reporting order.
    pub const ALL: [Self; 3] = [
        Self::IncomeStatement,
        Self::BalanceSheet,
        Self::CashFlowStatement,
    ];

    /// Returns the logical statement name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlowStatement => "cash_flow_statement",
        }
    }

    /// Parses a logical statement name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Returns true for statements whose values accumulate over a period
    /// rather than describing a single instant.
    #[must_use]
    pub const fn is_flow(&self) -> bool {
        !matches!(self, Self::BalanceSheet)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered statement document fetched from one filing.
///
/// The markup is kept as text; parsing into a document tree happens in the
/// engine so the value stays `Send` across await points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementDocument {
    /// Accession number of the filing the document came from.
    pub accession_number: String,
    /// Statement the document renders.
    pub kind: StatementKind,
    /// Raw HTML of the rendered report.
    pub html: String,
}

impl StatementDocument {
    /// Creates a statement document.
    #[must_use]
    pub fn new(
        accession_number: impl Into<String>,
        kind: StatementKind,
        html: impl Into<String>,
    ) -> Self {
        Self {
            accession_number: accession_number.into(),
            kind,
            html: html.into(),
        }
    }
}
