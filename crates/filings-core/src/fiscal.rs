//! Fiscal quarter anchors.
//!
//! A company's fiscal calendar is captured as four year-independent
//! month-days, one per quarter end. [`FiscalPeriodMap::quarter_of`] classifies
//! a period end against those anchors.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FilingError;

/// Largest gap, in days, between a period end and an anchor that still
/// classifies the period under that anchor. Covers 52/53-week calendars.
pub const ANCHOR_TOLERANCE_DAYS: i64 = 7;

/// A year-independent month and day, rendered as `MM-DD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Creates a month-day, `None` if no year has that date.
    #[must_use]
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so 02-29 is accepted.
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }

    /// Month-day of a calendar date.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    /// Returns the month (1-12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Returns the day of month.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Returns true if the date falls on this month-day.
    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }

    /// Places this month-day in a year. 02-29 becomes 02-28 outside leap years.
    #[must_use]
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.month, self.day - 1))
    }

    /// Days between the date and the nearest occurrence of this month-day.
    #[must_use]
    pub fn distance_days(&self, date: NaiveDate) -> i64 {
        (date.year() - 1..=date.year() + 1)
            .filter_map(|year| self.in_year(year))
            .map(|anchor| (date - anchor).num_days().abs())
            .min()
            .unwrap_or(i64::MAX)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for MonthDay {
    type Err = FilingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FilingError::Parse(format!("invalid month-day '{s}'"));
        let (month, day) = s.split_once('-').ok_or_else(invalid)?;
        let month = month.parse().map_err(|_| invalid())?;
        let day = day.parse().map_err(|_| invalid())?;
        Self::new(month, day).ok_or_else(invalid)
    }
}

impl TryFrom<String> for MonthDay {
    type Error = FilingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthDay> for String {
    fn from(value: MonthDay) -> Self {
        value.to_string()
    }
}

/// Fiscal quarter label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FiscalQuarter {
    /// First fiscal quarter.
    Q1,
    /// Second fiscal quarter.
    Q2,
    /// Third fiscal quarter.
    Q3,
    /// Fourth fiscal quarter, ending on the fiscal year end.
    Q4,
}

impl FiscalQuarter {
    /// All quarters in fiscal order.
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    /// Returns the label, e.g. `Q1`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-company quarter end anchors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriodMap {
    /// First quarter end.
    pub q1: MonthDay,
    /// Second quarter end.
    pub q2: MonthDay,
    /// Third quarter end.
    pub q3: MonthDay,
    /// Fourth quarter end, which is the fiscal year end.
    pub q4: MonthDay,
}

impl FiscalPeriodMap {
    /// Creates a map from its four anchors.
    #[must_use]
    pub const fn new(q1: MonthDay, q2: MonthDay, q3: MonthDay, q4: MonthDay) -> Self {
        Self { q1, q2, q3, q4 }
    }

    /// Returns the anchor for a quarter.
    #[must_use]
    pub const fn anchor(&self, quarter: FiscalQuarter) -> MonthDay {
        match quarter {
            FiscalQuarter::Q1 => self.q1,
            FiscalQuarter::Q2 => self.q2,
            FiscalQuarter::Q3 => self.q3,
            FiscalQuarter::Q4 => self.q4,
        }
    }

    /// Classifies a period end.
    ///
    /// An exact month-day match wins; otherwise the nearest anchor within
    /// [`ANCHOR_TOLERANCE_DAYS`] is used.
    #[must_use]
    pub fn quarter_of(&self, date: NaiveDate) -> Option<FiscalQuarter> {
        if let Some(quarter) = FiscalQuarter::ALL
            .into_iter()
            .find(|q| self.anchor(*q).matches(date))
        {
            return Some(quarter);
        }
        FiscalQuarter::ALL
            .into_iter()
            .map(|q| (q, self.anchor(q).distance_days(date)))
            .filter(|(_, distance)| *distance <= ANCHOR_TOLERANCE_DAYS)
            .min_by_key(|(_, distance)| *distance)
            .map(|(q, _)| q)
    }
}

impl fmt::Display for FiscalPeriodMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Q1={} Q2={} Q3={} Q4={}",
            self.q1, self.q2, self.q3, self.q4
        )
    }
}
