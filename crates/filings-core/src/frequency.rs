//! Statement frequency and filing form definitions.
//!
//! This module defines [`Frequency`] for the reporting cadence of a consolidated
//! statement and [`FormType`] for the filing forms that carry each cadence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting cadence of a statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Annual reporting period (10-K).
    #[default]
    Annual,
    /// Quarterly reporting period (10-Q).
    Quarterly,
}

impl Frequency {
    /// Returns the filing form that reports at this frequency.
    #[must_use]
    pub const fn form_type(&self) -> FormType {
        match self {
            Self::Annual => FormType::TenK,
            Self::Quarterly => FormType::TenQ,
        }
    }

    /// Returns the lowercase name used as a storage key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }

    /// Parses a storage key back into a frequency.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "annual" => Some(Self::Annual),
            "quarterly" => Some(Self::Quarterly),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Periodic report form filed with the SEC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormType {
    /// Annual report.
    #[serde(rename = "10-K")]
    TenK,
    /// Quarterly report.
    #[serde(rename = "10-Q")]
    TenQ,
}

impl FormType {
    /// Returns the form code as it appears in EDGAR listings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TenK => "10-K",
            Self::TenQ => "10-Q",
        }
    }

    /// Matches an EDGAR form code exactly. Amendments (`10-K/A`) are not matched.
    #[must_use]
    pub fn from_form(form: &str) -> Option<Self> {
        match form {
            "10-K" => Some(Self::TenK),
            "10-Q" => Some(Self::TenQ),
            _ => None,
        }
    }

    /// Returns the reporting cadence of this form.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        match self {
            Self::TenK => Frequency::Annual,
            Self::TenQ => Frequency::Quarterly,
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
