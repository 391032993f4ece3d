//! Error types for filing operations.
//!
//! This module defines [`FilingError`] which covers all error cases that can occur
//! when listing filings, parsing statement documents, consolidating statements,
//! inferring fiscal periods, or persisting results.

use thiserror::Error;

/// Errors that can occur during filing operations.
#[derive(Error, Debug)]
pub enum FilingError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The requested statement is not listed in the filing's manifest.
    #[error("Statement {statement} not found in filing {accession}")]
    NotFound {
        /// Accession number of the filing that was searched.
        accession: String,
        /// Logical statement name that was requested.
        statement: String,
    },

    /// Header dates or required structural elements could not be parsed.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Not enough observations to make a determination.
    #[error("Insufficient data: required {required}, found {found}")]
    InsufficientData {
        /// Number of observations required.
        required: usize,
        /// Number of observations available.
        found: usize,
    },

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the statement store.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl FilingError {
    /// Returns true when a single filing can be skipped on this error without
    /// abandoning the statement being built.
    #[must_use]
    pub const fn is_skippable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::MalformedDocument(_))
    }
}

/// Result type alias using [`FilingError`].
pub type Result<T> = std::result::Result<T, FilingError>;
