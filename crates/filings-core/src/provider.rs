//! Collaborator traits for filings, documents and labels.
//!
//! This module defines the traits the pipeline pulls its inputs through:
//!
//! - [`DataProvider`] - Base trait for all providers
//! - [`FilingRegistry`] - Lists periodic reports for a symbol
//! - [`DocumentFetcher`] - Retrieves one rendered statement from a filing
//! - [`LabelDictionaryProvider`] - Maps fact identifiers to display labels

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::{
    error::Result,
    frequency::FormType,
    types::{Filing, StatementDocument, StatementKind, Symbol},
};

/// Base trait for all providers.
///
/// All providers implement this trait to describe themselves and the forms
/// they can serve.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;

    /// Returns the filing forms this provider can list and fetch.
    fn supported_forms(&self) -> &[FormType];
}

/// Lists periodic reports for a symbol.
#[async_trait]
pub trait FilingRegistry: DataProvider {
    /// Returns the filings of a form, most recent first.
    async fn filings(&self, symbol: &Symbol, form_type: FormType) -> Result<Vec<Filing>>;
}

/// Retrieves rendered statements from filings.
#[async_trait]
pub trait DocumentFetcher: DataProvider {
    /// Fetches one statement of a filing.
    ///
    /// Returns [`FilingError::NotFound`](crate::FilingError::NotFound) when the
    /// filing's manifest does not list the statement.
    async fn fetch_statement(
        &self,
        symbol: &Symbol,
        accession_number: &str,
        kind: StatementKind,
    ) -> Result<StatementDocument>;
}

/// Supplies the fact label dictionary for a company.
#[async_trait]
pub trait LabelDictionaryProvider: DataProvider {
    /// Returns the label dictionary for a symbol.
    async fn labels(&self, symbol: &Symbol) -> Result<LabelDictionary>;
}

/// Mapping from fact identifiers (e.g. `Revenues`) to display labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDictionary {
    labels: HashMap<String, String>,
}

impl LabelDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label for a fact identifier.
    pub fn insert(&mut self, fact: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(fact.into(), label.into());
    }

    /// Returns the label for a fact identifier.
    #[must_use]
    pub fn get(&self, fact: &str) -> Option<&str> {
        self.labels.get(fact).map(String::as_str)
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if there are no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
