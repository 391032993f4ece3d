#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for filing statement consolidation.
//!
//! This crate provides the foundational abstractions shared by the engine,
//! the EDGAR adapter, the stores and the pipeline:
//!
//! - [`StatementTable`](statement::StatementTable) - One filing's parsed statement
//! - [`ConsolidatedStatement`](statement::ConsolidatedStatement) - Multi-period canonical statement
//! - [`FiscalPeriodMap`](fiscal::FiscalPeriodMap) - Quarter anchors per company
//! - [`FilingRegistry`](provider::FilingRegistry) - Filing listings
//! - [`DocumentFetcher`](provider::DocumentFetcher) - Rendered statement documents
//! - [`LabelDictionaryProvider`](provider::LabelDictionaryProvider) - Fact labels
//! - [`StatementStore`](cache::StatementStore) - Persistence abstraction

/// Store trait for consolidated statements and fiscal maps.
pub mod cache;
/// Error types for filing operations.
pub mod error;
/// Fiscal quarter anchors.
pub mod fiscal;
/// Tabular export of consolidated statements.
pub mod frame;
/// Statement frequency and filing form definitions.
pub mod frequency;
/// Collaborator traits for filings, documents and labels.
pub mod provider;
/// Per-filing and consolidated statement tables.
pub mod statement;
/// Core identifiers (Symbol, Filing, StatementKind, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::StatementStore;
pub use error::{FilingError, Result};
pub use fiscal::{FiscalPeriodMap, FiscalQuarter, MonthDay};
pub use frequency::{FormType, Frequency};
pub use provider::{
    DataProvider, DocumentFetcher, FilingRegistry, LabelDictionary, LabelDictionaryProvider,
};
pub use statement::{ConsolidatedStatement, RawTableRow, StatementRow, StatementTable};
pub use types::{Filing, StatementDocument, StatementKind, Symbol};
