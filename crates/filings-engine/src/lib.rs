#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Merging per-filing tables into consolidated statements.
pub mod consolidate;
/// Fiscal period inference and fourth-quarter derivation.
pub mod fiscal;
/// Fact label resolution.
pub mod labels;
/// Rendered statement parsing.
pub mod parser;
/// Period label parsing and column normalization.
pub mod periods;

pub use consolidate::{MergePath, QUARTERLY_COLUMN_CAP, consolidate};
pub use fiscal::{derive_fourth_quarter, infer_fiscal_periods};
pub use labels::{resolve_label, resolve_labels};
pub use parser::{parse_statement, parse_statement_html};
pub use periods::{canonical_label, normalize_periods, parse_period_label};
