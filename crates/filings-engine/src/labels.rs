//! Fact identifier to display label resolution.

use filings_core::{LabelDictionary, StatementTable};

/// Strips the taxonomy prefix (`us-gaap_`, `aapl_`) from a fact key.
///
/// Keys without an underscore are returned unchanged.
#[must_use]
pub fn fact_name(key: &str) -> &str {
    key.split_once('_').map_or(key, |(_, name)| name)
}

/// Resolves one key, keeping it verbatim when the dictionary has no label.
#[must_use]
pub fn resolve_label(key: &str, labels: &LabelDictionary) -> String {
    labels
        .get(fact_name(key))
        .map_or_else(|| key.to_string(), str::to_string)
}

/// Replaces every row key with its display label where one is known.
#[must_use]
pub fn resolve_labels(table: StatementTable, labels: &LabelDictionary) -> StatementTable {
    table.map_keys(|key| resolve_label(key, labels))
}
