//! Store trait for consolidated statements and fiscal period maps.
//!
//! This module defines the [`StatementStore`] trait that provides a unified
//! interface for persisting the long-lived outputs of consolidation.

use async_trait::async_trait;
use std::time::Duration;

use crate::{
    error::Result,
    fiscal::FiscalPeriodMap,
    frequency::Frequency,
    statement::ConsolidatedStatement,
    types::{StatementKind, Symbol},
};

/// Trait for persisting consolidated statements and fiscal period maps.
///
/// Implementations can store data in various backends (SQLite, in-memory, etc.)
/// so repeated runs do not refetch and reparse every filing.
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Retrieves a stored statement.
    ///
    /// Returns `Ok(Some(statement))` if stored, `Ok(None)` if not.
    async fn get_statement(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<Option<ConsolidatedStatement>>;

    /// Stores a statement, replacing any previous one for the same key.
    async fn put_statement(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
        statement: &ConsolidatedStatement,
    ) -> Result<()>;

    /// Retrieves the stored fiscal period map for a symbol.
    async fn get_fiscal_periods(&self, symbol: &Symbol) -> Result<Option<FiscalPeriodMap>>;

    /// Stores the fiscal period map for a symbol.
    async fn put_fiscal_periods(&self, symbol: &Symbol, periods: &FiscalPeriodMap) -> Result<()>;

    /// Removes the fiscal period map for a symbol so it is inferred again.
    ///
    /// Returns true if a map was removed.
    async fn invalidate_fiscal_periods(&self, symbol: &Symbol) -> Result<bool>;

    /// Removes entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all stored data.
    async fn clear(&self) -> Result<()>;
}
