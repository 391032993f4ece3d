//! No-op store implementation.

use async_trait::async_trait;
use filings_core::{
    ConsolidatedStatement, FiscalPeriodMap, Frequency, Result, StatementKind, StatementStore,
    Symbol,
};
use std::time::Duration;
use tracing::trace;

/// A store that keeps nothing.
///
/// Every lookup returns `Ok(None)` and every write returns `Ok(())`, so each
/// pipeline run rebuilds its statements from the filings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl NoopStore {
    /// Create a new no-op store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StatementStore for NoopStore {
    async fn get_statement(
        &self,
        _symbol: &Symbol,
        _kind: StatementKind,
        _frequency: Frequency,
    ) -> Result<Option<ConsolidatedStatement>> {
        trace!("NoopStore: get_statement called, returning None");
        Ok(None)
    }

    async fn put_statement(
        &self,
        _symbol: &Symbol,
        _kind: StatementKind,
        _frequency: Frequency,
        _statement: &ConsolidatedStatement,
    ) -> Result<()> {
        trace!("NoopStore: put_statement called, doing nothing");
        Ok(())
    }

    async fn get_fiscal_periods(&self, _symbol: &Symbol) -> Result<Option<FiscalPeriodMap>> {
        trace!("NoopStore: get_fiscal_periods called, returning None");
        Ok(None)
    }

    async fn put_fiscal_periods(
        &self,
        _symbol: &Symbol,
        _periods: &FiscalPeriodMap,
    ) -> Result<()> {
        trace!("NoopStore: put_fiscal_periods called, doing nothing");
        Ok(())
    }

    async fn invalidate_fiscal_periods(&self, _symbol: &Symbol) -> Result<bool> {
        trace!("NoopStore: invalidate_fiscal_periods called, returning false");
        Ok(false)
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        trace!("NoopStore: invalidate_stale called, returning 0");
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        trace!("NoopStore: clear called, doing nothing");
        Ok(())
    }
}
