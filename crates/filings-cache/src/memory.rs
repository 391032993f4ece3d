//! In-memory store implementation.

use async_trait::async_trait;
use chrono::Utc;
use filings_core::{
    ConsolidatedStatement, FiscalPeriodMap, Frequency, Result, StatementKind, StatementStore,
    Symbol,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Store entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: chrono::DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Key for statement entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StatementKey {
    symbol: Symbol,
    kind: StatementKind,
    frequency: Frequency,
}

impl StatementKey {
    fn new(symbol: &Symbol, kind: StatementKind, frequency: Frequency) -> Self {
        Self {
            symbol: symbol.clone(),
            kind,
            frequency,
        }
    }
}

/// In-memory store for tests and short-lived tools.
///
/// Data lives in `RwLock`-protected `HashMap`s and is lost when the store is
/// dropped. Statements are cloned on get and put.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    statements: RwLock<HashMap<StatementKey, CacheEntry<ConsolidatedStatement>>>,
    fiscal_periods: RwLock<HashMap<Symbol, CacheEntry<FiscalPeriodMap>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored statements.
    pub async fn statement_count(&self) -> usize {
        self.statements.read().await.len()
    }
}

#[async_trait]
impl StatementStore for InMemoryStore {
    #[instrument(skip(self), fields(symbol = %symbol, statement = %kind, frequency = %frequency))]
    async fn get_statement(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<Option<ConsolidatedStatement>> {
        let key = StatementKey::new(symbol, kind, frequency);
        let statements = self.statements.read().await;
        match statements.get(&key) {
            Some(entry) => {
                debug!("Store hit for statement");
                Ok(Some(entry.data.clone()))
            }
            None => {
                debug!("Store miss for statement");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, statement), fields(symbol = %symbol, statement = %kind, frequency = %frequency))]
    async fn put_statement(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
        statement: &ConsolidatedStatement,
    ) -> Result<()> {
        let key = StatementKey::new(symbol, kind, frequency);
        let mut statements = self.statements.write().await;
        statements.insert(key, CacheEntry::new(statement.clone()));
        debug!(
            periods = statement.period_count(),
            rows = statement.rows().len(),
            "Stored statement"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get_fiscal_periods(&self, symbol: &Symbol) -> Result<Option<FiscalPeriodMap>> {
        let maps = self.fiscal_periods.read().await;
        let found = maps.get(symbol).map(|entry| entry.data);
        debug!(hit = found.is_some(), "Fiscal period lookup");
        Ok(found)
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn put_fiscal_periods(&self, symbol: &Symbol, periods: &FiscalPeriodMap) -> Result<()> {
        let mut maps = self.fiscal_periods.write().await;
        maps.insert(symbol.clone(), CacheEntry::new(*periods));
        debug!(%periods, "Stored fiscal periods");
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn invalidate_fiscal_periods(&self, symbol: &Symbol) -> Result<bool> {
        let removed = self.fiscal_periods.write().await.remove(symbol).is_some();
        debug!(removed, "Invalidated fiscal periods");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut count = 0;

        {
            let mut statements = self.statements.write().await;
            let before = statements.len();
            statements.retain(|_, entry| !entry.is_stale(ttl));
            count += before - statements.len();
        }

        {
            let mut maps = self.fiscal_periods.write().await;
            let before = maps.len();
            maps.retain(|_, entry| !entry.is_stale(ttl));
            count += before - maps.len();
        }

        if count > 0 {
            debug!("Invalidated {} stale entries", count);
        }
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.statements.write().await.clear();
        self.fiscal_periods.write().await.clear();
        debug!("Cleared all stored data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filings_core::MonthDay;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_statement() -> ConsolidatedStatement {
        let mut statement = ConsolidatedStatement::new();
        statement.insert_value("Revenue", date(2023, 12, 31), Some(120.0));
        statement.insert_value("Revenue", date(2022, 12, 31), Some(100.0));
        statement.insert_value("Net income", date(2023, 12, 31), None);
        statement
    }

    fn calendar_year() -> FiscalPeriodMap {
        FiscalPeriodMap::new(
            MonthDay::new(3, 31).unwrap(),
            MonthDay::new(6, 30).unwrap(),
            MonthDay::new(9, 30).unwrap(),
            MonthDay::new(12, 31).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_statement_round_trip() {
        let store = InMemoryStore::new();
        let symbol = Symbol::new("AAPL");

        let missing = store
            .get_statement(&symbol, StatementKind::IncomeStatement, Frequency::Annual)
            .await
            .unwrap();
        assert!(missing.is_none());

        let statement = sample_statement();
        store
            .put_statement(
                &symbol,
                StatementKind::IncomeStatement,
                Frequency::Annual,
                &statement,
            )
            .await
            .unwrap();

        let stored = store
            .get_statement(&symbol, StatementKind::IncomeStatement, Frequency::Annual)
            .await
            .unwrap();
        assert_eq!(stored, Some(statement));
    }

    #[tokio::test]
    async fn test_statements_keyed_by_kind_and_frequency() {
        let store = InMemoryStore::new();
        let symbol = Symbol::new("AAPL");
        store
            .put_statement(
                &symbol,
                StatementKind::IncomeStatement,
                Frequency::Annual,
                &sample_statement(),
            )
            .await
            .unwrap();

        let quarterly = store
            .get_statement(&symbol, StatementKind::IncomeStatement, Frequency::Quarterly)
            .await
            .unwrap();
        assert!(quarterly.is_none());
        let balance = store
            .get_statement(&symbol, StatementKind::BalanceSheet, Frequency::Annual)
            .await
            .unwrap();
        assert!(balance.is_none());
    }

    #[tokio::test]
    async fn test_fiscal_periods_invalidation() {
        let store = InMemoryStore::new();
        let symbol = Symbol::new("MSFT");

        store
            .put_fiscal_periods(&symbol, &calendar_year())
            .await
            .unwrap();
        assert_eq!(
            store.get_fiscal_periods(&symbol).await.unwrap(),
            Some(calendar_year())
        );

        assert!(store.invalidate_fiscal_periods(&symbol).await.unwrap());
        assert!(!store.invalidate_fiscal_periods(&symbol).await.unwrap());
        assert!(store.get_fiscal_periods(&symbol).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_stale_and_clear() {
        let store = InMemoryStore::new();
        let symbol = Symbol::new("AAPL");
        store
            .put_statement(
                &symbol,
                StatementKind::BalanceSheet,
                Frequency::Quarterly,
                &sample_statement(),
            )
            .await
            .unwrap();
        store
            .put_fiscal_periods(&symbol, &calendar_year())
            .await
            .unwrap();

        let removed = store
            .invalidate_stale(Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.statement_count().await, 1);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let removed = store.invalidate_stale(Duration::ZERO).await.unwrap();
        assert_eq!(removed, 2);

        store
            .put_fiscal_periods(&symbol, &calendar_year())
            .await
            .unwrap();
        store.clear().await.unwrap();
        assert!(store.get_fiscal_periods(&symbol).await.unwrap().is_none());
    }
}
