//! SQLite-backed store implementation.

use async_trait::async_trait;
use chrono::Utc;
use filings_core::{
    ConsolidatedStatement, FilingError, FiscalPeriodMap, Frequency, MonthDay, Result,
    StatementKind, StatementStore, Symbol,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// SQLite-backed store for consolidated statements.
///
/// Statements are kept as JSON documents keyed by (symbol, statement,
/// frequency); fiscal period maps as one row per symbol. Data persists across
/// runs when opened on a file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| FilingError::Cache(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create a store backed by an in-memory database.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| FilingError::Cache(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS statements (
                symbol TEXT NOT NULL,
                statement TEXT NOT NULL,
                frequency TEXT NOT NULL,
                period_count INTEGER NOT NULL,
                latest_period TEXT,
                data_json TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, statement, frequency)
            )",
            [],
        )
        .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS fiscal_periods (
                symbol TEXT PRIMARY KEY NOT NULL,
                q1 TEXT NOT NULL,
                q2 TEXT NOT NULL,
                q3 TEXT NOT NULL,
                q4 TEXT NOT NULL,
                cached_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| FilingError::Cache(e.to_string()))?;

        debug!("SQLite store schema initialized");
        Ok(())
    }
}

#[async_trait]
impl StatementStore for SqliteStore {
    #[instrument(skip(self), fields(symbol = %symbol, statement = %kind, frequency = %frequency))]
    async fn get_statement(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<Option<ConsolidatedStatement>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let json = conn
            .query_row(
                "SELECT data_json FROM statements
                 WHERE symbol = ?1 AND statement = ?2 AND frequency = ?3",
                params![symbol.as_str(), kind.as_str(), frequency.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        match json {
            Some(json) => {
                let statement: ConsolidatedStatement =
                    serde_json::from_str(&json).map_err(|e| FilingError::Parse(e.to_string()))?;
                debug!(periods = statement.period_count(), "Store hit for statement");
                Ok(Some(statement))
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
        let cached_at = Utc::now().to_rfc3339();
        let data_json =
            serde_json::to_string(statement).map_err(|e| FilingError::Parse(e.to_string()))?;
        let latest = statement.latest_period().map(|p| p.to_string());
        let period_count = i64::try_from(statement.period_count())
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO statements
             (symbol, statement, frequency, period_count, latest_period, data_json, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                symbol.as_str(),
                kind.as_str(),
                frequency.as_str(),
                period_count,
                latest,
                data_json,
                cached_at
            ],
        )
        .map_err(|e| FilingError::Cache(e.to_string()))?;

        debug!(periods = period_count, "Stored statement");
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get_fiscal_periods(&self, symbol: &Symbol) -> Result<Option<FiscalPeriodMap>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let anchors = conn
            .query_row(
                "SELECT q1, q2, q3, q4 FROM fiscal_periods WHERE symbol = ?1",
                params![symbol.as_str()],
                |row| {
                    Ok([
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ])
                },
            )
            .optional()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let Some([q1, q2, q3, q4]) = anchors else {
            debug!("No stored fiscal periods");
            return Ok(None);
        };

        let map = FiscalPeriodMap::new(
            q1.parse::<MonthDay>()?,
            q2.parse::<MonthDay>()?,
            q3.parse::<MonthDay>()?,
            q4.parse::<MonthDay>()?,
        );
        debug!(%map, "Found stored fiscal periods");
        Ok(Some(map))
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn put_fiscal_periods(&self, symbol: &Symbol, periods: &FiscalPeriodMap) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO fiscal_periods (symbol, q1, q2, q3, q4, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                symbol.as_str(),
                periods.q1.to_string(),
                periods.q2.to_string(),
                periods.q3.to_string(),
                periods.q4.to_string(),
                cached_at
            ],
        )
        .map_err(|e| FilingError::Cache(e.to_string()))?;

        debug!(%periods, "Stored fiscal periods");
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn invalidate_fiscal_periods(&self, symbol: &Symbol) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let deleted = conn
            .execute(
                "DELETE FROM fiscal_periods WHERE symbol = ?1",
                params![symbol.as_str()],
            )
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        debug!(removed = deleted > 0, "Invalidated fiscal periods");
        Ok(deleted > 0)
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl)
                .map_err(|e| FilingError::Cache(format!("Invalid TTL duration: {e}")))?;
        let cutoff_str = cutoff.to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let mut total_deleted = 0usize;
        for table in ["statements", "fiscal_periods"] {
            total_deleted += conn
                .execute(
                    &format!("DELETE FROM {table} WHERE cached_at < ?1"),
                    params![cutoff_str],
                )
                .map_err(|e| FilingError::Cache(e.to_string()))?;
        }

        if total_deleted > 0 {
            debug!("Invalidated {} stale store entries", total_deleted);
        }
        Ok(total_deleted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM statements", [])
            .map_err(|e| FilingError::Cache(e.to_string()))?;
        conn.execute("DELETE FROM fiscal_periods", [])
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        debug!("Cleared all stored data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn apple_fiscal_year() -> FiscalPeriodMap {
        FiscalPeriodMap::new(
            MonthDay::new(12, 30).unwrap(),
            MonthDay::new(3, 30).unwrap(),
            MonthDay::new(6, 29).unwrap(),
            MonthDay::new(9, 28).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_sqlite_store_initialization() {
        let store = SqliteStore::in_memory();
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_statement_survives_storage() {
        let store = SqliteStore::in_memory().unwrap();
        let symbol = Symbol::new("aapl");

        let missing = store
            .get_statement(&symbol, StatementKind::CashFlowStatement, Frequency::Quarterly)
            .await
            .unwrap();
        assert!(missing.is_none());

        let mut statement = ConsolidatedStatement::new();
        statement.insert_value("Net cash from operations", date(2023, 7, 1), Some(-1_500.0));
        statement.insert_value("Net cash from operations", date(2023, 9, 30), Some(2_250.5));
        statement.insert_value("Dividends paid", date(2023, 9, 30), None);

        store
            .put_statement(
                &symbol,
                StatementKind::CashFlowStatement,
                Frequency::Quarterly,
                &statement,
            )
            .await
            .unwrap();

        let mut stored = store
            .get_statement(&symbol, StatementKind::CashFlowStatement, Frequency::Quarterly)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, statement);
        assert_eq!(stored.values("Dividends paid"), vec![None, None]);

        // write-once still holds after a reload
        assert!(!stored.insert_value("Net cash from operations", date(2023, 9, 30), Some(0.0)));
        assert_eq!(
            stored.value("Net cash from operations", date(2023, 9, 30)),
            Some(2_250.5)
        );
    }

    #[tokio::test]
    async fn test_put_statement_replaces() {
        let store = SqliteStore::in_memory().unwrap();
        let symbol = Symbol::new("MSFT");

        let mut first = ConsolidatedStatement::new();
        first.insert_value("Revenue", date(2023, 6, 30), Some(1.0));
        store
            .put_statement(&symbol, StatementKind::IncomeStatement, Frequency::Annual, &first)
            .await
            .unwrap();

        let mut second = first.clone();
        second.insert_value("Revenue", date(2024, 6, 30), Some(2.0));
        store
            .put_statement(&symbol, StatementKind::IncomeStatement, Frequency::Annual, &second)
            .await
            .unwrap();

        let stored = store
            .get_statement(&symbol, StatementKind::IncomeStatement, Frequency::Annual)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.period_count(), 2);
    }

    #[tokio::test]
    async fn test_fiscal_periods() {
        let store = SqliteStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        assert!(store.get_fiscal_periods(&symbol).await.unwrap().is_none());

        store
            .put_fiscal_periods(&symbol, &apple_fiscal_year())
            .await
            .unwrap();
        assert_eq!(
            store.get_fiscal_periods(&symbol).await.unwrap(),
            Some(apple_fiscal_year())
        );

        assert!(store.invalidate_fiscal_periods(&symbol).await.unwrap());
        assert!(store.get_fiscal_periods(&symbol).await.unwrap().is_none());
        assert!(!store.invalidate_fiscal_periods(&symbol).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate_stale_and_clear() {
        let store = SqliteStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");
        store
            .put_fiscal_periods(&symbol, &apple_fiscal_year())
            .await
            .unwrap();

        let removed = store
            .invalidate_stale(Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(removed, 0);

        store.clear().await.unwrap();
        assert!(store.get_fiscal_periods(&symbol).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let path = std::env::temp_dir().join(format!(
            "filings-store-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let symbol = Symbol::new("AAPL");

        {
            let store = SqliteStore::new(&path).unwrap();
            store
                .put_fiscal_periods(&symbol, &apple_fiscal_year())
                .await
                .unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        assert_eq!(
            reopened.get_fiscal_periods(&symbol).await.unwrap(),
            Some(apple_fiscal_year())
        );
        drop(reopened);
        let _ = std::fs::remove_file(&path);
    }
}
