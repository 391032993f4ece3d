//! Pipeline configuration.

use filings_core::{FilingError, Result};
use serde::{Deserialize, Serialize};

/// Filings merged per statement: the most recent one plus ten more.
pub const DEFAULT_MAX_FILINGS: usize = 11;

/// Settings for a [`StatementPipeline`](crate::StatementPipeline).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use filings::PipelineConfig;
///
/// let config = PipelineConfig::from_json(r#"{"refresh": true}"#).unwrap();
/// assert!(config.refresh);
/// assert_eq!(config.max_filings, 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Most recent filings merged into each statement.
    pub max_filings: usize,
    /// Merge filings even when the store already holds the statement.
    pub refresh: bool,
    /// Write built statements and fiscal period maps back to the store.
    pub persist: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_filings: DEFAULT_MAX_FILINGS,
            refresh: false,
            persist: true,
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| FilingError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets how many filings are merged per statement.
    #[must_use]
    pub const fn with_max_filings(mut self, max_filings: usize) -> Self {
        self.max_filings = max_filings;
        self
    }

    /// Sets whether stored statements are refreshed from new filings.
    #[must_use]
    pub const fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Sets whether results are written back to the store.
    #[must_use]
    pub const fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Rejects settings that cannot build anything.
    pub fn validate(&self) -> Result<()> {
        if self.max_filings == 0 {
            return Err(FilingError::InvalidParameter(
                "max_filings must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
