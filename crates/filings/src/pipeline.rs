//! Statement pipeline: filings in, consolidated statements out.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use filings_core::{
    ConsolidatedStatement, Filing, FilingError, FiscalPeriodMap, Frequency, LabelDictionary,
    Result, StatementKind, StatementStore, StatementTable, Symbol,
};
use filings_core::{DocumentFetcher, FilingRegistry, LabelDictionaryProvider};
use filings_engine::{
    consolidate, derive_fourth_quarter, infer_fiscal_periods, parse_statement, resolve_labels,
};

use crate::config::PipelineConfig;

/// The three statements of one company at one frequency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementSet {
    /// Income statement.
    pub income_statement: ConsolidatedStatement,
    /// Balance sheet.
    pub balance_sheet: ConsolidatedStatement,
    /// Cash flow statement.
    pub cash_flow_statement: ConsolidatedStatement,
}

impl StatementSet {
    /// Returns the statement of a kind.
    #[must_use]
    pub const fn get(&self, kind: StatementKind) -> &ConsolidatedStatement {
        match kind {
            StatementKind::IncomeStatement => &self.income_statement,
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::CashFlowStatement => &self.cash_flow_statement,
        }
    }

    fn slot(&mut self, kind: StatementKind) -> &mut ConsolidatedStatement {
        match kind {
            StatementKind::IncomeStatement => &mut self.income_statement,
            StatementKind::BalanceSheet => &mut self.balance_sheet,
            StatementKind::CashFlowStatement => &mut self.cash_flow_statement,
        }
    }

    /// Iterates over the statements in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (StatementKind, &ConsolidatedStatement)> {
        StatementKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Filing listing and label dictionary shared by the statements of one build.
struct Sources {
    filings: Vec<Filing>,
    labels: LabelDictionary,
}

/// Builds consolidated statements from a company's periodic filings.
///
/// For each statement the pipeline lists the company's filings, fetches and
/// parses the rendered statement of each, resolves fact labels and merges
/// the tables most recent first. A configured [`StatementStore`] short-cuts
/// the whole process once a statement has been built.
///
/// # Example
///
/// ```rust,ignore
/// use filings::{Frequency, StatementKind, StatementPipeline, Symbol};
///
/// let pipeline = StatementPipeline::with_edgar("MyApp/1.0 (contact@example.com)")?;
/// let income = pipeline
///     .build_statement(&Symbol::new("AAPL"), StatementKind::IncomeStatement, Frequency::Annual)
///     .await?;
/// println!("{}", income.to_frame()?);
/// ```
pub struct StatementPipeline {
    registry: Arc<dyn FilingRegistry>,
    documents: Arc<dyn DocumentFetcher>,
    labels: Arc<dyn LabelDictionaryProvider>,
    store: Option<Arc<dyn StatementStore>>,
    config: PipelineConfig,
}

impl std::fmt::Debug for StatementPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementPipeline")
            .field("registry", &self.registry.name())
            .field("documents", &self.documents.name())
            .field("labels", &self.labels.name())
            .field("store", &self.store.as_ref().map(|_| "configured"))
            .field("config", &self.config)
            .finish()
    }
}

impl StatementPipeline {
    /// Create a pipeline from its three collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<dyn FilingRegistry>,
        documents: Arc<dyn DocumentFetcher>,
        labels: Arc<dyn LabelDictionaryProvider>,
    ) -> Self {
        debug!(
            registry = registry.name(),
            documents = documents.name(),
            labels = labels.name(),
            "Creating statement pipeline"
        );
        Self {
            registry,
            documents,
            labels,
            store: None,
            config: PipelineConfig::default(),
        }
    }

    /// Create a pipeline backed entirely by SEC EDGAR.
    #[cfg(feature = "edgar")]
    pub fn with_edgar(user_agent: &str) -> Result<Self> {
        let provider = Arc::new(filings_edgar::EdgarProvider::new(user_agent)?);
        Ok(Self::new(provider.clone(), provider.clone(), provider))
    }

    /// Set the store consulted before building and written after.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn StatementStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the pipeline configuration.
    #[must_use]
    pub const fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds one consolidated statement.
    ///
    /// A stored statement is returned as is unless `refresh` is set, in which
    /// case new filings are merged into it. Filings whose statement is missing
    /// or unparseable are skipped; any other error aborts the build.
    #[instrument(skip(self), fields(symbol = %symbol, statement = %kind, frequency = %frequency))]
    pub async fn build_statement(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<ConsolidatedStatement> {
        let sources = OnceCell::new();
        self.build_with(symbol, kind, frequency, &sources).await
    }

    /// Builds the income statement, balance sheet and cash flow statement.
    ///
    /// The filing listing and label dictionary are fetched at most once.
    #[instrument(skip(self), fields(symbol = %symbol, frequency = %frequency))]
    pub async fn build_all(&self, symbol: &Symbol, frequency: Frequency) -> Result<StatementSet> {
        let sources = OnceCell::new();
        let mut set = StatementSet::default();
        for kind in StatementKind::ALL {
            *set.slot(kind) = self.build_with(symbol, kind, frequency, &sources).await?;
        }
        Ok(set)
    }

    /// Returns the company's fiscal period map.
    ///
    /// A stored map is used when present. Otherwise the map is inferred from
    /// the latest annual income statement period and the quarterly income
    /// statement periods, then stored.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn fiscal_periods(&self, symbol: &Symbol) -> Result<FiscalPeriodMap> {
        if let Some(map) = self.stored_fiscal_periods(symbol).await? {
            return Ok(map);
        }

        let annual = self
            .build_statement(symbol, StatementKind::IncomeStatement, Frequency::Annual)
            .await?;
        let anchor = annual_anchor(&annual)?;
        let quarterly = self
            .build_statement(symbol, StatementKind::IncomeStatement, Frequency::Quarterly)
            .await?;
        self.infer_and_store(symbol, anchor, &quarterly).await
    }

    /// Drops the stored fiscal period map so the next lookup infers it again.
    ///
    /// Call after new annual data arrives. Returns true if a map was removed.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn invalidate_fiscal_periods(&self, symbol: &Symbol) -> Result<bool> {
        match &self.store {
            Some(store) => store.invalidate_fiscal_periods(symbol).await,
            None => Ok(false),
        }
    }

    /// Builds a quarterly statement including the fourth quarters that only
    /// annual reports cover.
    ///
    /// Each frequency's filing listing and label dictionary are fetched once,
    /// and income statements already built here feed fiscal inference.
    #[instrument(skip(self), fields(symbol = %symbol, statement = %kind))]
    pub async fn quarterly_with_fourth_quarter(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
    ) -> Result<ConsolidatedStatement> {
        let quarterly_sources = OnceCell::new();
        let annual_sources = OnceCell::new();
        let quarterly = self
            .build_with(symbol, kind, Frequency::Quarterly, &quarterly_sources)
            .await?;
        let annual = self
            .build_with(symbol, kind, Frequency::Annual, &annual_sources)
            .await?;

        let fiscal = match self.stored_fiscal_periods(symbol).await? {
            Some(map) => map,
            None if kind == StatementKind::IncomeStatement => {
                self.infer_and_store(symbol, annual_anchor(&annual)?, &quarterly)
                    .await?
            }
            None => {
                let income = StatementKind::IncomeStatement;
                let income_annual = self
                    .build_with(symbol, income, Frequency::Annual, &annual_sources)
                    .await?;
                let anchor = annual_anchor(&income_annual)?;
                let income_quarterly = self
                    .build_with(symbol, income, Frequency::Quarterly, &quarterly_sources)
                    .await?;
                self.infer_and_store(symbol, anchor, &income_quarterly)
                    .await?
            }
        };
        Ok(derive_fourth_quarter(&quarterly, &annual, &fiscal, kind))
    }

    async fn stored_fiscal_periods(&self, symbol: &Symbol) -> Result<Option<FiscalPeriodMap>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let map = store.get_fiscal_periods(symbol).await?;
        if let Some(map) = &map {
            debug!(%map, "Using stored fiscal periods");
        }
        Ok(map)
    }

    async fn infer_and_store(
        &self,
        symbol: &Symbol,
        anchor: NaiveDate,
        quarterly: &ConsolidatedStatement,
    ) -> Result<FiscalPeriodMap> {
        let quarterly_dates: Vec<_> = quarterly.periods().collect();
        let map = infer_fiscal_periods(anchor, &quarterly_dates)?;
        debug!(%anchor, %map, "Inferred fiscal periods");

        if self.config.persist {
            if let Some(store) = &self.store {
                store.put_fiscal_periods(symbol, &map).await?;
            }
        }
        Ok(map)
    }

    async fn build_with(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
        sources: &OnceCell<Sources>,
    ) -> Result<ConsolidatedStatement> {
        let stored = match &self.store {
            Some(store) => store.get_statement(symbol, kind, frequency).await?,
            None => None,
        };
        let existing = match stored {
            Some(statement) if !self.config.refresh => {
                debug!(
                    periods = statement.period_count(),
                    "Using stored statement"
                );
                return Ok(statement);
            }
            stored => stored.unwrap_or_default(),
        };

        let sources = sources
            .get_or_try_init(|| self.sources(symbol, frequency))
            .await?;
        let statement = self
            .merge_filings(symbol, kind, frequency, existing, sources)
            .await?;

        if self.config.persist {
            if let Some(store) = &self.store {
                store
                    .put_statement(symbol, kind, frequency, &statement)
                    .await?;
            }
        }
        Ok(statement)
    }

    async fn sources(&self, symbol: &Symbol, frequency: Frequency) -> Result<Sources> {
        let filings = self
            .registry
            .filings(symbol, frequency.form_type())
            .await?;
        debug!(count = filings.len(), form = %frequency.form_type(), "Listed filings");
        let labels = self.labels.labels(symbol).await?;
        Ok(Sources { filings, labels })
    }

    async fn merge_filings(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
        mut statement: ConsolidatedStatement,
        sources: &Sources,
    ) -> Result<ConsolidatedStatement> {
        for filing in sources.filings.iter().take(self.config.max_filings) {
            let table = match self.filing_table(symbol, filing, kind).await {
                Ok(table) => table,
                Err(e) if e.is_skippable() => {
                    warn!(
                        accession = %filing.accession_number,
                        error = %e,
                        "Skipping filing"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            let table = resolve_labels(table, &sources.labels);
            statement = consolidate(statement, &table, frequency);
        }
        debug!(
            periods = statement.period_count(),
            rows = statement.rows().len(),
            "Built statement"
        );
        Ok(statement)
    }

    async fn filing_table(
        &self,
        symbol: &Symbol,
        filing: &Filing,
        kind: StatementKind,
    ) -> Result<StatementTable> {
        let document = self
            .documents
            .fetch_statement(symbol, &filing.accession_number, kind)
            .await?;
        parse_statement(&document)
    }
}

/// The latest annual income statement period anchors the fiscal year.
fn annual_anchor(annual: &ConsolidatedStatement) -> Result<NaiveDate> {
    annual.latest_period().ok_or(FilingError::InsufficientData {
        required: 1,
        found: 0,
    })
}
