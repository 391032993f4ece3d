#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR adapter for filing listings, rendered statements and fact labels.
//!
//! This crate provides:
//!
//! - CIK (Central Index Key) lookup from ticker symbols
//! - Recent 10-K / 10-Q listings from the submissions API
//! - Rendered statement pages located through each filing's `FilingSummary.xml`
//! - Fact label dictionaries from the company facts API
//!
//! # Example
//!
//! ```no_run
//! use filings_edgar::EdgarProvider;
//! use filings_core::{DocumentFetcher, FilingRegistry, FormType, StatementKind, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = EdgarProvider::new("MyApp/1.0 (contact@example.com)")?;
//!
//!     let symbol = Symbol::new("AAPL");
//!     let filings = provider.filings(&symbol, FormType::TenK).await?;
//!     let latest = &filings[0];
//!     let document = provider
//!         .fetch_statement(&symbol, &latest.accession_number, StatementKind::BalanceSheet)
//!         .await?;
//!     println!("{} bytes", document.html.len());
//!
//!     Ok(())
//! }
//! ```

/// `FilingSummary.xml` manifest parsing.
pub mod manifest;

use async_trait::async_trait;
use chrono::NaiveDate;
use filings_core::{
    DataProvider, DocumentFetcher, Filing, FilingError, FilingRegistry, FormType, LabelDictionary,
    LabelDictionaryProvider, Result, StatementDocument, StatementKind, Symbol,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

use crate::manifest::{find_statement, parse_manifest};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// SEC filing archive base URL
const ARCHIVES_BASE_URL: &str = "https://www.sec.gov/Archives/edgar/data";

/// SEC company tickers URL
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Taxonomy whose concept labels make up the label dictionary.
const LABEL_TAXONOMY: &str = "us-gaap";

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Response of a rate-limited GET, split by status.
enum Fetched {
    Body(reqwest::Response),
    Missing,
}

/// SEC EDGAR provider.
///
/// Lists filings, fetches rendered statements and supplies fact labels.
/// Implements rate limiting per SEC requirements (max 10 requests/second).
/// The ticker to CIK table is downloaded once per provider.
#[derive(Debug)]
pub struct EdgarProvider {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    ciks: OnceCell<HashMap<String, String>>,
}

impl EdgarProvider {
    /// Create a new EDGAR provider with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Example
    /// ```
    /// use filings_edgar::EdgarProvider;
    ///
    /// let provider = EdgarProvider::new("MyApp/1.0 (contact@example.com)").unwrap();
    /// ```
    pub fn new(user_agent: &str) -> Result<Self> {
        if user_agent.trim().is_empty() {
            return Err(FilingError::ProviderNotConfigured(
                "SEC EDGAR requires an identifying user agent".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FilingError::ProviderNotConfigured(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Create a new EDGAR provider with a custom HTTP client.
    ///
    /// The client must send an identifying user agent.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
            ciks: OnceCell::new(),
        }
    }

    async fn get(&self, url: &str) -> Result<Fetched> {
        self.rate_limiter.lock().await.wait().await;

        debug!(url, "Fetching from SEC");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FilingError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Fetched::Missing);
        }
        if !response.status().is_success() {
            return Err(FilingError::Network(format!(
                "Failed to fetch {url}: HTTP {}",
                response.status()
            )));
        }
        Ok(Fetched::Body(response))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        match self.get(url).await? {
            Fetched::Body(response) => response
                .json()
                .await
                .map_err(|e| FilingError::Parse(format!("Failed to parse {what}: {e}"))),
            Fetched::Missing => Err(FilingError::Network(format!(
                "Failed to fetch {what}: HTTP 404"
            ))),
        }
    }

    async fn get_text(&self, url: &str) -> Result<Option<String>> {
        match self.get(url).await? {
            Fetched::Body(response) => response
                .text()
                .await
                .map(Some)
                .map_err(|e| FilingError::Network(e.to_string())),
            Fetched::Missing => Ok(None),
        }
    }

    /// Look up a company's CIK number from its ticker symbol.
    ///
    /// # Returns
    /// The company's CIK number as a zero-padded 10-digit string
    pub async fn get_cik(&self, ticker: &str) -> Result<String> {
        if ticker.is_empty() {
            return Err(FilingError::InvalidParameter("Empty ticker".to_string()));
        }

        let ciks = self
            .ciks
            .get_or_try_init(|| async {
                debug!("Fetching company tickers from SEC");
                let data: HashMap<String, CompanyTickerInfo> = self
                    .get_json(COMPANY_TICKERS_URL, "company tickers")
                    .await?;
                Ok::<_, FilingError>(ticker_table(data))
            })
            .await?;

        let cik = ciks
            .get(&ticker.to_uppercase())
            .cloned()
            .ok_or_else(|| FilingError::SymbolNotFound(ticker.to_string()))?;
        debug!("Found CIK {} for ticker {}", cik, ticker);
        Ok(cik)
    }

    /// Fetch company facts from SEC EDGAR.
    async fn fetch_company_facts(&self, cik: &str) -> Result<CompanyFactsResponse> {
        let url = format!("{EDGAR_BASE_URL}/api/xbrl/companyfacts/CIK{cik:0>10}.json");
        self.get_json(&url, "company facts").await
    }

    /// Fetch company submissions/filings metadata.
    async fn fetch_company_submissions(&self, cik: &str) -> Result<CompanySubmissions> {
        let url = format!("{EDGAR_BASE_URL}/submissions/CIK{cik:0>10}.json");
        self.get_json(&url, "submissions").await
    }
}

/// Builds the ticker to zero-padded CIK table.
fn ticker_table(data: HashMap<String, CompanyTickerInfo>) -> HashMap<String, String> {
    data.into_values()
        .map(|company| {
            (
                company.ticker.to_uppercase(),
                format!("{:0>10}", company.cik_str),
            )
        })
        .collect()
}

/// Directory of a filing in the EDGAR archive.
fn filing_base_url(cik: &str, accession_number: &str) -> String {
    let cik = cik.trim_start_matches('0');
    let accession = accession_number.replace('-', "");
    format!("{ARCHIVES_BASE_URL}/{cik}/{accession}")
}

/// Recent filings of one form, in the order EDGAR lists them (most recent first).
fn recent_filings(
    submissions: &CompanySubmissions,
    symbol: &Symbol,
    form_type: FormType,
) -> Vec<Filing> {
    let recent = &submissions.filings.recent;
    recent
        .form
        .iter()
        .zip(&recent.accession_number)
        .enumerate()
        .filter(|(_, (form, _))| FormType::from_form(form) == Some(form_type))
        .map(|(i, (_, accession))| {
            let filing = Filing::new(accession.clone(), form_type, symbol.clone());
            match recent
                .report_date
                .get(i)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            {
                Some(date) => filing.with_report_date(date),
                None => filing,
            }
        })
        .collect()
}

/// Label dictionary from the us-gaap concepts of a company facts response.
fn label_dictionary(facts: &CompanyFactsResponse) -> LabelDictionary {
    facts
        .facts
        .get(LABEL_TAXONOMY)
        .map(|concepts| {
            concepts
                .iter()
                .filter_map(|(name, tag)| tag.label.as_ref().map(|label| (name.clone(), label.clone())))
                .collect()
        })
        .unwrap_or_default()
}

impl DataProvider for EdgarProvider {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn description(&self) -> &str {
        "SEC EDGAR filings, rendered statements and fact labels from 10-K and 10-Q reports"
    }

    fn supported_forms(&self) -> &[FormType] {
        &[FormType::TenK, FormType::TenQ]
    }
}

#[async_trait]
impl FilingRegistry for EdgarProvider {
    #[instrument(skip(self), fields(symbol = %symbol, form = %form_type))]
    async fn filings(&self, symbol: &Symbol, form_type: FormType) -> Result<Vec<Filing>> {
        let cik = self.get_cik(symbol.as_str()).await?;
        let submissions = self.fetch_company_submissions(&cik).await?;
        let filings = recent_filings(&submissions, symbol, form_type);
        debug!(count = filings.len(), "Listed filings");
        Ok(filings)
    }
}

#[async_trait]
impl DocumentFetcher for EdgarProvider {
    #[instrument(skip(self), fields(symbol = %symbol, statement = %kind))]
    async fn fetch_statement(
        &self,
        symbol: &Symbol,
        accession_number: &str,
        kind: StatementKind,
    ) -> Result<StatementDocument> {
        let not_found = || FilingError::NotFound {
            accession: accession_number.to_string(),
            statement: kind.as_str().to_string(),
        };

        let cik = self.get_cik(symbol.as_str()).await?;
        let base = filing_base_url(&cik, accession_number);

        let manifest = self
            .get_text(&format!("{base}/FilingSummary.xml"))
            .await?
            .ok_or_else(not_found)?;
        let reports = parse_manifest(&manifest)?;
        let report = find_statement(&reports, kind).ok_or_else(not_found)?;
        let file_name = report.html_file_name.as_deref().ok_or_else(not_found)?;
        debug!(report = %report.short_name, file_name, "Located statement");

        let html = self
            .get_text(&format!("{base}/{file_name}"))
            .await?
            .ok_or_else(not_found)?;
        Ok(StatementDocument::new(accession_number, kind, html))
    }
}

#[async_trait]
impl LabelDictionaryProvider for EdgarProvider {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn labels(&self, symbol: &Symbol) -> Result<LabelDictionary> {
        let cik = self.get_cik(symbol.as_str()).await?;
        let facts = self.fetch_company_facts(&cik).await?;
        let labels = label_dictionary(&facts);
        debug!(count = labels.len(), "Loaded fact labels");
        Ok(labels)
    }
}

// =============================================================================
// SEC API Response Types
// =============================================================================

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
}

/// Company facts response from SEC API.
#[derive(Debug, Deserialize)]
struct CompanyFactsResponse {
    /// Facts organized by taxonomy (us-gaap, dei, etc.), then by concept
    facts: HashMap<String, HashMap<String, TagFacts>>,
}

/// Facts for a specific XBRL tag. Only the label is read.
#[derive(Debug, Deserialize)]
struct TagFacts {
    /// Label/description
    #[serde(default)]
    label: Option<String>,
}

/// Company submissions/filings metadata.
#[derive(Debug, Deserialize)]
struct CompanySubmissions {
    /// Filing history
    filings: SubmissionFilings,
}

/// Filing history sections of a submissions response.
#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    /// Most recent filings as parallel arrays
    recent: RecentFilings,
}

/// Most recent filings, one array per attribute.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_traits() {
        let provider = EdgarProvider::new("Test/1.0 (test@example.com)").unwrap();

        assert_eq!(provider.name(), "SEC EDGAR");
        assert!(!provider.description().is_empty());
        assert!(provider.supported_forms().contains(&FormType::TenK));
        assert!(provider.supported_forms().contains(&FormType::TenQ));
    }

    #[test]
    fn test_requires_user_agent() {
        assert!(matches!(
            EdgarProvider::new("  "),
            Err(FilingError::ProviderNotConfigured(_))
        ));
    }

    #[test]
    fn test_ticker_table_pads_cik() {
        let data: HashMap<String, CompanyTickerInfo> = serde_json::from_str(
            r#"{"0":{"cik_str":320193,"ticker":"AAPL","title":"Apple Inc."},
                "1":{"cik_str":789019,"ticker":"msft","title":"MICROSOFT CORP"}}"#,
        )
        .unwrap();
        let table = ticker_table(data);
        assert_eq!(table.get("AAPL").map(String::as_str), Some("0000320193"));
        assert_eq!(table.get("MSFT").map(String::as_str), Some("0000789019"));
    }

    #[test]
    fn test_filing_base_url() {
        assert_eq!(
            filing_base_url("0000320193", "0000320193-23-000106"),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106"
        );
    }

    #[test]
    fn test_recent_filings_filters_form() {
        let submissions: CompanySubmissions = serde_json::from_str(
            r#"{"name":"Apple Inc.","filings":{"recent":{
                "accessionNumber":["0000320193-24-000006","0000320193-23-000106","0000320193-23-000077","0000320193-23-000105"],
                "form":["10-Q","10-K","10-Q","10-K/A"],
                "reportDate":["2023-12-30","2023-09-30","2023-07-01",""]
            },"files":[]}}"#,
        )
        .unwrap();
        let symbol = Symbol::new("AAPL");

        let quarterly = recent_filings(&submissions, &symbol, FormType::TenQ);
        assert_eq!(quarterly.len(), 2);
        assert_eq!(quarterly[0].accession_number, "0000320193-24-000006");
        assert_eq!(
            quarterly[1].report_date,
            NaiveDate::from_ymd_opt(2023, 7, 1)
        );

        let annual = recent_filings(&submissions, &symbol, FormType::TenK);
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].form_type, FormType::TenK);
    }

    #[test]
    fn test_label_dictionary_reads_us_gaap() {
        let facts: CompanyFactsResponse = serde_json::from_str(
            r#"{"cik":320193,"entityName":"Apple Inc.","facts":{
                "dei":{"EntityCommonStockSharesOutstanding":{"label":"Entity Common Stock, Shares Outstanding","units":{}}},
                "us-gaap":{
                    "Revenues":{"label":"Revenues","description":"Amount of revenue.","units":{"USD":[{"end":"2023-09-30","val":1.0}]}},
                    "NetIncomeLoss":{"label":"Net Income (Loss) Attributable to Parent","units":{}},
                    "Unlabeled":{"label":null,"units":{}}
                }}}"#,
        )
        .unwrap();
        let labels = label_dictionary(&facts);
        assert_eq!(labels.len(), 2);
        assert_eq!(
            labels.get("NetIncomeLoss"),
            Some("Net Income (Loss) Attributable to Parent")
        );
        assert_eq!(labels.get("EntityCommonStockSharesOutstanding"), None);
    }
}
