//! `FilingSummary.xml` manifest parsing.
//!
//! Each filing ships a manifest listing the rendered report pages (`R1.htm`,
//! `R2.htm`, ...) with a short and a long name. Statements are located by
//! matching the short name against the names companies commonly use.

use std::collections::HashMap;

use filings_core::{FilingError, Result, StatementKind};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One `<Report>` entry of a filing manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestReport {
    /// Short name, e.g. `CONSOLIDATED BALANCE SHEETS`.
    pub short_name: String,
    /// Long name, e.g. `1002 - Statement - CONSOLIDATED BALANCE SHEETS`.
    pub long_name: String,
    /// Rendered HTML page, e.g. `R4.htm`.
    pub html_file_name: Option<String>,
    /// Rendered XML page for filings that predate HTML rendering.
    pub xml_file_name: Option<String>,
}

impl ManifestReport {
    /// Returns true for reports that render a financial statement page.
    #[must_use]
    pub fn is_statement(&self) -> bool {
        self.long_name.contains("Statement") && self.html_file_name.is_some()
    }
}

#[derive(Clone, Copy)]
enum Field {
    ShortName,
    LongName,
    HtmlFileName,
    XmlFileName,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"ShortName" => Some(Self::ShortName),
            b"LongName" => Some(Self::LongName),
            b"HtmlFileName" => Some(Self::HtmlFileName),
            b"XmlFileName" => Some(Self::XmlFileName),
            _ => None,
        }
    }
}

/// Parses the `<Report>` entries of a `FilingSummary.xml` document.
pub fn parse_manifest(xml: &str) -> Result<Vec<ManifestReport>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut reports = Vec::new();
    let mut current: Option<ManifestReport> = None;
    let mut field: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"Report" => current = Some(ManifestReport::default()),
                tag => field = Field::from_tag(tag),
            },
            Ok(Event::Text(t)) => {
                if let (Some(report), Some(f)) = (current.as_mut(), field) {
                    let text = t
                        .unescape()
                        .map_err(|e| FilingError::Parse(format!("manifest text: {e}")))?
                        .trim()
                        .to_string();
                    match f {
                        Field::ShortName => report.short_name = text,
                        Field::LongName => report.long_name = text,
                        Field::HtmlFileName => report.html_file_name = Some(text),
                        Field::XmlFileName => report.xml_file_name = Some(text),
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"Report" {
                    reports.extend(current.take());
                }
                field = None;
            }
            Ok(_) => {}
            Err(e) => {
                return Err(FilingError::Parse(format!(
                    "manifest parse error at {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
        buf.clear();
    }

    Ok(reports)
}

/// Short names under which each statement is commonly filed, lowercase, in
/// order of preference.
#[must_use]
pub fn statement_short_names(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::IncomeStatement => &[
            "consolidated statements of operations",
            "consolidated statement of operations",
            "consolidated statements of income",
            "consolidated statement of income",
            "consolidated statements of earnings",
            "consolidated statement of earnings",
            "consolidated income statements",
            "consolidated income statement",
            "condensed consolidated statements of operations",
            "condensed consolidated statements of income",
            "statements of operations",
            "statements of income",
            "income statements",
            "consolidated statements of comprehensive income",
        ],
        StatementKind::BalanceSheet => &[
            "consolidated balance sheets",
            "consolidated balance sheet",
            "condensed consolidated balance sheets",
            "consolidated statements of financial position",
            "consolidated statement of financial position",
            "balance sheets",
            "balance sheet",
        ],
        StatementKind::CashFlowStatement => &[
            "consolidated statements of cash flows",
            "consolidated statement of cash flows",
            "condensed consolidated statements of cash flows",
            "consolidated cash flows statements",
            "consolidated cash flow statements",
            "consolidated cash flow statement",
            "statements of cash flows",
            "statement of cash flows",
        ],
    }
}

/// Finds the report rendering a statement.
///
/// Only statement reports are considered; they are matched on their
/// lowercase short name.
#[must_use]
pub fn find_statement(reports: &[ManifestReport], kind: StatementKind) -> Option<&ManifestReport> {
    let by_name: HashMap<String, &ManifestReport> = reports
        .iter()
        .filter(|r| r.is_statement())
        .map(|r| (r.short_name.to_lowercase(), r))
        .collect();

    statement_short_names(kind)
        .iter()
        .find_map(|name| by_name.get(*name).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<FilingSummary>
  <Version>3.23.2</Version>
  <MyReports>
    <Report instance="aapl-20230930.htm">
      <IsDefault>false</IsDefault>
      <HtmlFileName>R1.htm</HtmlFileName>
      <LongName>0000001 - Document - Cover Page</LongName>
      <ReportType>Sheet</ReportType>
      <Role>http://www.apple.com/role/CoverPage</Role>
      <ShortName>Cover Page</ShortName>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R2.htm</HtmlFileName>
      <LongName>0000002 - Statement - CONSOLIDATED STATEMENTS OF OPERATIONS</LongName>
      <ShortName>CONSOLIDATED STATEMENTS OF OPERATIONS</ShortName>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R4.htm</HtmlFileName>
      <LongName>0000004 - Statement - CONSOLIDATED BALANCE SHEETS</LongName>
      <ShortName>CONSOLIDATED BALANCE SHEETS</ShortName>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R5.htm</HtmlFileName>
      <LongName>0000005 - Statement - CONSOLIDATED BALANCE SHEETS (Parenthetical)</LongName>
      <ShortName>CONSOLIDATED BALANCE SHEETS (Parenthetical)</ShortName>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R7.htm</HtmlFileName>
      <LongName>0000007 - Statement - CONSOLIDATED STATEMENTS OF CASH FLOWS</LongName>
      <ShortName>CONSOLIDATED STATEMENTS OF CASH FLOWS</ShortName>
    </Report>
  </MyReports>
</FilingSummary>"#;

    #[test]
    fn test_parse_manifest() {
        let reports = parse_manifest(MANIFEST).unwrap();
        assert_eq!(reports.len(), 5);
        assert_eq!(reports[0].short_name, "Cover Page");
        assert!(!reports[0].is_statement());
        assert_eq!(reports[2].html_file_name.as_deref(), Some("R4.htm"));
        assert!(reports[2].is_statement());
    }

    #[test]
    fn test_find_statement() {
        let reports = parse_manifest(MANIFEST).unwrap();
        let income = find_statement(&reports, StatementKind::IncomeStatement).unwrap();
        assert_eq!(income.html_file_name.as_deref(), Some("R2.htm"));
        let balance = find_statement(&reports, StatementKind::BalanceSheet).unwrap();
        assert_eq!(balance.html_file_name.as_deref(), Some("R4.htm"));
        let cash = find_statement(&reports, StatementKind::CashFlowStatement).unwrap();
        assert_eq!(cash.html_file_name.as_deref(), Some("R7.htm"));
    }

    #[test]
    fn test_missing_statement() {
        let reports = parse_manifest(MANIFEST).unwrap();
        let without_cash: Vec<_> = reports
            .into_iter()
            .filter(|r| !r.short_name.contains("CASH"))
            .collect();
        assert!(find_statement(&without_cash, StatementKind::CashFlowStatement).is_none());
    }

    #[test]
    fn test_malformed_manifest() {
        assert!(parse_manifest("<FilingSummary><Report></FilingSummary>").is_err());
    }
}
