//! Rendered statement table parser.
//!
//! Reads the HTML report pages EDGAR renders for each statement (`R2.htm`,
//! `R4.htm`, ...) into a [`StatementTable`].
//!
//! Layout handled:
//!
//! - Period headers are `th.th` cells carrying a nested `div` with the date.
//! - The first `th` of each `table` declares units for that table.
//! - Line items are rows with a `td.pl a` anchor whose `onclick` names the
//!   fact (`...'defref_us-gaap_Revenues', window );`).
//! - Values sit in `td.nump` (positive presentation), `td.num` (negative
//!   presentation) and `td.text` cells, one per period column.

use std::sync::LazyLock;

use filings_core::{FilingError, RawTableRow, Result, StatementDocument, StatementTable};
use scraper::{ElementRef, Html, Selector};

use crate::periods::parse_period_label;

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid table selector"));
static TH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("valid th selector"));
static PERIOD_HEADER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th.th").expect("valid period header selector"));
static DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("valid div selector"));
static TR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid tr selector"));
static ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.pl a").expect("valid line item selector"));
static VALUE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td.text, td.nump, td.num").expect("valid value cell selector")
});

const FACT_MARKER: &str = "defref_";
const RAW_UNITS_MARKER: &str = "unless otherwise specified";

/// How the values of one table block are scaled into thousands.
#[derive(Clone, Copy, Debug, PartialEq)]
struct UnitScale {
    multiplier: f64,
    raw_units: bool,
}

impl UnitScale {
    /// Reads a unit declaration such as `shares in Thousands, $ in Millions`.
    ///
    /// The currency declaration wins over a share-count declaration. The raw
    /// units marker divides every value by 1000 whatever the declared unit.
    fn from_header(text: &str) -> Self {
        let text = text.to_lowercase();
        let multiplier = if text.contains("$ in millions") {
            1000.0
        } else if text.contains("$ in thousands") || text.contains("in thousands") {
            1.0
        } else if text.contains("in millions") {
            1000.0
        } else {
            1.0
        };
        Self {
            multiplier,
            raw_units: text.contains(RAW_UNITS_MARKER),
        }
    }

    fn apply(&self, magnitude: f64, negative: bool) -> f64 {
        let scaled = if self.raw_units {
            magnitude / 1000.0
        } else {
            magnitude * self.multiplier
        };
        if negative { -scaled } else { scaled }
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            raw_units: false,
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Extracts the fact identifier from a line-item anchor's `onclick`.
fn fact_key(anchor: ElementRef<'_>) -> Result<String> {
    let onclick = anchor.value().attr("onclick").ok_or_else(|| {
        FilingError::MalformedDocument(format!(
            "line item '{}' has no onclick",
            element_text(anchor).trim()
        ))
    })?;
    let (_, tail) = onclick.rsplit_once(FACT_MARKER).ok_or_else(|| {
        FilingError::MalformedDocument(format!("onclick without fact reference: {onclick}"))
    })?;
    let key = tail.split('\'').next().unwrap_or_default().trim();
    if key.is_empty() {
        return Err(FilingError::MalformedDocument(format!(
            "empty fact reference: {onclick}"
        )));
    }
    Ok(key.to_string())
}

/// Drops footnote markers like `[1]` from cell text.
fn strip_footnotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Parses the magnitude of a value cell.
///
/// Currency symbols, separators and parentheses are dropped; only digits and
/// decimal points are kept. A cell with no digits is missing.
fn cell_magnitude(text: &str) -> Result<Option<f64>> {
    let cleaned: String = strip_footnotes(text)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| FilingError::MalformedDocument(format!("unparseable value '{}'", text.trim())))
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Reads the period columns of a document in presentation order.
fn period_columns(document: &Html) -> Result<Vec<chrono::NaiveDate>> {
    let mut columns = Vec::new();
    for header in document.select(&PERIOD_HEADER_SELECTOR) {
        let Some(div) = header.select(&DIV_SELECTOR).next() else {
            continue;
        };
        columns.push(parse_period_label(element_text(div).trim())?);
    }
    if columns.is_empty() {
        return Err(FilingError::MalformedDocument(
            "no period columns found".to_string(),
        ));
    }
    Ok(columns)
}

/// Parses one line-item row into values aligned with `width` columns.
fn row_values(row: ElementRef<'_>, width: usize, scale: UnitScale) -> Result<Vec<Option<f64>>> {
    let mut values = vec![None; width];
    for (index, cell) in row.select(&VALUE_SELECTOR).enumerate() {
        if index >= width {
            return Err(FilingError::MalformedDocument(format!(
                "row has more than {width} value cells"
            )));
        }
        if has_class(cell, "text") {
            continue;
        }
        let negative = !has_class(cell, "nump");
        values[index] = cell_magnitude(&element_text(cell))?.map(|m| scale.apply(m, negative));
    }
    Ok(values)
}

/// Parses rendered statement HTML into a table.
///
/// Columns keep document order; duplicate keys are all emitted. A page
/// without any line item fails as [`FilingError::MalformedDocument`].
pub fn parse_statement_html(html: &str) -> Result<StatementTable> {
    let document = Html::parse_document(html);
    let columns = period_columns(&document)?;
    let width = columns.len();
    let mut table = StatementTable::new(columns);

    for block in document.select(&TABLE_SELECTOR) {
        let scale = block
            .select(&TH_SELECTOR)
            .next()
            .map(|th| UnitScale::from_header(&element_text(th)))
            .unwrap_or_default();

        for row in block.select(&TR_SELECTOR) {
            let Some(anchor) = row.select(&ITEM_SELECTOR).next() else {
                continue;
            };
            let key = fact_key(anchor)?;
            let values = row_values(row, width, scale)?;
            table.push(RawTableRow::new(key, values))?;
        }
    }

    if table.is_empty() {
        return Err(FilingError::MalformedDocument(
            "no line items found".to_string(),
        ));
    }
    Ok(table)
}

/// Parses a fetched statement document into a table.
pub fn parse_statement(document: &StatementDocument) -> Result<StatementTable> {
    parse_statement_html(&document.html)
}
