//! Pure extraction over check-stock page snapshots.
//!
//! The session polls `Page::content()` and feeds the HTML through these
//! functions, so settle detection and row extraction are testable without
//! a browser.

use scraper::{ElementRef, Html, Selector};

use stockbook_core::StockRow;

/// Container holding either the results table or the no-record marker.
pub const RESULTS_CONTAINER_SELECTOR: &str = "#listDiv";

/// Exact text the portal renders when a search matches nothing.
pub const NO_RECORD_MARKER: &str = "----- No Record -----";

/// Class of data cells within a result row.
const CELL_SELECTOR: &str = "td.database_content";

/// Terminal states of an in-flight search, per poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SettleState {
    /// Explicit "no record" marker: fetched, no variants.
    NoRecord,
    /// At least one row whose leading cell starts with the search prefix.
    Rows(Vec<StockRow>),
    /// Neither terminal condition holds yet.
    Pending,
}

/// Classify a page snapshot against the uppercased, trimmed search prefix.
pub fn settle_state(html: &str, row_selector: &Selector, prefix: &str) -> SettleState {
    let document = Html::parse_document(html);
    let container_sel = Selector::parse(RESULTS_CONTAINER_SELECTOR).expect("invalid selector");

    let Some(container) = document.select(&container_sel).next() else {
        return SettleState::Pending;
    };

    if element_text(&container).contains(NO_RECORD_MARKER) {
        return SettleState::NoRecord;
    }

    let rows = extract_rows(&document, row_selector, prefix);
    if rows.is_empty() { SettleState::Pending } else { SettleState::Rows(rows) }
}

/// Extract every row whose first data cell starts with `prefix`.
pub fn extract_rows(document: &Html, row_selector: &Selector, prefix: &str) -> Vec<StockRow> {
    let cell_sel = Selector::parse(CELL_SELECTOR).expect("invalid selector");

    let mut rows = Vec::new();
    for row in document.select(row_selector) {
        let cells: Vec<String> = row.select(&cell_sel).map(|c| element_text(&c)).collect();

        let Some(item_code) = cells.first() else { continue };
        if !item_code.to_uppercase().starts_with(prefix) {
            continue;
        }

        rows.push(StockRow {
            item_code: item_code.clone(),
            description: cells.get(1).cloned().unwrap_or_default(),
            quantity: parse_quantity(cells.get(2).map_or("", String::as_str)),
            price: parse_price(cells.get(3).map_or("", String::as_str)),
        });
    }

    rows
}

/// First 200 characters of the results container's text, for timeout
/// diagnostics.
pub fn container_snippet(html: &str) -> String {
    let document = Html::parse_document(html);
    let container_sel = Selector::parse(RESULTS_CONTAINER_SELECTOR).expect("invalid selector");

    document
        .select(&container_sel)
        .next()
        .map(|c| element_text(&c).chars().take(200).collect())
        .unwrap_or_default()
}

/// Parse a quantity with thousands separators stripped; 0 on any failure.
pub fn parse_quantity(text: &str) -> u32 {
    text.replace(',', "").trim().parse().unwrap_or(0)
}

/// Parse a price by dropping everything but digits and dots; 0 on failure.
pub fn parse_price(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    cleaned.parse().unwrap_or(0.0)
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}
