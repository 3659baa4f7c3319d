//! Downstream catalog sync.
//!
//! Pushes the cached stock picture into a product store: one free-text
//! stock-description per product (a colour/quantity bullet list) and a
//! quantity update per variant SKU. The store itself sits behind
//! [`CatalogStore`]; nothing in the walk is fatal, a failed or missing
//! update is logged and skipped so one bad SKU cannot stall the rest.

use async_trait::async_trait;
use thiserror::Error;

use stockbook_core::StockRow;
use stockbook_core::cache::CacheData;
use stockbook_core::colour::extract_colour;

#[derive(Debug, Error)]
#[error("catalog store error: {0}")]
pub struct StoreError(pub String);

/// The downstream product store.
#[async_trait]
pub trait CatalogStore {
    /// Replace the product's stock-description text, keyed by product
    /// code.
    async fn update_stock_description(&mut self, code: &str, description: &str) -> Result<(), StoreError>;

    /// Set one variant's stock quantity, keyed by variant SKU. Returns
    /// `false` when the store has no such SKU.
    async fn update_variant_quantity(&mut self, sku: &str, quantity: u32) -> Result<bool, StoreError>;
}

/// Counters for the sync walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub descriptions_updated: usize,
    pub variants_updated: usize,
    pub variants_missing: usize,
    pub failures: usize,
}

/// Build the stock-description bullet list for one product's rows.
///
/// One `- Colour: quantity` line per row whose description yields a
/// colour; rows with no extractable colour are dropped. Quantities carry
/// thousands separators.
pub fn stock_description(rows: &[StockRow]) -> String {
    rows.iter()
        .filter_map(|row| {
            let colour = extract_colour(&row.description);
            if colour.is_empty() {
                None
            } else {
                Some(format!("- {colour}: {}", format_thousands(row.quantity)))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Walk every cached product with a stock sub-record and push both
/// updates into the store.
pub async fn sync_snapshot<S>(cache: &CacheData, store: &mut S) -> SyncSummary
where
    S: CatalogStore + Send,
{
    let mut summary = SyncSummary::default();

    for record in cache.products.values() {
        let Some(rows) = &record.stock_rows else { continue };

        let description = stock_description(rows);
        match store.update_stock_description(&record.code, &description).await {
            Ok(()) => {
                tracing::info!(code = %record.code, "stock description updated");
                summary.descriptions_updated += 1;
            }
            Err(e) => {
                tracing::warn!(code = %record.code, error = %e, "stock description update failed");
                summary.failures += 1;
            }
        }

        for row in rows {
            match store.update_variant_quantity(&row.item_code, row.quantity).await {
                Ok(true) => summary.variants_updated += 1,
                Ok(false) => {
                    tracing::warn!(sku = %row.item_code, "variant not found in store");
                    summary.variants_missing += 1;
                }
                Err(e) => {
                    tracing::warn!(sku = %row.item_code, error = %e, "variant update failed");
                    summary.failures += 1;
                }
            }
        }
    }

    summary
}

fn format_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
