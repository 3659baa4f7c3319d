//! Pipeline orchestration.
//!
//! Three strictly sequential passes over the product list: stock, detail,
//! then marketing copy over the reconciled entries. Each pass skips codes
//! whose sub-record is already cached and saves the cache after every
//! successful item, so an interrupted run resumes where it stopped. A
//! failed fetch is confined to its item: it is logged, left out of the
//! cache so the next run retries it, and the run moves on.

use std::time::Duration;

use stockbook_core::{CacheStore, CatalogEntry, Product, ProductDetail, ProductStockResult};
use stockbook_scrape::copy::fallback::fallback_copy;
use stockbook_scrape::{CopySource, DetailSource, StockSource};

use crate::reconcile::reconcile;

/// Inter-item pacing. Defaults match what the sites tolerate; tests pass
/// zeros.
#[derive(Debug, Clone)]
pub struct PipelineDelays {
    pub stock: Duration,
    pub detail: Duration,
}

impl Default for PipelineDelays {
    fn default() -> Self {
        Self { stock: Duration::from_secs(1), detail: Duration::from_millis(750) }
    }
}

impl PipelineDelays {
    /// No pacing; for tests.
    pub fn none() -> Self {
        Self { stock: Duration::ZERO, detail: Duration::ZERO }
    }
}

/// Per-pass counters for the end-of-run log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stock_fetched: usize,
    pub stock_cached: usize,
    pub stock_failed: usize,
    pub detail_fetched: usize,
    pub detail_cached: usize,
    pub detail_failed: usize,
    pub copy_generated: usize,
    pub copy_fallback: usize,
    pub copy_cached: usize,
}

pub struct RunOutput {
    pub entries: Vec<CatalogEntry>,
    pub summary: RunSummary,
}

/// Run the full pipeline over `products`.
///
/// Infallible by design: per-item errors are absorbed, and by the time
/// this is called the sessions have already started (the only fatal
/// phase). Every returned entry carries complete marketing copy.
pub async fn run_pipeline<S, D, C>(
    products: &[Product],
    cache: &mut CacheStore,
    stock: &mut S,
    detail: &mut D,
    copy: &C,
    delays: &PipelineDelays,
) -> RunOutput
where
    S: StockSource + Send,
    D: DetailSource + Send,
    C: CopySource + Sync,
{
    let mut summary = RunSummary::default();

    for product in products {
        if cache.has_stock(&product.code) {
            summary.stock_cached += 1;
            continue;
        }

        match stock.fetch_stock(&product.code).await {
            Ok(rows) => {
                tracing::info!(code = %product.code, rows = rows.len(), "stock fetched");
                cache.set_stock(&product.code, rows);
                cache.save();
                summary.stock_fetched += 1;
            }
            Err(e) => {
                tracing::warn!(code = %product.code, error = %e, "stock fetch failed, will retry next run");
                summary.stock_failed += 1;
            }
        }

        if !delays.stock.is_zero() {
            tokio::time::sleep(delays.stock).await;
        }
    }

    for product in products {
        if cache.has_detail(&product.code) {
            summary.detail_cached += 1;
            continue;
        }

        match detail.fetch_detail(product).await {
            Ok(found) => {
                // "No listing" is a successful answer and is cached as an
                // empty record so the next run does not look again.
                let record = found.unwrap_or_else(|| ProductDetail::empty(&product.code));
                tracing::info!(code = %product.code, found = record.url.is_some(), "detail fetched");
                cache.set_detail(&product.code, record);
                cache.save();
                summary.detail_fetched += 1;
            }
            Err(e) => {
                tracing::warn!(code = %product.code, error = %e, "detail fetch failed, will retry next run");
                summary.detail_failed += 1;
            }
        }

        if !delays.detail.is_zero() {
            tokio::time::sleep(delays.detail).await;
        }
    }

    let mut entries = reconcile(&assemble_stock(products, cache), &assemble_details(cache));

    for entry in &mut entries {
        if cache.has_copy(&entry.code) {
            entry.marketing_copy = cache.get(&entry.code).and_then(|r| r.marketing_copy.clone());
            summary.copy_cached += 1;
            continue;
        }

        let detail_record =
            entry.detail.clone().unwrap_or_else(|| ProductDetail::empty(&entry.code));

        // Only copy the service actually produced is cached. Fallback text
        // still completes the entry for this run, but stays out of the
        // cache so a later run with a configured service generates for
        // real.
        let generated = match copy.generate(&entry.code, &detail_record, entry.image_url.as_deref()).await
        {
            Ok(Some(generated)) => {
                summary.copy_generated += 1;
                cache.set_copy(&entry.code, generated.clone());
                cache.save();
                generated
            }
            Ok(None) => {
                summary.copy_fallback += 1;
                fallback_copy(&entry.code, &detail_record)
            }
            Err(e) => {
                tracing::warn!(code = %entry.code, error = %e, "copy generation failed, using fallback");
                summary.copy_fallback += 1;
                fallback_copy(&entry.code, &detail_record)
            }
        };

        entry.marketing_copy = Some(generated);
    }

    RunOutput { entries, summary }
}

/// One stock result per listed product, in list order, with rows pulled
/// from the cache. Codes whose fetch failed this run appear with empty
/// rows.
fn assemble_stock(products: &[Product], cache: &CacheStore) -> Vec<ProductStockResult> {
    products
        .iter()
        .map(|product| ProductStockResult {
            rows: cache
                .get(&product.code)
                .and_then(|record| record.stock_rows.clone())
                .unwrap_or_default(),
            ..ProductStockResult::empty(product)
        })
        .collect()
}

/// Every cached detail record, in the cache's stable key order.
fn assemble_details(cache: &CacheStore) -> Vec<ProductDetail> {
    cache.snapshot().products.values().filter_map(|record| record.detail.clone()).collect()
}
