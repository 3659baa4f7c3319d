//! JSON-file cache keyed by normalized product code.
//!
//! The cache is what makes the pipeline resumable: each product accumulates
//! up to three independently fetched sub-records (stock rows, detail,
//! marketing copy), and the presence of a sub-record is the sole signal
//! that its source is done. The whole document is rewritten on every save,
//! so a crash mid-run loses at most the in-flight item.
//!
//! Persistence failures never propagate: a missing or corrupt file loads as
//! an empty cache, and a failed save degrades to "this run's additions are
//! lost" behind a logged warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{MarketingCopy, ProductDetail, StockRow, normalize_code};

/// One cached product. Sub-records are created the first time their source
/// succeeds (even with an empty result) and never deleted automatically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedRecord {
    /// The code as originally supplied, before normalization.
    pub code: String,

    /// `None` = not yet fetched; `Some(vec![])` = fetched, no variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_rows: Option<Vec<StockRow>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ProductDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_copy: Option<MarketingCopy>,
}

/// The persisted document. BTreeMap keeps serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    #[serde(default)]
    pub products: BTreeMap<String, CachedRecord>,
}

/// File-backed cache store. Loaded once at startup; `save` rewrites the
/// file wholesale. Process-local, single writer.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    data: CacheData,
}

impl CacheStore {
    /// Load the cache from `path`. Never fails: a missing file starts an
    /// empty cache, and a parse failure is logged and discarded.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CacheData>(&content) {
                Ok(data) => {
                    tracing::info!(products = data.products.len(), path = %path.display(), "loaded cache");
                    data
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cache file unreadable, starting fresh");
                    CacheData::default()
                }
            },
            Err(_) => CacheData::default(),
        };

        Self { path, data }
    }

    /// An in-memory store backed by `path` but starting empty. For tests
    /// and dry runs.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), data: CacheData::default() }
    }

    pub fn get(&self, code: &str) -> Option<&CachedRecord> {
        self.data.products.get(&normalize_code(code))
    }

    /// Presence of the stock sub-record. An empty row list still counts as
    /// fetched; only absence triggers a re-fetch.
    pub fn has_stock(&self, code: &str) -> bool {
        self.get(code).is_some_and(|r| r.stock_rows.is_some())
    }

    pub fn has_detail(&self, code: &str) -> bool {
        self.get(code).is_some_and(|r| r.detail.is_some())
    }

    /// Marketing copy only counts when every field is non-blank, so a
    /// half-parsed response from an earlier run gets regenerated.
    pub fn has_copy(&self, code: &str) -> bool {
        self.get(code)
            .and_then(|r| r.marketing_copy.as_ref())
            .is_some_and(MarketingCopy::is_complete)
    }

    pub fn set_stock(&mut self, code: &str, rows: Vec<StockRow>) {
        self.entry(code).stock_rows = Some(rows);
    }

    pub fn set_detail(&mut self, code: &str, detail: ProductDetail) {
        self.entry(code).detail = Some(detail);
    }

    pub fn set_copy(&mut self, code: &str, copy: MarketingCopy) {
        self.entry(code).marketing_copy = Some(copy);
    }

    /// Rewrite the cache file. A failed write logs a warning and is
    /// otherwise swallowed so persistence trouble never aborts a run.
    pub fn save(&self) {
        let json = match serde_json::to_string_pretty(&self.data) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize cache");
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to save cache");
        }
    }

    pub fn snapshot(&self) -> &CacheData {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entry(&mut self, code: &str) -> &mut CachedRecord {
        self.data
            .products
            .entry(normalize_code(code))
            .or_insert_with(|| CachedRecord { code: code.to_string(), ..CachedRecord::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sku: &str, quantity: u32) -> StockRow {
        StockRow { item_code: sku.into(), description: "NAVY cotton Tote".into(), quantity, price: 9.9 }
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let mut store = CacheStore::empty("unused.json");
        store.set_stock("BP96", vec![row("BP9601", 5)]);

        for key in ["BP96", " bp96 ", "Bp96 "] {
            assert!(store.has_stock(key), "expected hit for {key:?}");
            assert_eq!(store.get(key).unwrap().code, "BP96");
        }
    }

    #[test]
    fn test_empty_rows_still_count_as_fetched() {
        let mut store = CacheStore::empty("unused.json");
        store.set_stock("bp96", Vec::new());
        assert!(store.has_stock("BP96"));
        assert!(!store.has_detail("BP96"));
    }

    #[test]
    fn test_set_merges_into_existing_record() {
        let mut store = CacheStore::empty("unused.json");
        store.set_stock("BP96", vec![row("BP9601", 5)]);
        store.set_detail("bp96", ProductDetail::empty("BP96"));

        let record = store.get("BP96").unwrap();
        assert!(record.stock_rows.is_some());
        assert!(record.detail.is_some());
        assert_eq!(store.snapshot().products.len(), 1);
    }

    #[test]
    fn test_incomplete_copy_does_not_count() {
        let mut store = CacheStore::empty("unused.json");
        store.set_copy(
            "bp96",
            MarketingCopy {
                seo_title: "t".into(),
                product_title: String::new(),
                short_description: "s".into(),
                long_description: "l".into(),
                meta_description: "m".into(),
            },
        );
        assert!(!store.has_copy("bp96"));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut store = CacheStore::empty(&path);
        store.set_stock("BP96", vec![row("BP9601", 5)]);
        store.set_detail(
            "BP96",
            ProductDetail { material: Some("600D Polyester".into()), ..ProductDetail::empty("BP96") },
        );
        store.save();

        let reloaded = CacheStore::load(&path);
        assert!(reloaded.has_stock("bp96"));
        assert_eq!(
            reloaded.get("bp96").unwrap().detail.as_ref().unwrap().material.as_deref(),
            Some("600D Polyester")
        );
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::load(dir.path().join("nope.json"));
        assert!(store.snapshot().products.is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = CacheStore::load(&path);
        assert!(store.snapshot().products.is_empty());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let mut store = CacheStore::empty("/definitely/not/a/dir/cache.json");
        store.set_stock("BP96", Vec::new());
        store.save();
    }
}
