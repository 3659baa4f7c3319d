//! Domain types shared across the scrape and pipeline crates.
//!
//! Product codes are case- and whitespace-insensitive: every cache key and
//! cross-source lookup goes through [`normalize_code`] first, so two codes
//! that normalize identically are the same product.

use serde::{Deserialize, Serialize};

/// Normalize a product code for use as a cache or lookup key.
///
/// Trims surrounding whitespace and lowercases. Idempotent:
/// `normalize_code(normalize_code(c)) == normalize_code(c)`.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// One product from the input list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,

    /// Top-level category carried through to the export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_cat: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_cat: Option<String>,

    /// Optional image hint used when the detail site yields no images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into(), parent_cat: None, sub_cat: None, image_url: None }
    }
}

/// One variant row from the stock portal's results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    /// Variant SKU, e.g. "BP9601".
    pub item_code: String,
    /// Free-text description; the colour heuristic runs over this.
    pub description: String,
    pub quantity: u32,
    pub price: f64,
}

/// Per-product stock result: the code searched plus every matching row.
///
/// An empty `rows` means the search settled on "no record"; it is distinct
/// from "not yet fetched", which is the absence of the record entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStockResult {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub rows: Vec<StockRow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_cat: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_cat: Option<String>,
}

impl ProductStockResult {
    /// An empty result for a code whose search failed or found nothing.
    pub fn empty(product: &Product) -> Self {
        Self {
            code: product.code.clone(),
            image_url: product.image_url.clone(),
            rows: Vec::new(),
            parent_cat: product.parent_cat.clone(),
            sub_cat: product.sub_cat.clone(),
        }
    }
}

/// Normalized specification record scraped from the detail site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Product page URL the detail was extracted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Deduplicated, insertion-ordered set of printing methods.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub printing_methods: Vec<String>,

    /// Absolute image URLs, deduplicated, insertion order preserved.
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductDetail {
    /// A "found, no detail" record: code present, nothing extracted.
    pub fn empty(code: impl Into<String>) -> Self {
        Self { code: code.into(), ..Self::default() }
    }
}

/// The five marketing-copy fields. All required once present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingCopy {
    pub seo_title: String,
    pub product_title: String,
    pub short_description: String,
    pub long_description: String,
    pub meta_description: String,
}

impl MarketingCopy {
    /// True when every field carries non-blank text.
    pub fn is_complete(&self) -> bool {
        [
            &self.seo_title,
            &self.product_title,
            &self.short_description,
            &self.long_description,
            &self.meta_description,
        ]
        .iter()
        .all(|f| !f.trim().is_empty())
    }
}

/// One reconciled catalog entry. Recomputed fresh on every run; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_cat: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_cat: Option<String>,

    /// Primary image: first non-empty of detail image, stock-side hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Union of all images seen across both sources, primary first.
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ProductDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_copy: Option<MarketingCopy>,

    /// Ordered variant rows; empty for detail-only codes.
    #[serde(default)]
    pub variants: Vec<StockRow>,
}
