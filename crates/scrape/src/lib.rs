//! Browser-backed acquisition for the catalog pipeline.
//!
//! Two session types drive a shared headless browser: an authenticated
//! check-stock session and a public specification-site session. A third
//! client talks to the marketing-copy service over HTTP. Each is exposed
//! through a narrow async trait so the pipeline orchestrator can run
//! against fakes in tests.

pub mod browser;
pub mod copy;
pub mod detail;
pub mod error;
pub mod stock;

use async_trait::async_trait;

use stockbook_core::{MarketingCopy, Product, ProductDetail, StockRow};

pub use browser::BrowserHandle;
pub use copy::CopyClient;
pub use detail::DetailSession;
pub use error::{CopyError, SessionError};
pub use stock::StockSession;

/// Per-code variant lookup against the stock portal.
#[async_trait]
pub trait StockSource {
    /// Fetch the variant rows for one product code. An empty vec is a
    /// successful "no variants" answer, distinct from an error.
    async fn fetch_stock(&mut self, code: &str) -> Result<Vec<StockRow>, SessionError>;
}

/// Per-product specification lookup against the detail site.
#[async_trait]
pub trait DetailSource {
    /// Fetch specifications for one product. `Ok(None)` means the site has
    /// no listing for the code; errors are transient fetch failures.
    async fn fetch_detail(&mut self, product: &Product) -> Result<Option<ProductDetail>, SessionError>;
}

/// Marketing-copy generation.
#[async_trait]
pub trait CopySource {
    /// Generate copy for one product from its specifications and primary
    /// image. `Ok(None)` means the source is not configured; the caller
    /// substitutes deterministic fallback copy.
    async fn generate(
        &self,
        code: &str,
        detail: &ProductDetail,
        image_url: Option<&str>,
    ) -> Result<Option<MarketingCopy>, CopyError>;
}
