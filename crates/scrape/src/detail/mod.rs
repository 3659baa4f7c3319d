//! Public specification-site session.
//!
//! No login, but the site fronts itself with an anti-automation
//! interstitial that takes a few seconds to clear, so every navigation
//! waits it out before the page snapshot is trusted. Lookup is a two-step
//! walk per product: search the listing for the code, then open the
//! matched product page and extract its specification table and images.

pub mod parse;

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use tokio::time::Instant;
use url::Url;

use stockbook_core::{DetailConfig, Product, ProductDetail};

use crate::DetailSource;
use crate::browser::BrowserHandle;
use crate::error::SessionError;
use parse::{
    challenge_active, extract_display_name, extract_images, extract_specs, parse_listing,
    select_match, split_printing_methods,
};

const PAGE_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound on waiting for the anti-automation interstitial to clear.
const CHALLENGE_TIMEOUT: Duration = Duration::from_secs(20);

/// Pause after page-ready before snapshotting, so late-arriving markup
/// (variant names, gallery anchors) is present.
const QUIET_DELAY: Duration = Duration::from_millis(250);

const POLL_INTERVAL: Duration = Duration::from_millis(500);

const LISTING_SELECTOR: &str = ".hikashop_products_listing, .hikashop_product";
const PRODUCT_PAGE_SELECTOR: &str = ".hikashop_product_page, [id^='hikashop_product_name_']";

/// One session against the specification site.
pub struct DetailSession {
    page: Page,
    base: Url,
}

impl DetailSession {
    /// Open a page for the session. No navigation happens until the first
    /// lookup.
    pub async fn start(handle: &BrowserHandle, config: DetailConfig) -> Result<Self, SessionError> {
        let base = Url::parse(&config.base_url).map_err(|e| SessionError::InvalidUrl(e.to_string()))?;

        let page = handle.browser().new_page("about:blank").await?;
        page.set_user_agent(config.user_agent.as_str()).await?;

        Ok(Self { page, base })
    }

    /// Look up one product's specifications.
    ///
    /// Returns `Ok(None)` when the listing has no result for the code. The
    /// listing thumbnail backfills the image list when the product page
    /// itself exposes no gallery.
    pub async fn lookup(&self, product: &Product) -> Result<Option<ProductDetail>, SessionError> {
        let listing_html = self.open(self.search_url(&product.code), LISTING_SELECTOR).await?;

        let results = parse_listing(&listing_html, &self.base);
        let Some(matched) = select_match(&results, &product.code).cloned() else {
            tracing::debug!(code = %product.code, "no listing result");
            return Ok(None);
        };

        let page_html = self.open(
            Url::parse(&matched.link).map_err(|e| SessionError::InvalidUrl(e.to_string()))?,
            PRODUCT_PAGE_SELECTOR,
        )
        .await?;

        let specs = extract_specs(&page_html);
        let mut images = extract_images(&page_html, &self.base);
        if images.is_empty()
            && let Some(thumb) = matched.image
        {
            images.push(thumb);
        }

        Ok(Some(ProductDetail {
            code: product.code.clone(),
            display_name: extract_display_name(&page_html),
            url: Some(matched.link),
            material: specs.material,
            dimension: specs.dimension,
            weight: specs.weight,
            finish: specs.finish,
            function: specs.function,
            printing_methods: specs.printing.as_deref().map(split_printing_methods).unwrap_or_default(),
            images,
        }))
    }

    /// Navigate, ride out the interstitial, wait for the expected markup,
    /// then snapshot. The markup wait is tolerated: a page that never shows
    /// the selector still gets snapshotted and parsed as-is.
    async fn open(&self, url: Url, ready_selector: &str) -> Result<String, SessionError> {
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;

        self.wait_for_challenge().await?;

        let deadline = Instant::now() + PAGE_READY_TIMEOUT;
        while self.page.find_element(ready_selector).await.is_err() {
            if Instant::now() >= deadline {
                tracing::debug!(selector = ready_selector, "page-ready wait elapsed, snapshotting anyway");
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        tokio::time::sleep(QUIET_DELAY).await;
        self.page.content().await.map_err(|e| SessionError::Navigation(e.to_string()))
    }

    /// Poll until the interstitial clears or the wait elapses. An elapsed
    /// wait is not an error; the subsequent parse simply finds nothing.
    async fn wait_for_challenge(&self) -> Result<(), SessionError> {
        let deadline = Instant::now() + CHALLENGE_TIMEOUT;
        loop {
            let html = self
                .page
                .content()
                .await
                .map_err(|e| SessionError::Navigation(e.to_string()))?;
            if !challenge_active(&html) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                tracing::warn!("anti-automation challenge did not clear in time");
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn search_url(&self, code: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path("/products-listing/product/listing");
        url.query_pairs_mut()
            .append_pair("limitstart", "0")
            .append_pair("filter_Search_8", code.trim());
        url
    }

    /// Close the session's page.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            tracing::debug!("detail page close error: {e}");
        }
    }
}

#[async_trait]
impl DetailSource for DetailSession {
    async fn fetch_detail(&mut self, product: &Product) -> Result<Option<ProductDetail>, SessionError> {
        self.lookup(product).await
    }
}
